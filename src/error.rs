//! Error types and handling for the document signing library
//! Author: kartik4091
//! Created: 2025-06-03 11:31:05 UTC

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Custom result type for signing operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for issuance, signing, stamping and packaging.
///
/// A cryptographic mismatch during verification is not represented here:
/// it is reported as a negative boolean result.
#[derive(Error, Debug)]
#[non_exhaustive]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Certificate build failed: {0}")]
    CertificateBuild(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Verification error: {0}")]
    Verification(String),

    #[error("Unsupported document type: {0}")]
    UnsupportedDocumentType(String),

    #[error("Packaging failed: {0}")]
    Packaging(String),

    #[error("Stamp error: {0}")]
    Stamp(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for the user-facing precondition violation raised when a
    /// PDF-only operation receives some other document.
    pub fn is_unsupported_document(&self) -> bool {
        matches!(self, Error::UnsupportedDocumentType(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_cause() {
        let err = Error::KeyGeneration("curve not found".into());
        assert_eq!(err.to_string(), "Key generation failed: curve not found");

        let err = Error::Packaging("disk full".into());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_unsupported_document_flag() {
        assert!(Error::UnsupportedDocumentType("x".into()).is_unsupported_document());
        assert!(!Error::Signing("x".into()).is_unsupported_document());
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
