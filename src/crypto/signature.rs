//! Detached signatures over raw byte payloads

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use openssl::asn1::Asn1Time;
use openssl::pkey::{HasPublic, PKeyRef};
use openssl::sign::{Signer, Verifier};
use openssl::x509::X509Ref;
use tracing::debug;

use crate::config::DigestAlgorithm;
use crate::error::{Error, Result};
use crate::utils::encoding;

use super::keys::KeyMaterial;

/// Signs and verifies payloads as-is: no canonicalization beyond the
/// digest the primitive applies internally.
#[derive(Debug, Clone, Copy)]
pub struct SignatureEngine {
    digest: DigestAlgorithm,
}

impl SignatureEngine {
    pub fn new(digest: DigestAlgorithm) -> Self {
        Self { digest }
    }

    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    pub fn sign(&self, key: &KeyMaterial, data: &[u8]) -> Result<Vec<u8>> {
        let mut signer = Signer::new(self.digest.message_digest(), key.pkey())
            .map_err(|e| Error::Signing(format!("Failed to initialise signer: {}", e)))?;
        signer
            .update(data)
            .map_err(|e| Error::Signing(format!("Failed to digest payload: {}", e)))?;
        let signature = signer
            .sign_to_vec()
            .map_err(|e| Error::Signing(format!("Signing primitive rejected the payload: {}", e)))?;
        debug!(payload_len = data.len(), signature_len = signature.len(), "Created detached signature");
        Ok(signature)
    }

    /// Signs and returns the Base64 wire form.
    pub fn sign_base64(&self, key: &KeyMaterial, data: &[u8]) -> Result<String> {
        Ok(encoding::encode(&self.sign(key, data)?))
    }

    /// `Ok(false)` on a cryptographic mismatch, including a signature that
    /// no longer parses after tampering. `Err` only when the key itself
    /// cannot be used.
    pub fn verify<T: HasPublic>(&self, public_key: &PKeyRef<T>, data: &[u8], signature: &[u8]) -> Result<bool> {
        let mut verifier = Verifier::new(self.digest.message_digest(), public_key)
            .map_err(|e| Error::Verification(format!("Failed to initialise verifier: {}", e)))?;
        let outcome = verifier.update(data).and_then(|_| verifier.verify(signature));
        match outcome {
            Ok(valid) => Ok(valid),
            Err(e) => {
                debug!("Signature rejected by primitive: {}", e);
                Ok(false)
            }
        }
    }

    pub fn verify_with_certificate(&self, certificate: &X509Ref, data: &[u8], signature: &[u8]) -> Result<bool> {
        let public_key = certificate
            .public_key()
            .map_err(|e| Error::Verification(format!("Certificate carries no usable public key: {}", e)))?;
        self.verify(&public_key, data, signature)
    }

    /// Decodes a Base64 signature before verifying against the certificate.
    pub fn verify_base64(&self, certificate: &X509Ref, data: &[u8], signature_base64: &str) -> Result<bool> {
        let signature = encoding::decode(signature_base64, "Signature", Error::Verification)?;
        self.verify_with_certificate(certificate, data, &signature)
    }
}

/// True iff the current time lies inside the certificate's validity window.
pub fn check_temporal_validity(certificate: &X509Ref) -> bool {
    check_temporal_validity_at(certificate, Utc::now())
}

/// Any failure while comparing is reported as "not valid".
pub fn check_temporal_validity_at(certificate: &X509Ref, at: DateTime<Utc>) -> bool {
    let Ok(moment) = Asn1Time::from_unix(at.timestamp()) else {
        return false;
    };
    let started = matches!(
        certificate.not_before().compare(&moment),
        Ok(Ordering::Less | Ordering::Equal)
    );
    let not_expired = matches!(
        certificate.not_after().compare(&moment),
        Ok(Ordering::Greater | Ordering::Equal)
    );
    started && not_expired
}
