//! Cryptographic primitives for the signing pipeline
//! Author: kartik4091
//!
//! Key generation, self-signed certificate issuance and detached
//! signatures, all backed by OpenSSL.

pub mod certificate;
pub mod issuer;
pub mod keys;
pub mod provider;
pub mod signature;

pub use certificate::CertificateMetadata;
pub use issuer::{CertificateIssuer, IssuedIdentity};
pub use keys::KeyMaterial;
pub use signature::SignatureEngine;
