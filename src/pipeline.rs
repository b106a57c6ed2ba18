//! Signing Pipeline: issuance, signing, stamping and verification
//! Author: kartik4091
//! Created: 2025-06-05
//!
//! Every operation runs synchronously to completion or fails with a single
//! error. The one deliberate partial outcome is [`SignedPackage::Degraded`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::archive::{
    ArchiveBuilder, CERTIFICATE_ENTRY, DOCUMENT_ENTRY, PRIVATE_KEY_ENTRY, SIGNATURE_ENTRY, SIGNATURE_ERROR_ENTRY,
    SIGNED_PDF_ENTRY, STAMPED_PDF_ENTRY,
};
use crate::config::SignerConfig;
use crate::crypto::certificate::{decode_base64 as decode_certificate, CertificateMetadata};
use crate::crypto::provider::ensure_registered;
use crate::crypto::signature::check_temporal_validity;
use crate::crypto::{CertificateIssuer, IssuedIdentity, KeyMaterial, SignatureEngine};
use crate::document::DocumentKind;
use crate::error::{Error, Result};
use crate::identity::{IdentityBuilder, SignRequest, StampData};
use crate::report::{VerificationReport, VerificationResult};
use crate::session::{KeyCache, SessionId};
use crate::stamp::StampRenderer;
use crate::testpdf;
use crate::utils::encoding::{base64_bytes, encode};

/// Request to sign and/or stamp a document with previously issued material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentSignRequest {
    pub private_key_base64: Option<String>,
    /// Accepted for compatibility; signing needs only the private key
    pub certificate_base64: Option<String>,
    #[serde(with = "base64_bytes")]
    pub document_bytes: Vec<u8>,
    #[serde(flatten)]
    pub stamp: StampData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationRequest {
    pub certificate_base64: String,
    pub signature_base64: String,
    #[serde(with = "base64_bytes")]
    pub document_bytes: Vec<u8>,
}

/// Freshly issued identity together with its archive
/// (`certificate.cer` then `private_key.der`).
#[derive(Debug)]
pub struct IssuedSignature {
    pub archive: Vec<u8>,
    pub identity: IssuedIdentity,
    pub subject: String,
}

/// Outcome of signing with a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedPackage {
    /// Document and detached signature
    Complete { archive: Vec<u8> },
    /// Stamped PDF plus a note on why the signature could not be created
    Degraded { archive: Vec<u8>, reason: String },
}

impl SignedPackage {
    pub fn archive(&self) -> &[u8] {
        match self {
            SignedPackage::Complete { archive } | SignedPackage::Degraded { archive, .. } => archive,
        }
    }

    pub fn into_archive(self) -> Vec<u8> {
        match self {
            SignedPackage::Complete { archive } | SignedPackage::Degraded { archive, .. } => archive,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SignedPackage::Degraded { .. })
    }
}

/// Orchestrates the signing operations. Stamp resources are loaded once
/// at construction.
#[derive(Debug)]
pub struct SigningPipeline {
    config: SignerConfig,
    issuer: CertificateIssuer,
    engine: SignatureEngine,
    renderer: StampRenderer,
}

impl SigningPipeline {
    pub fn new(config: SignerConfig) -> Result<Self> {
        config.validate()?;
        ensure_registered();

        let issuer = CertificateIssuer::new(&config.crypto, &config.certificate);
        let engine = SignatureEngine::new(config.crypto.digest);
        let algorithm = format!("{} / {}", config.crypto.curve, config.crypto.digest.name());
        let renderer = StampRenderer::new(&config.stamp, algorithm)?;

        info!(curve = %config.crypto.curve, digest = config.crypto.digest.name(), "🔧 Signing pipeline ready");
        Ok(Self { config, issuer, engine, renderer })
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Issues a self-signed identity and packages its certificate and key.
    /// The key is handed to the caller and not retained.
    #[instrument(skip_all)]
    pub fn create_signature(&self, request: &SignRequest) -> Result<IssuedSignature> {
        let identity = IdentityBuilder::from_request(request);
        let subject = identity.to_string();
        let issued = self.issuer.issue(&identity)?;

        let certificate = issued.certificate_der()?;
        let private_key = issued.key.private_key_pkcs8_der()?;
        let archive = ArchiveBuilder::new()
            .entry(CERTIFICATE_ENTRY, &certificate)
            .entry(PRIVATE_KEY_ENTRY, &private_key)
            .build()?;

        info!(%subject, archive_len = archive.len(), "📜 Issued self-signed certificate");
        Ok(IssuedSignature { archive, identity: issued, subject })
    }

    /// Like [`create_signature`](Self::create_signature), and also keeps a
    /// copy of the key in `cache` under `session`.
    pub fn create_signature_in_session(
        &self,
        cache: &KeyCache,
        session: SessionId,
        request: &SignRequest,
    ) -> Result<IssuedSignature> {
        let issued = self.create_signature(request)?;
        cache.insert(session, issued.identity.key.clone());
        debug!(%session, "Cached issued key");
        Ok(issued)
    }

    /// PDF input: returns the stamped PDF. Anything else: returns the
    /// Base64 detached signature as text bytes.
    #[instrument(skip_all, fields(document_len = request.document_bytes.len()))]
    pub fn sign_document(&self, request: &DocumentSignRequest) -> Result<Vec<u8>> {
        match DocumentKind::classify(&request.document_bytes) {
            DocumentKind::Pdf => self.renderer.apply(&request.document_bytes, &request.stamp),
            DocumentKind::Other => Ok(self.detached_signature(request, &request.document_bytes)?.into_bytes()),
        }
    }

    /// PDF input is stamped first and the stamped bytes are signed. When
    /// signing fails after stamping, the stamped document is still
    /// returned together with the failure reason.
    #[instrument(skip_all, fields(document_len = request.document_bytes.len()))]
    pub fn sign_document_with_signature(&self, request: &DocumentSignRequest) -> Result<SignedPackage> {
        if !DocumentKind::classify(&request.document_bytes).is_pdf() {
            let signature = self.detached_signature(request, &request.document_bytes)?;
            let archive = ArchiveBuilder::new()
                .entry(DOCUMENT_ENTRY, &request.document_bytes)
                .entry(SIGNATURE_ENTRY, signature.as_bytes())
                .build()?;
            return Ok(SignedPackage::Complete { archive });
        }

        let stamped = self.renderer.apply(&request.document_bytes, &request.stamp)?;
        match self.detached_signature(request, &stamped) {
            Ok(signature) => {
                let archive = ArchiveBuilder::new()
                    .entry(SIGNED_PDF_ENTRY, &stamped)
                    .entry(SIGNATURE_ENTRY, signature.as_bytes())
                    .build()?;
                info!("✅ Stamped and signed PDF");
                Ok(SignedPackage::Complete { archive })
            }
            Err(err) => {
                warn!("Signature creation failed, packaging stamped document only: {}", err);
                let reason = err.to_string();
                let note = format!("Signature creation error: {}", reason);
                let archive = ArchiveBuilder::new()
                    .entry(STAMPED_PDF_ENTRY, &stamped)
                    .entry(SIGNATURE_ERROR_ENTRY, note.as_bytes())
                    .build()?;
                Ok(SignedPackage::Degraded { archive, reason })
            }
        }
    }

    /// Stamps a PDF without signing it.
    #[instrument(skip_all, fields(document_len = request.document_bytes.len()))]
    pub fn add_stamp(&self, request: &DocumentSignRequest) -> Result<Vec<u8>> {
        if !DocumentKind::classify(&request.document_bytes).is_pdf() {
            return Err(Error::UnsupportedDocumentType(
                "Stamps can only be added to PDF documents".into(),
            ));
        }
        self.renderer.apply(&request.document_bytes, &request.stamp)
    }

    /// Checks the detached signature and, independently, the certificate's
    /// validity window. Both verdicts are always reported.
    #[instrument(skip_all, fields(document_len = request.document_bytes.len()))]
    pub fn verify(&self, request: &VerificationRequest) -> Result<VerificationResult> {
        let certificate = decode_certificate(&request.certificate_base64)?;
        let signature_valid = self
            .engine
            .verify_base64(&certificate, &request.document_bytes, &request.signature_base64)?;
        let certificate_valid = check_temporal_validity(&certificate);
        let metadata = CertificateMetadata::from_certificate(&certificate);

        info!(signature_valid, certificate_valid, "🔍 Verification finished");
        Ok(VerificationReport::new(signature_valid, certificate_valid, Some(metadata)).into_result())
    }

    pub fn generate_test_pdf(&self) -> Result<Vec<u8>> {
        testpdf::generate_test_pdf()
    }

    fn detached_signature(&self, request: &DocumentSignRequest, payload: &[u8]) -> Result<String> {
        let encoded = request
            .private_key_base64
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Signing("Private key is required".into()))?;
        let key = KeyMaterial::from_base64(encoded)?;
        let signature = self.engine.sign(&key, payload)?;
        Ok(encode(&signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::read_entries;

    fn pipeline() -> SigningPipeline {
        SigningPipeline::new(SignerConfig::default()).unwrap()
    }

    fn issued_key(pipeline: &SigningPipeline) -> (String, String) {
        let issued = pipeline.create_signature(&SignRequest::default()).unwrap();
        (
            issued.identity.key.private_key_base64().unwrap(),
            encode(&issued.identity.certificate_der().unwrap()),
        )
    }

    #[test]
    fn test_create_signature_archive_layout() {
        let pipeline = pipeline();
        let request = SignRequest {
            surname: Some("Ivanov".into()),
            city: Some("Moscow".into()),
            ..Default::default()
        };
        let issued = pipeline.create_signature(&request).unwrap();
        let entries = read_entries(&issued.archive).unwrap();
        assert_eq!(entries[0].0, CERTIFICATE_ENTRY);
        assert_eq!(entries[1].0, PRIVATE_KEY_ENTRY);
        assert_eq!(entries[0].1, issued.identity.certificate_der().unwrap());
        assert_eq!(issued.subject, "SN=Ivanov, L=Moscow, ST=Moscow, C=RU");
    }

    #[test]
    fn test_session_cache_receives_key() {
        let pipeline = pipeline();
        let cache = KeyCache::new();
        let session = SessionId::new();
        let issued = pipeline
            .create_signature_in_session(&cache, session, &SignRequest::default())
            .unwrap();
        assert_eq!(
            cache.private_key_base64(session).unwrap(),
            Some(issued.identity.key.private_key_base64().unwrap())
        );
    }

    #[test]
    fn test_sign_document_generic_returns_base64_signature() {
        let pipeline = pipeline();
        let (key, certificate) = issued_key(&pipeline);
        let request = DocumentSignRequest {
            private_key_base64: Some(key),
            document_bytes: b"plain text".to_vec(),
            ..Default::default()
        };
        let signature = String::from_utf8(pipeline.sign_document(&request).unwrap()).unwrap();
        let result = pipeline
            .verify(&VerificationRequest {
                certificate_base64: certificate,
                signature_base64: signature,
                document_bytes: b"plain text".to_vec(),
            })
            .unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_sign_document_generic_without_key_fails() {
        let request = DocumentSignRequest { document_bytes: b"data".to_vec(), ..Default::default() };
        assert!(matches!(pipeline().sign_document(&request), Err(Error::Signing(_))));
    }

    #[test]
    fn test_sign_document_pdf_returns_stamped_pdf() {
        let pipeline = pipeline();
        let request = DocumentSignRequest {
            document_bytes: pipeline.generate_test_pdf().unwrap(),
            ..Default::default()
        };
        let output = pipeline.sign_document(&request).unwrap();
        assert!(DocumentKind::classify(&output).is_pdf());
        assert_ne!(output, request.document_bytes);
    }

    #[test]
    fn test_add_stamp_rejects_non_pdf() {
        let request = DocumentSignRequest { document_bytes: b"not a pdf".to_vec(), ..Default::default() };
        let err = pipeline().add_stamp(&request).unwrap_err();
        assert!(err.is_unsupported_document());
    }

    #[test]
    fn test_degraded_package_on_bad_key() {
        let pipeline = pipeline();
        let request = DocumentSignRequest {
            private_key_base64: Some(encode(b"garbage")),
            document_bytes: pipeline.generate_test_pdf().unwrap(),
            ..Default::default()
        };
        let package = pipeline.sign_document_with_signature(&request).unwrap();
        assert!(package.is_degraded());
        let entries = read_entries(package.archive()).unwrap();
        assert_eq!(entries[0].0, STAMPED_PDF_ENTRY);
        assert_eq!(entries[1].0, SIGNATURE_ERROR_ENTRY);
        assert!(String::from_utf8_lossy(&entries[1].1).starts_with("Signature creation error: "));
    }

    #[test]
    fn test_request_json_shapes() {
        let json = r#"{
            "privateKeyBase64": "AAAA",
            "documentBytes": "JVBERi0xLjQ=",
            "stampOrganizationName": "OOO Romashka",
            "stampInn": "7700000000"
        }"#;
        let request: DocumentSignRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.document_bytes, b"%PDF-1.4");
        assert_eq!(request.stamp.organization_name.as_deref(), Some("OOO Romashka"));
        assert_eq!(request.stamp.inn.as_deref(), Some("7700000000"));
        assert!(request.certificate_base64.is_none());
    }
}
