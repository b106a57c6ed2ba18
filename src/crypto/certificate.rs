//! Certificate decoding and descriptive metadata

use openssl::x509::{X509NameRef, X509Ref, X509};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::utils::encoding;

use super::provider::ensure_registered;

/// Descriptive fields shown in verification reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMetadata {
    pub subject: String,
    pub issuer: String,
    pub not_before: String,
    pub not_after: String,
    pub serial: String,
    pub fingerprint_sha256: String,
}

impl CertificateMetadata {
    pub fn from_certificate(certificate: &X509Ref) -> Self {
        let serial = certificate
            .serial_number()
            .to_bn()
            .and_then(|bn| bn.to_dec_str().map(|s| s.to_string()))
            .unwrap_or_else(|_| "?".into());
        let fingerprint_sha256 = certificate
            .to_der()
            .map(|der| hex::encode(Sha256::digest(&der)))
            .unwrap_or_default();

        Self {
            subject: format_name(certificate.subject_name()),
            issuer: format_name(certificate.issuer_name()),
            not_before: certificate.not_before().to_string(),
            not_after: certificate.not_after().to_string(),
            serial,
            fingerprint_sha256,
        }
    }
}

/// Renders a name as `SN=value, ...` in stored order.
pub fn format_name(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let object = entry.object();
            let label = object
                .nid()
                .short_name()
                .map(str::to_owned)
                .unwrap_or_else(|_| object.to_string());
            let value = entry
                .data()
                .as_utf8()
                .map(|s| s.to_string())
                .unwrap_or_else(|_| "<unprintable>".into());
            format!("{}={}", label, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn decode_der(der: &[u8]) -> Result<X509> {
    ensure_registered();
    X509::from_der(der).map_err(|e| Error::Verification(format!("Failed to decode certificate: {}", e)))
}

pub fn decode_base64(text: &str) -> Result<X509> {
    let der = encoding::decode(text, "Certificate", Error::Verification)?;
    decode_der(&der)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignerConfig;
    use crate::crypto::issuer::CertificateIssuer;
    use crate::identity::{IdentityBuilder, SignRequest};

    fn issued_der() -> Vec<u8> {
        let config = SignerConfig::default();
        let request = SignRequest {
            surname: Some("Ivanov".into()),
            city: Some("Moscow".into()),
            inn: Some("7700000000".into()),
            ..Default::default()
        };
        CertificateIssuer::new(&config.crypto, &config.certificate)
            .issue(&IdentityBuilder::from_request(&request))
            .unwrap()
            .certificate_der()
            .unwrap()
    }

    #[test]
    fn test_metadata_subject_matches_issuer() {
        let certificate = decode_der(&issued_der()).unwrap();
        let metadata = CertificateMetadata::from_certificate(&certificate);
        assert_eq!(metadata.subject, metadata.issuer);
        assert!(metadata.subject.starts_with("SN=Ivanov, L=Moscow, ST=Moscow, C=RU"));
        assert!(metadata.subject.contains("7700000000"));
        assert_eq!(metadata.fingerprint_sha256.len(), 64);
    }

    #[test]
    fn test_base64_decoding() {
        let der = issued_der();
        let certificate = decode_base64(&encoding::encode(&der)).unwrap();
        assert_eq!(certificate.to_der().unwrap(), der);
    }

    #[test]
    fn test_undecodable_certificate_is_verification_error() {
        assert!(matches!(decode_der(b"not a certificate"), Err(Error::Verification(_))));
        assert!(matches!(decode_base64("***"), Err(Error::Verification(_))));
    }
}
