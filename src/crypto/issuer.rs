//! Self-signed certificate issuance
//! Author: kartik4091
//! Created: 2025-06-04
//!
//! Generates a key pair and a certificate whose subject and issuer are the
//! same [`Identity`]. The validity window starts `backdate` before the
//! issuance instant to tolerate clock skew and lasts `validity` after it.
//! Key material is handed back to the caller and never retained here.

use chrono::{DateTime, Duration, Utc};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::x509::{X509Builder, X509};
use tracing::{debug, instrument};

use crate::config::{CertificateConfig, CryptoConfig, DigestAlgorithm};
use crate::error::{Error, Result};
use crate::identity::Identity;

use super::keys::KeyMaterial;

const X509_VERSION_3: i32 = 2;

/// Result of one issuance: the caller owns both halves.
#[derive(Debug)]
pub struct IssuedIdentity {
    pub key: KeyMaterial,
    pub certificate: X509,
}

impl IssuedIdentity {
    pub fn certificate_der(&self) -> Result<Vec<u8>> {
        self.certificate
            .to_der()
            .map_err(|e| Error::CertificateBuild(format!("Failed to encode certificate: {}", e)))
    }
}

#[derive(Debug, Clone)]
pub struct CertificateIssuer {
    curve: String,
    digest: DigestAlgorithm,
    validity: Duration,
    backdate: Duration,
}

impl CertificateIssuer {
    pub fn new(crypto: &CryptoConfig, certificate: &CertificateConfig) -> Self {
        Self {
            curve: crypto.curve.clone(),
            digest: crypto.digest,
            validity: Duration::days(i64::from(certificate.validity_days)),
            backdate: Duration::seconds(certificate.backdate_secs as i64),
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedIdentity> {
        self.issue_at(identity, Utc::now())
    }

    /// Issues as if the clock read `now`. The serial is `now` in
    /// milliseconds, so it is only as monotonic as the clock.
    #[instrument(skip(self, identity), fields(subject = %identity))]
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedIdentity> {
        let key = KeyMaterial::generate(&self.curve)?;
        let name = identity.to_x509_name()?;

        let mut builder = X509Builder::new().map_err(build_err("create X509 builder"))?;
        builder.set_version(X509_VERSION_3).map_err(build_err("set version"))?;

        let serial = BigNum::from_dec_str(&now.timestamp_millis().to_string())
            .and_then(|bn| bn.to_asn1_integer())
            .map_err(build_err("create serial number"))?;
        builder.set_serial_number(&serial).map_err(build_err("set serial number"))?;

        builder.set_subject_name(&name).map_err(build_err("set subject"))?;
        builder.set_issuer_name(&name).map_err(build_err("set issuer"))?;

        let not_before = Asn1Time::from_unix((now - self.backdate).timestamp())
            .map_err(build_err("create not_before"))?;
        let not_after = Asn1Time::from_unix((now + self.validity).timestamp())
            .map_err(build_err("create not_after"))?;
        builder.set_not_before(&not_before).map_err(build_err("set not_before"))?;
        builder.set_not_after(&not_after).map_err(build_err("set not_after"))?;

        builder.set_pubkey(key.pkey()).map_err(build_err("set public key"))?;
        builder
            .sign(key.pkey(), self.digest.message_digest())
            .map_err(build_err("sign certificate"))?;

        let certificate = builder.build();
        debug!(curve = %self.curve, digest = self.digest.name(), "Issued self-signed certificate");
        Ok(IssuedIdentity { key, certificate })
    }
}

fn build_err(step: &'static str) -> impl Fn(openssl::error::ErrorStack) -> Error {
    move |e| Error::CertificateBuild(format!("Failed to {}: {}", step, e))
}
