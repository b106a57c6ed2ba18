//! Configuration types and validation for the signing pipeline
//! Author: kartik4091
//! Created: 2025-06-03

use std::fs;
use std::path::{Path, PathBuf};

use openssl::hash::MessageDigest;
use serde::{Deserialize, Serialize};

use crate::crypto::keys::resolve_curve;
use crate::error::{Error, Result};
use crate::stamp::font::FontSource;
use crate::stamp::geometry::StampSizing;
use crate::stamp::layout::Rgb;

/// Canonical certificate lifetime. The 100-year variant is not offered.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// Skew tolerance between issuer and verifier clocks.
pub const DEFAULT_BACKDATE_SECS: u64 = 60 * 60;

/// Fixed subject country.
pub const SUBJECT_COUNTRY: &str = "RU";

/// Top-level configuration for the signing pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    pub crypto: CryptoConfig,
    pub certificate: CertificateConfig,
    pub stamp: StampConfig,
    pub logging: LoggingConfig,
}

/// Curve and digest used for keys, certificates and detached signatures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// OpenSSL short name of the named curve
    pub curve: String,
    pub digest: DigestAlgorithm,
}

/// Message digest paired with the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

/// Self-signed certificate validity window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    pub validity_days: u32,
    pub backdate_secs: u64,
}

/// Stamp overlay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    pub sizing: StampSizing,
    /// Replaces the bundled stamp image when set
    pub image_path: Option<PathBuf>,
    pub font: FontSource,
    /// Draw the signature information box on the first page
    pub info_box: bool,
    pub text_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl DigestAlgorithm {
    pub fn message_digest(self) -> MessageDigest {
        match self {
            DigestAlgorithm::Sha256 => MessageDigest::sha256(),
            DigestAlgorithm::Sha384 => MessageDigest::sha384(),
            DigestAlgorithm::Sha512 => MessageDigest::sha512(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }
}

// Defaults
impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            curve: "prime256v1".into(),
            digest: DigestAlgorithm::Sha256,
        }
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            validity_days: DEFAULT_VALIDITY_DAYS,
            backdate_secs: DEFAULT_BACKDATE_SECS,
        }
    }
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            sizing: StampSizing::PageWidthRatio,
            image_path: None,
            font: FontSource::default(),
            info_box: false,
            text_color: "#1b1564".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

impl SignerConfig {
    /// Loads a JSON or YAML configuration file and validates it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        Self::from_str_any(&content)
    }

    /// Parses JSON first, then YAML.
    pub fn from_str_any(content: &str) -> Result<Self> {
        let config: SignerConfig = serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| Error::Config(format!("Config parsing error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        resolve_curve(&self.crypto.curve)
            .map_err(|e| Error::Config(format!("Unknown curve '{}': {}", self.crypto.curve, e)))?;

        if self.certificate.validity_days == 0 {
            return Err(Error::Config("Certificate validity must be at least one day".into()));
        }
        if self.certificate.backdate_secs > 24 * 60 * 60 {
            return Err(Error::Config("Backdating is limited to 24 hours".into()));
        }

        Rgb::from_hex(&self.stamp.text_color)
            .ok_or_else(|| Error::Config(format!("Invalid text color: {}", self.stamp.text_color)))?;

        if let FontSource::Standard { name } = &self.stamp.font {
            if !crate::stamp::font::is_standard_font(name) {
                return Err(Error::Config(format!("Not a standard PDF font: {}", name)));
            }
        }
        Ok(())
    }
}
