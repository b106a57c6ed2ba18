//! Verification reporting
//! Author: kartik4091
//! Created: 2025-06-05

use serde::{Deserialize, Serialize};

use crate::crypto::CertificateMetadata;

pub mod formatter;

pub use formatter::{ReportFormat, ReportFormatter};

/// Outcome of verifying a detached signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub signature_valid: bool,
    pub certificate_valid: bool,
    pub message: String,
}

impl VerificationResult {
    /// Both the signature and the certificate window check out.
    pub fn is_valid(&self) -> bool {
        self.signature_valid && self.certificate_valid
    }
}

/// Report line severity, rendered as a bracketed tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSeverity {
    Ok,
    Error,
    Info,
}

impl ReportSeverity {
    pub fn tag(self) -> &'static str {
        match self {
            ReportSeverity::Ok => "[OK]",
            ReportSeverity::Error => "[ERROR]",
            ReportSeverity::Info => "[INFO]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub severity: ReportSeverity,
    pub message: String,
}

/// Structured form of a verification report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub signature_valid: bool,
    pub certificate_valid: bool,
    pub entries: Vec<ReportEntry>,
    pub certificate: Option<CertificateMetadata>,
}

impl VerificationReport {
    pub fn new(signature_valid: bool, certificate_valid: bool, certificate: Option<CertificateMetadata>) -> Self {
        let verdict = |valid: bool, subject: &str| {
            if valid {
                ReportEntry { severity: ReportSeverity::Ok, message: format!("{} VALID", subject) }
            } else {
                ReportEntry { severity: ReportSeverity::Error, message: format!("{} INVALID", subject) }
            }
        };

        let mut entries = vec![verdict(signature_valid, "Signature"), verdict(certificate_valid, "Certificate")];
        if certificate.is_some() {
            entries.push(ReportEntry {
                severity: ReportSeverity::Info,
                message: "Certificate information:".into(),
            });
        }

        Self { signature_valid, certificate_valid, entries, certificate }
    }

    pub fn into_result(self) -> VerificationResult {
        let message = ReportFormatter::to_text(&self);
        VerificationResult {
            signature_valid: self.signature_valid,
            certificate_valid: self.certificate_valid,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_follow_verdicts() {
        let report = VerificationReport::new(true, false, None);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].severity, ReportSeverity::Ok);
        assert_eq!(report.entries[1].severity, ReportSeverity::Error);
        assert_eq!(report.entries[1].message, "Certificate INVALID");
    }

    #[test]
    fn test_result_validity() {
        let result = VerificationReport::new(true, true, None).into_result();
        assert!(result.is_valid());
        assert!(!VerificationReport::new(true, false, None).into_result().is_valid());
    }

    #[test]
    fn test_result_json_shape() {
        let result = VerificationReport::new(false, true, None).into_result();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["signatureValid"], false);
        assert_eq!(json["certificateValid"], true);
        assert!(json["message"].as_str().unwrap().starts_with("[ERROR] Signature INVALID"));
    }
}
