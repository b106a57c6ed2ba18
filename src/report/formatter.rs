//! Report formatter implementation
//! Author: kartik4091
//! Created: 2025-06-05

use crate::error::{Error, Result};

use super::VerificationReport;

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    PlainText,
    Json,
}

/// Formats verification reports for people or machines
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn format(report: &VerificationReport, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::PlainText => Ok(Self::to_text(report)),
            ReportFormat::Json => Self::to_json(report),
        }
    }

    /// One line per verdict, followed by indented certificate details.
    pub fn to_text(report: &VerificationReport) -> String {
        let mut output = String::new();
        for entry in &report.entries {
            output.push_str(&format!("{} {}\n", entry.severity.tag(), entry.message));
        }

        if let Some(certificate) = &report.certificate {
            output.push_str(&format!("   Subject: {}\n", certificate.subject));
            output.push_str(&format!("   Issuer: {}\n", certificate.issuer));
            output.push_str(&format!("   Valid from: {}\n", certificate.not_before));
            output.push_str(&format!("   Valid until: {}\n", certificate.not_after));
            output.push_str(&format!("   Serial: {}\n", certificate.serial));
            output.push_str(&format!("   SHA-256: {}\n", certificate.fingerprint_sha256));
        }

        output
    }

    pub fn to_json(report: &VerificationReport) -> Result<String> {
        serde_json::to_string_pretty(report).map_err(|e| Error::Encoding(format!("Failed to serialize report: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CertificateMetadata;

    fn metadata() -> CertificateMetadata {
        CertificateMetadata {
            subject: "SN=Ivanov, L=Moscow, ST=Moscow, C=RU".into(),
            issuer: "SN=Ivanov, L=Moscow, ST=Moscow, C=RU".into(),
            not_before: "Jun  3 10:00:00 2025 GMT".into(),
            not_after: "Jun  3 11:00:00 2026 GMT".into(),
            serial: "1748944800000".into(),
            fingerprint_sha256: "ab".repeat(32),
        }
    }

    #[test]
    fn test_text_layout() {
        let report = VerificationReport::new(true, true, Some(metadata()));
        let text = ReportFormatter::to_text(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[OK] Signature VALID");
        assert_eq!(lines[1], "[OK] Certificate VALID");
        assert_eq!(lines[2], "[INFO] Certificate information:");
        assert_eq!(lines[3], "   Subject: SN=Ivanov, L=Moscow, ST=Moscow, C=RU");
        assert!(lines[6].starts_with("   Valid until: "));
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_text_without_certificate() {
        let report = VerificationReport::new(false, false, None);
        assert_eq!(
            ReportFormatter::format(&report, ReportFormat::PlainText).unwrap(),
            "[ERROR] Signature INVALID\n[ERROR] Certificate INVALID\n"
        );
    }

    #[test]
    fn test_json_includes_metadata() {
        let report = VerificationReport::new(true, false, Some(metadata()));
        let json = ReportFormatter::format(&report, ReportFormat::Json).unwrap();
        assert!(json.contains("\"fingerprintSha256\""));
        assert!(json.contains("\"certificateValid\": false"));
    }
}
