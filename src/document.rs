//! Document type sniffing
//! Author: kartik4091
//! Created: 2025-06-03

use serde::{Deserialize, Serialize};

/// `%PDF`
pub const PDF_MAGIC: [u8; 4] = [0x25, 0x50, 0x44, 0x46];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Pdf,
    Other,
}

impl DocumentKind {
    /// PDF iff the first four bytes are the `%PDF` magic. No structure is parsed.
    pub fn classify(bytes: &[u8]) -> Self {
        match bytes.get(..PDF_MAGIC.len()) {
            Some(head) if head == PDF_MAGIC => DocumentKind::Pdf,
            _ => DocumentKind::Other,
        }
    }

    pub fn is_pdf(self) -> bool {
        self == DocumentKind::Pdf
    }
}
