//! In-memory zip packaging of signing outputs

use std::io::{Cursor, Read, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

pub const CERTIFICATE_ENTRY: &str = "certificate.cer";
pub const PRIVATE_KEY_ENTRY: &str = "private_key.der";
pub const DOCUMENT_ENTRY: &str = "document.bin";
pub const SIGNATURE_ENTRY: &str = "signature.txt";
pub const SIGNED_PDF_ENTRY: &str = "signed_document.pdf";
pub const STAMPED_PDF_ENTRY: &str = "document_with_stamp.pdf";
pub const SIGNATURE_ERROR_ENTRY: &str = "signature_error.txt";

/// Collects named entries and writes them, in insertion order, to a zip
/// archive held in memory. Either every entry is written or nothing is
/// returned.
#[derive(Debug, Default)]
pub struct ArchiveBuilder<'a> {
    entries: Vec<(&'a str, &'a [u8])>,
}

impl<'a> ArchiveBuilder<'a> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn entry(mut self, name: &'a str, data: &'a [u8]) -> Self {
        self.entries.push((name, data));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &self.entries {
            writer
                .start_file(*name, options)
                .map_err(|e| Error::Packaging(format!("Failed to start entry {}: {}", name, e)))?;
            writer
                .write_all(data)
                .map_err(|e| Error::Packaging(format!("Failed to write entry {}: {}", name, e)))?;
        }
        let archive = writer
            .finish()
            .map_err(|e| Error::Packaging(format!("Failed to finalize archive: {}", e)))?
            .into_inner();

        debug!(entries = self.entries.len(), size = archive.len(), "Archive built");
        Ok(archive)
    }
}

/// Reads every entry back as `(name, bytes)` in archive order.
pub fn read_entries(archive: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| Error::Packaging(format!("Failed to open archive: {}", e)))?;
    let mut entries = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut file = zip
            .by_index(index)
            .map_err(|e| Error::Packaging(format!("Failed to read entry {}: {}", index, e)))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        entries.push((file.name().to_owned(), data));
    }
    Ok(entries)
}

/// Looks up one entry by name.
pub fn find_entry(archive: &[u8], name: &str) -> Result<Option<Vec<u8>>> {
    Ok(read_entries(archive)?
        .into_iter()
        .find(|(entry, _)| entry == name)
        .map(|(_, data)| data))
}
