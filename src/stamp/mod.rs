//! Visible stamp overlay for PDF documents
//! Author: kartik4091
//! Created: 2025-06-03
//!
//! The stamp image is drawn at the bottom-right corner of every page with
//! the signer's organization, director, tax id and validity period
//! overlaid on it. An optional information box goes to the top-right of
//! the first page.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

pub mod font;
pub mod geometry;
pub mod layout;
pub mod render;

pub use font::{FontSource, StampFont};
pub use geometry::{compute_info_box_geometry, compute_stamp_geometry, Rect, StampSizing};
pub use layout::{Rgb, StampLayout, TextPlacement};
pub use render::{StampImage, StampRenderer};

/// Zlib-compresses stream data for a `FlateDecode` filter.
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Stamp(format!("Failed to compress stream: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Stamp(format!("Failed to compress stream: {}", e)))
}
