//! Utility Module Implementation
//! Author: kartik4091
//! Created: 2025-06-03 09:14:13 UTC
//!
//! Logging setup and Base64 helpers.

pub mod encoding;
pub mod logger;

pub use logger::Logger;
