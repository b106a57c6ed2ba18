//! Main Library File for Document Signing
//! Issues self-signed identities, creates and verifies detached
//! signatures, overlays visual stamps on PDF documents and packages the
//! results as zip archives.

// Configuration and errors
pub mod config;
pub mod error;

// Identity and cryptography
pub mod crypto;
pub mod identity;

// Documents and the stamp overlay
pub mod document;
pub mod stamp;
pub mod testpdf;

// Outputs
pub mod archive;
pub mod report;

// Orchestration
pub mod pipeline;
pub mod session;

// Utilities
pub mod utils;

pub use config::SignerConfig;
pub use document::DocumentKind;
pub use error::{Error, Result};
pub use identity::{Identity, IdentityBuilder, SignRequest, StampData};
pub use pipeline::{DocumentSignRequest, IssuedSignature, SignedPackage, SigningPipeline, VerificationRequest};
pub use report::VerificationResult;
pub use session::{KeyCache, SessionId};
pub use utils::Logger;
