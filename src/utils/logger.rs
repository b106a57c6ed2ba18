//! Logger implementation for the signing pipeline
//! Author: kartik4091
//! Created: 2025-06-05

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the
/// configured level.
#[derive(Debug, Clone)]
pub struct Logger {
    level: String,
    initialized: bool,
}

impl Logger {
    pub fn new() -> Self {
        Self::with_level("info")
    }

    pub fn with_level(level: &str) -> Self {
        Self {
            level: level.to_string(),
            initialized: false,
        }
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    /// Safe to call more than once, and when another subscriber is
    /// already installed (as in tests).
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let installed = tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok();
        self.initialized = true;
        if installed {
            info!("Logger initialized with level: {}", self.level);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let mut logger = Logger::with_level("debug");
        logger.init();
        logger.init();
        assert!(logger.is_initialized());
        assert_eq!(logger.level(), "debug");
    }
}
