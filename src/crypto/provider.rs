//! One-time cryptographic provider registration

use std::sync::Once;

use tracing::debug;

static REGISTER: Once = Once::new();

/// Initialises OpenSSL exactly once per process. Safe to call from every
/// entry point before any key or signature operation.
pub fn ensure_registered() {
    REGISTER.call_once(|| {
        openssl::init();
        debug!("OpenSSL provider registered: {}", openssl::version::version());
    });
}

pub fn is_registered() -> bool {
    REGISTER.is_completed()
}
