// keyring-core/src/logging.rs
//
// Tracing setup and the security audit helper. Nothing logged here or
// anywhere else in the crate may carry secret material.

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "keyring_core=info";

/// Install a global fmt subscriber honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Record a security-relevant event (unlock, lock, key ring creation, ...)
///
/// # Parameters
/// * `event_type` - e.g. "VAULT_UNLOCK", "KEYRING_CREATE"
/// * `details` - free text, never secrets
/// * `success` - failures are logged at warn level
pub fn log_security_event(event_type: &str, details: &str, success: bool) {
    if success {
        info!(target: "keyring_core::security", event = event_type, details, "security event");
    } else {
        warn!(target: "keyring_core::security", event = event_type, details, "security event failed");
    }
}
