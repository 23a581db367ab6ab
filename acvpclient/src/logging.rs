//! Tracing initialization.
//!
//! Log levels follow `RUST_LOG`; the default is `info`. Key material and
//! tokens never appear in log output at any level.

use acv_prelude::{AcvpError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber. Call once per process.
///
/// # Errors
///
/// Returns `InvalidArg` when a subscriber is already installed.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| AcvpError::InvalidArg(format!("tracing init failed: {e}")))
}
