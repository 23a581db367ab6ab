//! Algorithm dispatch: maps the server's algorithm name to a registered
//! capability before any test-case buffer is allocated.

use std::collections::HashMap;
use std::sync::Arc;

use acv_prelude::{AcvpError, Result};

use crate::cipher::TdesMode;
use crate::dut::CryptoModule;

/// A registered capability: a cipher mode plus the DUT handler for it.
#[derive(Clone)]
pub struct Capability {
    /// The cipher mode this capability covers.
    pub cipher: TdesMode,
    /// The crypto module that computes test cases for the mode.
    pub module: Arc<dyn CryptoModule>,
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

/// Registry of the algorithms this client advertises and can compute.
#[derive(Default)]
pub struct CapabilityRegistry {
    caps: HashMap<TdesMode, Arc<dyn CryptoModule>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DUT handler for a cipher mode, replacing any previous
    /// registration for the same mode.
    pub fn register(&mut self, cipher: TdesMode, module: Arc<dyn CryptoModule>) {
        self.caps.insert(cipher, module);
    }

    /// Resolve an algorithm name to its capability.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOp` when the name is unknown or no handler is
    /// registered for the mode.
    pub fn lookup(&self, algorithm: &str) -> Result<Capability> {
        let cipher = TdesMode::from_algorithm(algorithm).ok_or_else(|| {
            tracing::error!("unsupported algorithm ({algorithm})");
            AcvpError::UnsupportedOp(format!("unsupported algorithm: {algorithm}"))
        })?;
        let module = self.caps.get(&cipher).ok_or_else(|| {
            tracing::error!("server requesting unsupported capability ({algorithm})");
            AcvpError::UnsupportedOp(format!("no capability registered for {algorithm}"))
        })?;
        Ok(Capability { cipher, module: Arc::clone(module) })
    }
}
