//! Session configuration.

use std::time::Duration;

use acv_prelude::{AcvpError, Result};
use acv_transport::{ServerEndpoint, TlsSettings};

/// Default API prefix on NIST-compatible servers.
pub const DEFAULT_PATH_SEGMENT: &str = "/acvp/v1";

/// Everything needed to open a session against one validation server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host and port.
    pub server: ServerEndpoint,
    /// API prefix prepended to protocol endpoints.
    pub path_segment: String,
    /// TLS material: CA override and optional client identity.
    pub tls: TlsSettings,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration for a server with default prefix and timeout.
    #[must_use]
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            server: ServerEndpoint { host: host.to_string(), port },
            path_segment: DEFAULT_PATH_SEGMENT.to_string(),
            tls: TlsSettings::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the API prefix.
    #[must_use]
    pub fn with_path_segment(mut self, path_segment: &str) -> Self {
        self.path_segment = path_segment.to_string();
        self
    }

    /// Install TLS material.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsSettings) -> Self {
        self.tls = tls;
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the fields every network action depends on.
    ///
    /// # Errors
    ///
    /// Returns `MissingArg` when the server name or port is unset.
    pub fn sanity_check(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(AcvpError::MissingArg("server name is not set".to_string()));
        }
        if self.server.port == 0 {
            return Err(AcvpError::MissingArg("server port is not set".to_string()));
        }
        if self.path_segment.is_empty() {
            return Err(AcvpError::MissingArg("path segment is not set".to_string()));
        }
        Ok(())
    }
}
