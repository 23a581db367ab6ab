//! TLS-backed HTTP client construction.
//!
//! Server certificate verification is always on. TLS 1.2 is the floor.
//! A CA bundle may override the system roots, and a client certificate
//! plus key enables mutual authentication.

use std::path::PathBuf;
use std::time::Duration;

use acv_prelude::{AcvpError, Result};

/// TLS material locations for a session.
#[derive(Debug, Clone, Default)]
pub struct TlsSettings {
    /// PEM bundle overriding the system trust roots, if any.
    pub ca_file: Option<PathBuf>,
    /// Client certificate chain (PEM) for mutual authentication.
    pub client_cert_file: Option<PathBuf>,
    /// Client private key (PEM) for mutual authentication.
    pub client_key_file: Option<PathBuf>,
}

impl TlsSettings {
    /// Build the reqwest client this session will use for every request.
    ///
    /// # Errors
    ///
    /// Returns `TransportFail` when TLS material cannot be read or
    /// parsed, when only one half of the client identity is configured,
    /// or when client construction fails.
    pub fn build_client(&self, user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .timeout(timeout)
            .user_agent(user_agent);

        if let Some(ca_file) = &self.ca_file {
            let pem = std::fs::read(ca_file).map_err(|e| {
                AcvpError::TransportFail(format!(
                    "failed to read CA bundle '{}': {e}",
                    ca_file.display()
                ))
            })?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                AcvpError::TransportFail(format!(
                    "failed to parse CA bundle '{}': {e}",
                    ca_file.display()
                ))
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        match (&self.client_cert_file, &self.client_key_file) {
            (Some(cert_file), Some(key_file)) => {
                let mut pem = std::fs::read(cert_file).map_err(|e| {
                    AcvpError::TransportFail(format!(
                        "failed to read client certificate '{}': {e}",
                        cert_file.display()
                    ))
                })?;
                let key = std::fs::read(key_file).map_err(|e| {
                    AcvpError::TransportFail(format!(
                        "failed to read client key '{}': {e}",
                        key_file.display()
                    ))
                })?;
                pem.extend_from_slice(&key);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    AcvpError::TransportFail(format!("failed to build client identity: {e}"))
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(AcvpError::MissingArg(
                    "mutual TLS requires both client certificate and key".to_string(),
                ));
            }
        }

        builder
            .build()
            .map_err(|e| AcvpError::TransportFail(format!("failed to create HTTP client: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_client_builds() {
        let settings = TlsSettings::default();
        assert!(settings.build_client("acvpclient-test", Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn missing_ca_file_fails() {
        let settings = TlsSettings {
            ca_file: Some(PathBuf::from("/nonexistent/ca.pem")),
            ..Default::default()
        };
        let err = settings
            .build_client("acvpclient-test", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, AcvpError::TransportFail(_)));
    }

    #[test]
    fn half_configured_identity_is_rejected() {
        let settings = TlsSettings {
            client_cert_file: Some(PathBuf::from("/nonexistent/client.crt")),
            ..Default::default()
        };
        let err = settings
            .build_client("acvpclient-test", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, AcvpError::MissingArg(_)));
    }
}
