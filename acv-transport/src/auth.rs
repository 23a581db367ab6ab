//! Bearer-token storage and HTTP-status inspection.
//!
//! Two token slots exist: the session JWT and a single-use token issued
//! for large submissions. Which one a request consumes is an explicit
//! parameter, not ambient state; consuming the single-use slot empties
//! it. Replaced tokens are zeroized.

use acv_prelude::{AcvpError, Result, JWT_TOKEN_MAX};
use zeroize::Zeroizing;

/// Which credential the next request should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// No Authorization header.
    None,
    /// The stored session JWT.
    Session,
    /// The single-use token; consumed by the request that takes it.
    SingleUse,
}

/// The session's token slots.
#[derive(Default)]
pub struct TokenStore {
    jwt: Option<Zeroizing<String>>,
    single_use: Option<Zeroizing<String>>,
}

impl TokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly issued session JWT, wiping any previous one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` when the token exceeds [`JWT_TOKEN_MAX`].
    pub fn set_session(&mut self, token: String) -> Result<()> {
        check_len(&token)?;
        self.jwt = Some(Zeroizing::new(token));
        Ok(())
    }

    /// Store a single-use token, wiping any previous one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` when the token exceeds [`JWT_TOKEN_MAX`].
    pub fn set_single_use(&mut self, token: String) -> Result<()> {
        check_len(&token)?;
        self.single_use = Some(Zeroizing::new(token));
        Ok(())
    }

    /// Drop the session JWT, zeroizing it.
    pub fn clear_session(&mut self) {
        self.jwt = None;
    }

    /// Whether a session JWT is currently held.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.jwt.is_some()
    }

    /// Take the token for the requested credential.
    ///
    /// `Session` clones the stored JWT; `SingleUse` consumes the
    /// single-use slot. Either returns `None` when the slot is empty.
    pub fn take(&mut self, credential: Credential) -> Option<Zeroizing<String>> {
        match credential {
            Credential::None => None,
            Credential::Session => self.jwt.clone(),
            Credential::SingleUse => {
                let token = self.single_use.take();
                if token.is_none() {
                    tracing::error!("single-use credential requested but none is stored");
                }
                token
            }
        }
    }
}

fn check_len(token: &str) -> Result<()> {
    if token.len() > JWT_TOKEN_MAX {
        return Err(AcvpError::InvalidArg(format!(
            "JWT exceeds maximum length ({JWT_TOKEN_MAX})"
        )));
    }
    Ok(())
}

const JWT_EXPIRED_STR: &str = "JWT expired";
const JWT_INVALID_STR: &str = "JWT signature does not match";

/// Interpret a completed HTTP exchange.
///
/// 2xx is success. A 401 body is parsed for the server's `error` string
/// to distinguish an expired token (recoverable by one refresh) from a
/// rejected signature (fatal). Everything else is an opaque transport
/// failure.
///
/// # Errors
///
/// Returns `JwtExpired`, `JwtInvalid`, or `TransportFail` as above.
pub fn inspect(status: u16, body: &[u8]) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    if status == 401 {
        let parsed: serde_json::Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => {
                tracing::error!("401 body does not contain a top-level JSON object");
                return Err(AcvpError::TransportFail("HTTP status 401".to_string()));
            }
        };
        let Some(err_str) = parsed.get("error").and_then(serde_json::Value::as_str) else {
            tracing::error!("401 JSON object does not contain 'error'");
            return Err(AcvpError::TransportFail("HTTP status 401".to_string()));
        };
        if err_str == JWT_EXPIRED_STR {
            return Err(AcvpError::JwtExpired);
        }
        if err_str.starts_with(JWT_INVALID_STR) {
            return Err(AcvpError::JwtInvalid);
        }
        return Err(AcvpError::TransportFail("HTTP status 401".to_string()));
    }

    Err(AcvpError::TransportFail(format!("HTTP status {status}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_pass() {
        assert!(inspect(200, b"").is_ok());
        assert!(inspect(201, b"{}").is_ok());
    }

    #[test]
    fn expired_token_detected_from_error_body() {
        let body = br#"{"error":"JWT expired"}"#;
        assert_eq!(inspect(401, body), Err(AcvpError::JwtExpired));
    }

    #[test]
    fn invalid_signature_detected_by_prefix() {
        let body = br#"{"error":"JWT signature does not match locally computed signature"}"#;
        assert_eq!(inspect(401, body), Err(AcvpError::JwtInvalid));
    }

    #[test]
    fn unrelated_401_is_generic_transport_failure() {
        assert!(matches!(
            inspect(401, br#"{"error":"account locked"}"#),
            Err(AcvpError::TransportFail(_))
        ));
        assert!(matches!(
            inspect(401, b"not json at all"),
            Err(AcvpError::TransportFail(_))
        ));
        assert!(matches!(inspect(401, br#"{"no":"error"}"#), Err(AcvpError::TransportFail(_))));
    }

    #[test]
    fn other_statuses_are_transport_failures() {
        assert!(matches!(inspect(500, b""), Err(AcvpError::TransportFail(_))));
        assert!(matches!(inspect(302, b""), Err(AcvpError::TransportFail(_))));
    }

    #[test]
    fn session_token_is_cloned_not_consumed() {
        let mut store = TokenStore::new();
        store.set_session("token-a".to_string()).unwrap();
        assert_eq!(store.take(Credential::Session).unwrap().as_str(), "token-a");
        assert!(store.has_session());
    }

    #[test]
    fn single_use_token_is_consumed_once() {
        let mut store = TokenStore::new();
        store.set_single_use("one-shot".to_string()).unwrap();
        assert_eq!(store.take(Credential::SingleUse).unwrap().as_str(), "one-shot");
        assert!(store.take(Credential::SingleUse).is_none());
    }

    #[test]
    fn refresh_replaces_session_token() {
        let mut store = TokenStore::new();
        store.set_session("old".to_string()).unwrap();
        store.set_session("new".to_string()).unwrap();
        assert_eq!(store.take(Credential::Session).unwrap().as_str(), "new");
    }

    #[test]
    fn overlong_token_rejected() {
        let mut store = TokenStore::new();
        let long = "j".repeat(JWT_TOKEN_MAX + 1);
        assert!(store.set_session(long).is_err());
    }

    #[test]
    fn no_credential_carries_no_token() {
        let mut store = TokenStore::new();
        store.set_session("token".to_string()).unwrap();
        assert!(store.take(Credential::None).is_none());
    }
}
