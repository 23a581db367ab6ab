//! Core Error Types for the ACVP Client
//!
//! This module defines the error type used throughout the workspace for
//! vector-set processing, transport, and session authentication.

use thiserror::Error;

/// Result type alias for ACVP client operations
pub type Result<T> = std::result::Result<T, AcvpError>;

/// Error type covering every failure the ACVP client can surface
///
/// The session loop propagates these fail-fast; only [`AcvpError::JwtExpired`]
/// from a non-login action is recovered locally, and only once per request.
#[derive(Debug, Error, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AcvpError {
    /// No context available for the operation
    #[error("No context for operation: {0}")]
    NoContext(String),
    /// Required argument or field missing
    #[error("Missing argument: {0}")]
    MissingArg(String),
    /// Argument or field present but invalid
    #[error("Invalid argument: {0}")]
    InvalidArg(String),
    /// Server JSON does not have the expected structure
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),
    /// Algorithm or operation not supported by any registered capability
    #[error("Unsupported operation: {0}")]
    UnsupportedOp(String),
    /// The crypto module (DUT) failed a computation
    #[error("Crypto module failed the operation: {0}")]
    CryptoModuleFail(String),
    /// The crypto module reported a key-wrap integrity failure
    #[error("Crypto module reported key-wrap integrity failure")]
    CryptoWrapFail,
    /// HTTP transport failure
    #[error("Transport failure: {0}")]
    TransportFail(String),
    /// The bearer token has expired
    #[error("JWT expired")]
    JwtExpired,
    /// The bearer token signature was rejected by the server
    #[error("JWT invalid")]
    JwtInvalid,
    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(String),
    /// An action that requires a payload was given none
    #[error("No data: {0}")]
    NoData(String),
}

impl AcvpError {
    /// Whether the coordinator may recover from this error by refreshing
    /// the session token and replaying the request once.
    #[must_use]
    pub const fn is_refreshable(&self) -> bool {
        matches!(self, Self::JwtExpired)
    }
}
