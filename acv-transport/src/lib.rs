#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]

//! # ACVP Authenticated Transport
//!
//! HTTPS plumbing for an ACVP test session: GET/POST/PUT verbs over
//! TLS 1.2+ with optional mutual authentication, bearer-token lifecycle
//! management, and the network-action coordinator that transparently
//! refreshes an expired session token and replays the request exactly
//! once.
//!
//! ## Modules
//!
//! - **tls**: reqwest client construction (CA override, client identity)
//! - **http**: the transport trait, verbs, and bounded body accumulation
//! - **auth**: token store, credential selection, HTTP-code inspection
//! - **action**: the network-action coordinator
//! - **agent**: HTTP User-Agent assembly

pub mod action;
pub mod agent;
pub mod auth;
pub mod http;
pub mod tls;

pub use action::{CredentialSource, NetAction, NetClient};
pub use agent::user_agent_string;
pub use auth::{inspect, Credential, TokenStore};
pub use http::{build_query_url, HttpResponse, HttpTransport, ReqwestTransport, ServerEndpoint};
pub use tls::TlsSettings;
