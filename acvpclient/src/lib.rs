#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]

//! # acvpclient
//!
//! A client library that drives an ACVP test session against a remote
//! validation server: it fetches JSON vector sets, asks the pluggable
//! crypto module (the Device Under Test) to compute responses,
//! re-encodes them, and submits them over mutually authenticated TLS,
//! handling the bearer-token lifecycle along the way.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use acvpclient::{ClientConfig, CredentialSource, Result, TdesMode, TestSession};
//!
//! struct Creds;
//! impl CredentialSource for Creds {
//!     fn login_payload(&self) -> Result<String> {
//!         Ok(r#"{"password":"..."}"#.to_string())
//!     }
//! }
//!
//! # struct MyTdes;
//! # impl acvpclient::CryptoModule for MyTdes {
//! #     fn process(&self, _tc: &mut acvpclient::SymCipherTestCase)
//! #         -> std::result::Result<(), acvpclient::CryptoModuleError> { Ok(()) }
//! # }
//! # async fn example() -> Result<()> {
//! acvpclient::init_tracing()?;
//!
//! let config = ClientConfig::new("acvts.nist.gov", 443);
//! let mut session = TestSession::connect(&config, Creds)?;
//! session.registry_mut().register(TdesMode::Cbc, Arc::new(MyTdes));
//!
//! session.login().await?;
//! let registration = r#"[{"algorithms":[{"algorithm":"ACVP-TDES-CBC"}]}]"#;
//! let urls = session.register(registration).await?;
//! session.run(&urls).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The session loop is linear: fetch, compute, submit, repeat. The only
//! suspension points are the transport verbs; the crypto module is
//! called synchronously.

pub mod context;
pub mod logging;
pub mod session;

pub use acv_engine::{
    handle_sym_vector_set, Capability, CapabilityRegistry, CipherDirection, CryptoModule,
    CryptoModuleError, MctRoundRecord, SymCipherTestCase, SymGroupResponse, SymTestResponse,
    SymTestType, SymVectorSetResponse, TdesMode,
};
pub use acv_prelude::{AcvpError, Result};
pub use acv_transport::{
    build_query_url, inspect, user_agent_string, Credential, CredentialSource, HttpResponse,
    HttpTransport, NetAction, NetClient, ReqwestTransport, ServerEndpoint, TlsSettings, TokenStore,
};
pub use context::ClientConfig;
pub use logging::init_tracing;
pub use session::TestSession;
