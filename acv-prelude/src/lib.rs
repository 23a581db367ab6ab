#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]

//! # ACVP Client Prelude
//!
//! Shared error types, result alias, and protocol limits used by every
//! crate in the ACVP client workspace.
//!
//! ## Modules
//!
//! - **error**: The [`AcvpError`] enum and [`Result`] alias
//! - **limits**: Wire-protocol and buffer capacity constants

pub mod error;
pub mod limits;

pub use error::{AcvpError, Result};
pub use limits::*;
