//! The crypto-module seam: the trait the Device Under Test implements.
//!
//! The engine owns the test-case buffers; the DUT reads its inputs from
//! them and writes its outputs back. For MCT runs the DUT is called once
//! per inner round with `mct_index` advancing 0..999 and is expected to
//! keep its cipher state across rounds of the same chain.

use thiserror::Error;

use crate::testcase::SymCipherTestCase;

/// Failure reported by the crypto module.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoModuleError {
    /// The computation failed outright.
    #[error("crypto module operation failed: {0}")]
    Operation(String),
    /// A key-unwrap integrity check failed. For KW decrypt test cases
    /// this is a reportable result, not an abort.
    #[error("key-wrap integrity check failed")]
    WrapIntegrity,
}

/// A pluggable crypto implementation under validation.
///
/// On encrypt the module fills `tc.ct` and `tc.ct_len`; on decrypt it
/// fills `tc.pt` and `tc.pt_len`. Feedback modes under MCT additionally
/// report `iv_ret` (IV at the start of the round) and `iv_ret_after`
/// (IV after the final block). The call must return synchronously.
pub trait CryptoModule: Send + Sync {
    /// Run one computation over the test case.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoModuleError::WrapIntegrity`] when a KW unwrap
    /// fails its integrity check, and
    /// [`CryptoModuleError::Operation`] for any other failure.
    fn process(&self, tc: &mut SymCipherTestCase) -> Result<(), CryptoModuleError>;
}
