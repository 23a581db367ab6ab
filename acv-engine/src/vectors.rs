//! Serde types for the vector-set request tree.
//!
//! Field presence is validated by the handler rather than by serde so
//! that a missing `key1` surfaces as `MissingArg` while a structurally
//! broken document surfaces as `MalformedJson`, matching the error
//! taxonomy the session loop reports upstream.

use serde::Deserialize;

/// A vector set as fetched from the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymVectorSet {
    /// Identifies the vector set.
    pub vs_id: u64,
    /// The algorithm being tested, e.g. `ACVP-TDES-CBC`.
    pub algorithm: String,
    /// The protocol revision.
    #[serde(default)]
    pub revision: Option<String>,
    /// Whether these are sample vectors.
    #[serde(default)]
    pub is_sample: bool,
    /// Groups of test cases.
    pub test_groups: Vec<SymTestGroup>,
}

/// One group of test cases sharing direction and test type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymTestGroup {
    /// Identifies the group.
    pub tg_id: u64,
    /// `encrypt` or `decrypt`.
    #[serde(default)]
    pub direction: Option<String>,
    /// `AFT`, `MCT`, or `CTR`.
    #[serde(default)]
    pub test_type: Option<String>,
    /// The test cases.
    #[serde(default)]
    pub tests: Vec<SymTestInput>,
}

/// One test case as sent by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymTestInput {
    /// Identifies the test case.
    pub tc_id: u32,
    /// First 8-byte key fragment, 16 hex chars.
    #[serde(default)]
    pub key1: Option<String>,
    /// Second 8-byte key fragment.
    #[serde(default)]
    pub key2: Option<String>,
    /// Third 8-byte key fragment.
    #[serde(default)]
    pub key3: Option<String>,
    /// Plaintext hex; present for encrypt groups.
    #[serde(default)]
    pub pt: Option<String>,
    /// Ciphertext hex; present for decrypt groups.
    #[serde(default)]
    pub ct: Option<String>,
    /// IV hex; present for every mode except ECB.
    #[serde(default)]
    pub iv: Option<String>,
    /// Explicit payload length in bits; overrides the hex length for CFB1.
    #[serde(default)]
    pub payload_len: Option<usize>,
}
