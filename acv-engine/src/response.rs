//! Serde types for the response document submitted to the server.
//!
//! The tree mirrors the request: one group per request group in array
//! order, one test per request test in array order. The server scores on
//! that ordering.

use serde::Serialize;

/// The response document for one vector set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymVectorSetResponse {
    /// Echoes the vector set id.
    pub vector_set_id: u64,
    /// Echoes the algorithm name.
    pub algorithm: String,
    /// One entry per request group, in request order.
    pub test_groups: Vec<SymGroupResponse>,
}

impl SymVectorSetResponse {
    /// Start an empty response for the given vector set.
    #[must_use]
    pub fn new(vector_set_id: u64, algorithm: &str) -> Self {
        Self {
            vector_set_id,
            algorithm: algorithm.to_string(),
            test_groups: Vec::new(),
        }
    }
}

/// Response entry for one test group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymGroupResponse {
    /// Echoes the group id.
    pub tg_id: u64,
    /// One entry per request test, in request order.
    pub tests: Vec<SymTestResponse>,
}

impl SymGroupResponse {
    /// Start an empty group response with a matching id.
    #[must_use]
    pub fn new(tg_id: u64) -> Self {
        Self { tg_id, tests: Vec::new() }
    }
}

/// Response entry for one test case.
///
/// Exactly one of `ct`, `pt`, `test_passed`, or `results_array` is
/// populated, depending on direction, mode, and test type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymTestResponse {
    /// Echoes the test-case id.
    pub tc_id: u32,
    /// Computed ciphertext hex (AFT encrypt).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<String>,
    /// Computed plaintext hex (AFT decrypt).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pt: Option<String>,
    /// Key-wrap integrity verdict (KW decrypt).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_passed: Option<bool>,
    /// Per-outer-round records (MCT).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_array: Option<Vec<MctRoundRecord>>,
}

impl SymTestResponse {
    /// Start an empty test response with a matching id.
    #[must_use]
    pub fn new(tc_id: u32) -> Self {
        Self {
            tc_id,
            ct: None,
            pt: None,
            test_passed: None,
            results_array: None,
        }
    }
}

/// One Monte-Carlo outer-round record.
///
/// Carries the key and IV the round *started* with plus the input
/// payload, then the final output of the round's 1000-iteration chain.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MctRoundRecord {
    /// First key fragment, hex.
    pub key1: String,
    /// Second key fragment, hex.
    pub key2: String,
    /// Third key fragment, hex.
    pub key3: String,
    /// Starting IV hex; absent for ECB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    /// Input plaintext (encrypt) or final plaintext (decrypt).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pt: Option<String>,
    /// Final ciphertext (encrypt) or input ciphertext (decrypt).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<String>,
}
