//! Cipher mode, direction, and test-type tags for symmetric test cases.

use acv_prelude::{AcvpError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Triple-DES cipher mode under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TdesMode {
    /// Electronic codebook
    Ecb,
    /// Cipher block chaining
    Cbc,
    /// Output feedback
    Ofb,
    /// 1-bit cipher feedback
    Cfb1,
    /// 8-bit cipher feedback
    Cfb8,
    /// 64-bit cipher feedback
    Cfb64,
    /// Key wrap
    Kw,
}

impl TdesMode {
    /// Resolve an ACVP algorithm name to a mode.
    #[must_use]
    pub fn from_algorithm(name: &str) -> Option<Self> {
        match name {
            "ACVP-TDES-ECB" => Some(Self::Ecb),
            "ACVP-TDES-CBC" => Some(Self::Cbc),
            "ACVP-TDES-OFB" => Some(Self::Ofb),
            "ACVP-TDES-CFB1" => Some(Self::Cfb1),
            "ACVP-TDES-CFB8" => Some(Self::Cfb8),
            "ACVP-TDES-CFB64" => Some(Self::Cfb64),
            "ACVP-TDES-KW" => Some(Self::Kw),
            _ => None,
        }
    }

    /// The ACVP algorithm name for this mode.
    #[must_use]
    pub const fn algorithm(self) -> &'static str {
        match self {
            Self::Ecb => "ACVP-TDES-ECB",
            Self::Cbc => "ACVP-TDES-CBC",
            Self::Ofb => "ACVP-TDES-OFB",
            Self::Cfb1 => "ACVP-TDES-CFB1",
            Self::Cfb8 => "ACVP-TDES-CFB8",
            Self::Cfb64 => "ACVP-TDES-CFB64",
            Self::Kw => "ACVP-TDES-KW",
        }
    }

    /// Whether the vector set carries an IV for this mode.
    #[must_use]
    pub const fn uses_iv(self) -> bool {
        !matches!(self, Self::Ecb)
    }

    /// Whether payload lengths for this mode are counted in bits.
    #[must_use]
    pub const fn counts_bits(self) -> bool {
        matches!(self, Self::Cfb1)
    }

    /// Bits fed back per Monte-Carlo inner round, if the mode has an
    /// MCT definition.
    #[must_use]
    pub const fn mct_bit_len(self) -> Option<usize> {
        match self {
            Self::Ecb | Self::Cbc | Self::Ofb | Self::Cfb64 => Some(64),
            Self::Cfb8 => Some(8),
            Self::Cfb1 => Some(1),
            Self::Kw => None,
        }
    }
}

impl fmt::Display for TdesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.algorithm())
    }
}

/// Direction of a symmetric test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherDirection {
    /// Plaintext in, ciphertext out
    Encrypt,
    /// Ciphertext in, plaintext out
    Decrypt,
}

impl CipherDirection {
    /// Parse the server's `direction` group field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` for anything other than `encrypt`/`decrypt`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "encrypt" => Ok(Self::Encrypt),
            "decrypt" => Ok(Self::Decrypt),
            other => Err(AcvpError::InvalidArg(format!("invalid 'direction': {other}"))),
        }
    }
}

/// Test type of a symmetric test group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymTestType {
    /// Algorithm functional test: one-shot compute and return
    Aft,
    /// Monte-Carlo test: 100 x 1000 chained rounds
    Mct,
    /// Counter-mode test
    Ctr,
}

impl SymTestType {
    /// Parse the server's `testType` group field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` for anything other than `AFT`/`MCT`/`CTR`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "AFT" => Ok(Self::Aft),
            "MCT" => Ok(Self::Mct),
            "CTR" => Ok(Self::Ctr),
            other => Err(AcvpError::InvalidArg(format!("invalid 'testType': {other}"))),
        }
    }
}
