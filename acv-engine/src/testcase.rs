//! The mutable buffer store for one in-flight symmetric test case.
//!
//! Buffers are allocated to compile-time maxima and wiped on drop; the
//! `*_len` fields are authoritative for how much of each buffer is live.
//! Lengths are bytes for every mode except CFB1, where `pt_len` and
//! `ct_len` count bits.

use acv_prelude::{
    AcvpError, Result, SYM_CT_BYTE_MAX, SYM_IV_BYTE_MAX, SYM_KEY_BYTE_MAX, SYM_PT_BYTE_MAX,
    TDES_KEY_BIT_LEN,
};
use zeroize::Zeroizing;

use crate::cipher::{CipherDirection, SymTestType, TdesMode};
use crate::hex;

/// Parsed per-test parameters handed to [`SymCipherTestCase::init`].
///
/// All lengths are in bits, as the server reports them; conversion to
/// bytes happens during init per the mode's counting rule.
#[derive(Debug, Clone)]
pub struct SymTcParams<'a> {
    /// Server-assigned test-case id
    pub tc_id: u32,
    /// Cipher mode under test
    pub cipher: TdesMode,
    /// Encrypt or decrypt
    pub direction: CipherDirection,
    /// AFT, MCT, or CTR
    pub test_type: SymTestType,
    /// Concatenated `key1 || key2 || key3` hex
    pub key_hex: &'a str,
    /// Plaintext hex, if the direction supplies one
    pub pt_hex: Option<&'a str>,
    /// Ciphertext hex, if the direction supplies one
    pub ct_hex: Option<&'a str>,
    /// IV hex, absent for ECB
    pub iv_hex: Option<&'a str>,
    /// Plaintext length in bits
    pub pt_bits: usize,
    /// Ciphertext length in bits
    pub ct_bits: usize,
    /// IV length in bits
    pub iv_bits: usize,
}

/// One symmetric test case in flight between the parser and the DUT.
///
/// The DUT writes its output into `ct` (encrypt) or `pt` (decrypt) and,
/// for the feedback modes under MCT, reports the returned IV state in
/// `iv_ret` and `iv_ret_after`.
#[derive(Debug)]
pub struct SymCipherTestCase {
    /// Server-assigned test-case id, unique within the vector set
    pub tc_id: u32,
    /// Cipher mode under test
    pub cipher: TdesMode,
    /// Encrypt or decrypt
    pub direction: CipherDirection,
    /// AFT, MCT, or CTR
    pub test_type: SymTestType,
    /// Key material; 24 bytes live for TDES
    pub key: Zeroizing<Vec<u8>>,
    /// Key length in bits
    pub key_len: usize,
    /// Plaintext buffer
    pub pt: Zeroizing<Vec<u8>>,
    /// Live plaintext length (bytes; bits for CFB1)
    pub pt_len: usize,
    /// Ciphertext buffer
    pub ct: Zeroizing<Vec<u8>>,
    /// Live ciphertext length (bytes; bits for CFB1)
    pub ct_len: usize,
    /// IV buffer
    pub iv: Zeroizing<Vec<u8>>,
    /// Live IV length in bytes; zero for ECB
    pub iv_len: usize,
    /// IV state the DUT reports at the start of an inner MCT round
    pub iv_ret: Zeroizing<Vec<u8>>,
    /// IV state the DUT reports after the final block of an inner round
    pub iv_ret_after: Zeroizing<Vec<u8>>,
    /// 0-based inner-round counter; the DUT reads this to distinguish
    /// the first round from subsequent rounds
    pub mct_index: usize,
}

impl SymCipherTestCase {
    /// Allocate buffers and parse whichever hex fields are present.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` when any hex field fails to decode or
    /// overflows its buffer. Buffers are wiped on drop regardless.
    pub fn init(params: &SymTcParams<'_>) -> Result<Self> {
        let mut tc = Self {
            tc_id: params.tc_id,
            cipher: params.cipher,
            direction: params.direction,
            test_type: params.test_type,
            key: Zeroizing::new(vec![0u8; SYM_KEY_BYTE_MAX]),
            key_len: TDES_KEY_BIT_LEN,
            pt: Zeroizing::new(vec![0u8; SYM_PT_BYTE_MAX]),
            pt_len: 0,
            ct: Zeroizing::new(vec![0u8; SYM_CT_BYTE_MAX]),
            ct_len: 0,
            iv: Zeroizing::new(vec![0u8; SYM_IV_BYTE_MAX]),
            iv_len: 0,
            iv_ret: Zeroizing::new(vec![0u8; SYM_IV_BYTE_MAX]),
            iv_ret_after: Zeroizing::new(vec![0u8; SYM_IV_BYTE_MAX]),
            mct_index: 0,
        };

        hex::hex_to_bytes(params.key_hex, &mut tc.key)
            .map_err(|e| AcvpError::InvalidArg(format!("key: {e}")))?;

        if let Some(pt_hex) = params.pt_hex {
            hex::hex_to_bytes_with_bits(pt_hex, &mut tc.pt, params.pt_bits)
                .map_err(|e| AcvpError::InvalidArg(format!("pt: {e}")))?;
        }
        if let Some(ct_hex) = params.ct_hex {
            hex::hex_to_bytes_with_bits(ct_hex, &mut tc.ct, params.ct_bits)
                .map_err(|e| AcvpError::InvalidArg(format!("ct: {e}")))?;
        }
        if let Some(iv_hex) = params.iv_hex {
            hex::hex_to_bytes(iv_hex, &mut tc.iv)
                .map_err(|e| AcvpError::InvalidArg(format!("iv: {e}")))?;
        }

        tc.iv_len = hex::bits_to_bytes(params.iv_bits);
        if params.cipher.counts_bits() {
            tc.pt_len = params.pt_bits;
            tc.ct_len = params.ct_bits;
        } else {
            tc.pt_len = hex::bits_to_bytes(params.pt_bits);
            tc.ct_len = hex::bits_to_bytes(params.ct_bits);
        }

        Ok(tc)
    }

    /// Live plaintext as bytes, applying the CFB1 bit-to-byte rounding.
    #[must_use]
    pub fn pt_bytes(&self) -> &[u8] {
        let n = if self.cipher.counts_bits() {
            hex::bits_to_bytes(self.pt_len)
        } else {
            self.pt_len
        };
        &self.pt[..n]
    }

    /// Live ciphertext as bytes, applying the CFB1 bit-to-byte rounding.
    #[must_use]
    pub fn ct_bytes(&self) -> &[u8] {
        let n = if self.cipher.counts_bits() {
            hex::bits_to_bytes(self.ct_len)
        } else {
            self.ct_len
        };
        &self.ct[..n]
    }
}
