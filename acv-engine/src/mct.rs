//! Monte-Carlo Test feedback engine for Triple-DES.
//!
//! Runs the 100 outer x 1000 inner round chains the server scores as a
//! whole: each round record carries the key/IV/payload the round started
//! with and the final output of its inner chain, and the key, IV, and
//! payload for the next outer round are derived from the chain per the
//! cipher mode. Chain state is session-scoped: one [`MctSession`] per
//! vector set, dropped with it.

// Fixed-size round buffers with lengths bounded by the 8-byte TDES block;
// index arithmetic is over constant-bounded loop counters.
#![allow(clippy::indexing_slicing)]
#![allow(clippy::arithmetic_side_effects)]

use acv_prelude::{
    AcvpError, Result, CFB1_BIT_MASK, TDES_KEY_BYTE_LEN, TDES_MCT_INNER, TDES_MCT_OUTER,
};

use crate::cipher::{CipherDirection, TdesMode};
use crate::dut::CryptoModule;
use crate::hex;
use crate::response::MctRoundRecord;
use crate::testcase::SymCipherTestCase;

/// DES odd-parity fixup table: maps any byte to the nearest value whose
/// 1-bit count, LSB included, is odd.
const ODD_PARITY: [u8; 256] = [
    1, 1, 2, 2, 4, 4, 7, 7, 8, 8, 11, 11, 13, 13, 14, 14,
    16, 16, 19, 19, 21, 21, 22, 22, 25, 25, 26, 26, 28, 28, 31, 31,
    32, 32, 35, 35, 37, 37, 38, 38, 41, 41, 42, 42, 44, 44, 47, 47,
    49, 49, 50, 50, 52, 52, 55, 55, 56, 56, 59, 59, 61, 61, 62, 62,
    64, 64, 67, 67, 69, 69, 70, 70, 73, 73, 74, 74, 76, 76, 79, 79,
    81, 81, 82, 82, 84, 84, 87, 87, 88, 88, 91, 91, 93, 93, 94, 94,
    97, 97, 98, 98, 100, 100, 103, 103, 104, 104, 107, 107, 109, 109, 110, 110,
    112, 112, 115, 115, 117, 117, 118, 118, 121, 121, 122, 122, 124, 124, 127, 127,
    128, 128, 131, 131, 133, 133, 134, 134, 137, 137, 138, 138, 140, 140, 143, 143,
    145, 145, 146, 146, 148, 148, 151, 151, 152, 152, 155, 155, 157, 157, 158, 158,
    161, 161, 162, 162, 164, 164, 167, 167, 168, 168, 171, 171, 173, 173, 174, 174,
    176, 176, 179, 179, 181, 181, 182, 182, 185, 185, 186, 186, 188, 188, 191, 191,
    193, 193, 194, 194, 196, 196, 199, 199, 200, 200, 203, 203, 205, 205, 206, 206,
    208, 208, 211, 211, 213, 213, 214, 214, 217, 217, 218, 218, 220, 220, 223, 223,
    224, 224, 227, 227, 229, 229, 230, 230, 233, 233, 234, 234, 236, 236, 239, 239,
    241, 241, 242, 242, 244, 244, 247, 247, 248, 248, 251, 251, 253, 253, 254, 254,
];

/// Reapply DES odd parity to every byte of a 24-byte TDES key.
pub fn set_odd_parity(key: &mut [u8]) {
    for byte in key.iter_mut().take(TDES_KEY_BYTE_LEN) {
        *byte = ODD_PARITY[*byte as usize];
    }
}

/// Shift `bit_len` bits of `data` into the least-significant end of the
/// 24-byte register, discarding the most-significant `bit_len` bits.
pub fn shift_in(nk: &mut [u8; TDES_KEY_BYTE_LEN], data: &[u8], bit_len: usize) {
    let byte_shift = bit_len / 8;
    let bit_shift = bit_len % 8;
    let take = hex::bits_to_bytes(bit_len);

    // One spare byte: a sub-byte append lands past the register and the
    // bit shift pulls it in.
    let mut buf = [0u8; TDES_KEY_BYTE_LEN + 1];
    buf[..TDES_KEY_BYTE_LEN].copy_from_slice(nk);
    buf.copy_within(byte_shift..TDES_KEY_BYTE_LEN, 0);
    buf[TDES_KEY_BYTE_LEN - byte_shift..TDES_KEY_BYTE_LEN - byte_shift + take]
        .copy_from_slice(&data[..take]);
    if bit_shift != 0 {
        for n in 0..TDES_KEY_BYTE_LEN {
            buf[n] = (buf[n] << bit_shift) | (buf[n + 1] >> (8 - bit_shift));
        }
    }
    nk.copy_from_slice(&buf[..TDES_KEY_BYTE_LEN]);
}

/// Session-scoped Monte-Carlo state: one per vector set.
pub struct MctSession {
    old_iv: [u8; 8],
    ptext: Vec<[u8; 8]>,
    ctext: Vec<[u8; 8]>,
    nk: [u8; TDES_KEY_BYTE_LEN],
}

impl MctSession {
    /// Allocate the per-inner-round buffers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            old_iv: [0u8; 8],
            ptext: vec![[0u8; 8]; TDES_MCT_INNER],
            ctext: vec![[0u8; 8]; TDES_MCT_INNER],
            nk: [0u8; TDES_KEY_BYTE_LEN],
        }
    }

    /// Run the full 100 x 1000 chain for one MCT test case, returning
    /// one record per outer round.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOp` for a mode without an MCT definition and
    /// `CryptoModuleFail` if the DUT fails mid-chain; no partial result
    /// is returned.
    pub fn run(
        &mut self,
        dut: &dyn CryptoModule,
        tc: &mut SymCipherTestCase,
    ) -> Result<Vec<MctRoundRecord>> {
        let bit_len = tc.cipher.mct_bit_len().ok_or_else(|| {
            AcvpError::UnsupportedOp(format!("no MCT definition for {}", tc.cipher))
        })?;

        let mut records = Vec::with_capacity(TDES_MCT_OUTER);
        for _ in 0..TDES_MCT_OUTER {
            let mut record = self.round_record(tc);

            for j in 0..TDES_MCT_INNER {
                if j == 0 {
                    self.old_iv[..tc.iv_len].copy_from_slice(&tc.iv[..tc.iv_len]);
                }
                tc.mct_index = j;
                dut.process(tc).map_err(|e| {
                    tracing::error!("crypto module failed the MCT operation: {e}");
                    AcvpError::CryptoModuleFail(e.to_string())
                })?;

                match tc.direction {
                    CipherDirection::Encrypt => shift_in(&mut self.nk, &tc.ct, bit_len),
                    CipherDirection::Decrypt => shift_in(&mut self.nk, &tc.pt, bit_len),
                }
                self.iterate(tc, j);
            }

            // Fold the shift register into the key, fragment-reversed.
            for n in 0..8 {
                tc.key[n] ^= self.nk[16 + n];
            }
            for n in 0..8 {
                tc.key[8 + n] ^= self.nk[8 + n];
            }
            for n in 0..8 {
                tc.key[16 + n] ^= self.nk[n];
            }
            set_odd_parity(&mut tc.key);

            tc.iv[..8].copy_from_slice(&tc.iv_ret_after[..8]);

            if tc.cipher == TdesMode::Ofb {
                match tc.direction {
                    CipherDirection::Encrypt => {
                        for n in 0..8 {
                            tc.pt[n] = self.ptext[0][n] ^ tc.iv_ret[n];
                        }
                    }
                    CipherDirection::Decrypt => {
                        for n in 0..8 {
                            tc.ct[n] = self.ctext[0][n] ^ tc.iv_ret[n];
                        }
                    }
                }
            }

            match tc.direction {
                CipherDirection::Encrypt => {
                    if tc.cipher == TdesMode::Cfb1 {
                        tc.ct[0] &= CFB1_BIT_MASK;
                        record.ct = Some(hex::bytes_to_hex(&tc.ct[..1]));
                    } else {
                        record.ct = Some(hex::bytes_to_hex(&tc.ct[..tc.ct_len]));
                    }
                }
                CipherDirection::Decrypt => {
                    if tc.cipher == TdesMode::Cfb1 {
                        record.pt = Some(hex::bytes_to_hex(&tc.pt[..1]));
                    } else {
                        record.pt = Some(hex::bytes_to_hex(&tc.pt[..tc.pt_len]));
                    }
                }
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Record the key/IV/payload state an outer round starts with.
    fn round_record(&self, tc: &mut SymCipherTestCase) -> MctRoundRecord {
        let mut record = MctRoundRecord {
            key1: hex::bytes_to_hex(&tc.key[0..8]),
            key2: hex::bytes_to_hex(&tc.key[8..16]),
            key3: hex::bytes_to_hex(&tc.key[16..24]),
            iv: tc
                .cipher
                .uses_iv()
                .then(|| hex::bytes_to_hex(&tc.iv[..tc.iv_len])),
            pt: None,
            ct: None,
        };
        match tc.direction {
            CipherDirection::Encrypt => {
                if tc.cipher == TdesMode::Cfb1 {
                    tc.pt[0] &= CFB1_BIT_MASK;
                    record.pt = Some(hex::bytes_to_hex(&tc.pt[..1]));
                } else {
                    record.pt = Some(hex::bytes_to_hex(&tc.pt[..tc.pt_len]));
                }
            }
            CipherDirection::Decrypt => {
                if tc.cipher == TdesMode::Cfb1 {
                    record.ct = Some(hex::bytes_to_hex(&tc.ct[..1]));
                } else {
                    record.ct = Some(hex::bytes_to_hex(&tc.ct[..tc.ct_len]));
                }
            }
        }
        record
    }

    /// Apply the mode's inner-round transition after one DUT call.
    fn iterate(&mut self, tc: &mut SymCipherTestCase, j: usize) {
        let ct_n = feedback_bytes(tc.cipher, tc.ct_len);
        let pt_n = feedback_bytes(tc.cipher, tc.pt_len);
        self.ctext[j][..ct_n].copy_from_slice(&tc.ct[..ct_n]);
        self.ptext[j][..pt_n].copy_from_slice(&tc.pt[..pt_n]);

        match (tc.cipher, tc.direction) {
            (TdesMode::Cbc | TdesMode::Cfb64, CipherDirection::Encrypt) => {
                if j == 0 {
                    tc.pt[..8].copy_from_slice(&self.old_iv);
                } else {
                    tc.pt[..8].copy_from_slice(&self.ctext[j - 1]);
                }
                tc.iv[..8].copy_from_slice(&self.ctext[j]);
            }
            (TdesMode::Cbc, CipherDirection::Decrypt) => {
                tc.ct[..8].copy_from_slice(&self.ptext[j]);
                if j != 0 {
                    tc.iv[..8].copy_from_slice(&self.ptext[j - 1]);
                }
            }
            (TdesMode::Cfb64 | TdesMode::Cfb1 | TdesMode::Cfb8, CipherDirection::Decrypt) => {
                for n in 0..8 {
                    tc.ct[n] ^= tc.pt[n];
                }
                for n in 0..8 {
                    tc.iv[n] = tc.pt[n] ^ tc.ct[n];
                }
            }
            (TdesMode::Ofb, CipherDirection::Encrypt)
            | (TdesMode::Cfb1 | TdesMode::Cfb8, CipherDirection::Encrypt) => {
                if j == 0 {
                    tc.pt[..8].copy_from_slice(&self.old_iv);
                } else {
                    for n in 0..8 {
                        tc.pt[n] = tc.iv_ret[n];
                    }
                }
            }
            (TdesMode::Ofb, CipherDirection::Decrypt) => {
                if j == 0 {
                    tc.ct[..8].copy_from_slice(&self.old_iv);
                } else {
                    for n in 0..8 {
                        tc.ct[n] = tc.iv_ret[n];
                    }
                }
            }
            (TdesMode::Ecb, CipherDirection::Encrypt) => {
                let n = tc.ct_len.min(8);
                for i in 0..n {
                    tc.pt[i] = tc.ct[i];
                }
            }
            (TdesMode::Ecb, CipherDirection::Decrypt) => {
                let n = tc.pt_len.min(8);
                for i in 0..n {
                    tc.ct[i] = tc.pt[i];
                }
            }
            (TdesMode::Kw, _) => {}
        }
    }
}

impl Default for MctSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes of one inner round's output that enter the feedback buffers.
const fn feedback_bytes(cipher: TdesMode, len: usize) -> usize {
    if cipher.counts_bits() {
        1
    } else if len < 8 {
        len
    } else {
        8
    }
}
