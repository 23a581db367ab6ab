//! Symmetric vector-set handler.
//!
//! Walks the groups and tests of a Triple-DES vector set, runs each test
//! case through the registered DUT (directly for AFT, through the MCT
//! engine for Monte-Carlo groups), and assembles the response document
//! in the server's iteration order.

use acv_prelude::{
    AcvpError, Result, SYM_CT_BYTE_MAX, SYM_PT_BYTE_MAX, TDES_KEY_FRAGMENT_HEX_LEN,
};
use tracing::{debug, info};

use crate::cipher::{CipherDirection, SymTestType, TdesMode};
use crate::dispatch::{Capability, CapabilityRegistry};
use crate::dut::CryptoModuleError;
use crate::hex;
use crate::mct::MctSession;
use crate::response::{SymGroupResponse, SymTestResponse, SymVectorSetResponse};
use crate::testcase::{SymCipherTestCase, SymTcParams};
use crate::vectors::{SymTestInput, SymVectorSet};

/// Process one symmetric vector set and build its response document.
///
/// # Errors
///
/// Fails fast on the first malformed group or test, on an unsupported
/// algorithm, and on any DUT failure. No partial response is returned.
pub fn handle_sym_vector_set(
    registry: &CapabilityRegistry,
    vs_json: &serde_json::Value,
) -> Result<SymVectorSetResponse> {
    let vs: SymVectorSet = serde_json::from_value(vs_json.clone())
        .map_err(|e| AcvpError::MalformedJson(format!("vector set: {e}")))?;

    let cap = registry.lookup(&vs.algorithm)?;
    let mut response = SymVectorSetResponse::new(vs.vs_id, &vs.algorithm);
    let mut mct = MctSession::new();

    for group in &vs.test_groups {
        let dir_str = group
            .direction
            .as_deref()
            .ok_or_else(|| AcvpError::MissingArg("server JSON missing 'direction'".to_string()))?;
        let direction = CipherDirection::parse(dir_str)?;

        let type_str = group
            .test_type
            .as_deref()
            .ok_or_else(|| AcvpError::MissingArg("server JSON missing 'testType'".to_string()))?;
        let test_type = SymTestType::parse(type_str)?;

        info!(
            tg_id = group.tg_id,
            direction = dir_str,
            test_type = type_str,
            "processing test group"
        );

        let mut group_rsp = SymGroupResponse::new(group.tg_id);
        for test in &group.tests {
            debug!(tc_id = test.tc_id, "found new 3DES test vector");
            let test_rsp = run_one_test(&cap, &mut mct, direction, test_type, test)?;
            group_rsp.tests.push(test_rsp);
        }
        response.test_groups.push(group_rsp);
    }

    Ok(response)
}

fn run_one_test(
    cap: &Capability,
    mct: &mut MctSession,
    direction: CipherDirection,
    test_type: SymTestType,
    test: &SymTestInput,
) -> Result<SymTestResponse> {
    let key1 = key_fragment(test.key1.as_deref(), "key1")?;
    let key2 = key_fragment(test.key2.as_deref(), "key2")?;
    let key3 = key_fragment(test.key3.as_deref(), "key3")?;
    let key_hex = format!("{key1}{key2}{key3}");

    let mut pt_hex = None;
    let mut ct_hex = None;
    let mut pt_bits = 0;
    let mut ct_bits = 0;
    match direction {
        CipherDirection::Encrypt => {
            let pt = test
                .pt
                .as_deref()
                .ok_or_else(|| AcvpError::MissingArg("server JSON missing 'pt'".to_string()))?;
            if pt.len() > SYM_PT_BYTE_MAX * 2 {
                return Err(AcvpError::InvalidArg(format!(
                    "'pt' too long, max allowed {} chars",
                    SYM_PT_BYTE_MAX * 2
                )));
            }
            pt_bits = payload_bits(cap.cipher, pt, test.payload_len);
            pt_hex = Some(pt);
        }
        CipherDirection::Decrypt => {
            let ct = test
                .ct
                .as_deref()
                .ok_or_else(|| AcvpError::MissingArg("server JSON missing 'ct'".to_string()))?;
            if ct.len() > SYM_CT_BYTE_MAX * 2 {
                return Err(AcvpError::InvalidArg(format!(
                    "'ct' too long, max allowed {} chars",
                    SYM_CT_BYTE_MAX * 2
                )));
            }
            ct_bits = payload_bits(cap.cipher, ct, test.payload_len);
            ct_hex = Some(ct);
        }
    }

    let mut iv_hex = None;
    let mut iv_bits = 0;
    if cap.cipher.uses_iv() {
        let iv = test
            .iv
            .as_deref()
            .ok_or_else(|| AcvpError::MissingArg("server JSON missing 'iv'".to_string()))?;
        if iv.len() != 16 {
            return Err(AcvpError::InvalidArg(format!(
                "invalid 'iv' length ({}), expected 16",
                iv.len()
            )));
        }
        iv_bits = iv.len() * 4;
        iv_hex = Some(iv);
    }

    let params = SymTcParams {
        tc_id: test.tc_id,
        cipher: cap.cipher,
        direction,
        test_type,
        key_hex: &key_hex,
        pt_hex,
        ct_hex,
        iv_hex,
        pt_bits,
        ct_bits,
        iv_bits,
    };
    let mut tc = SymCipherTestCase::init(&params)?;

    let mut test_rsp = SymTestResponse::new(test.tc_id);
    if test_type == SymTestType::Mct {
        test_rsp.results_array = Some(mct.run(cap.module.as_ref(), &mut tc)?);
    } else {
        match cap.module.process(&mut tc) {
            Ok(()) => output_tc(&tc, &mut test_rsp, false),
            Err(CryptoModuleError::WrapIntegrity)
                if tc.cipher == TdesMode::Kw && direction == CipherDirection::Decrypt =>
            {
                output_tc(&tc, &mut test_rsp, true);
            }
            Err(e) => {
                tracing::error!("crypto module failed the operation: {e}");
                return Err(AcvpError::CryptoModuleFail(e.to_string()));
            }
        }
    }

    Ok(test_rsp)
}

/// Serialize a completed AFT/CTR test case into its response entry.
fn output_tc(tc: &SymCipherTestCase, rsp: &mut SymTestResponse, wrap_failed: bool) {
    match tc.direction {
        CipherDirection::Encrypt => {
            rsp.ct = Some(hex::bytes_to_hex(tc.ct_bytes()));
        }
        CipherDirection::Decrypt => {
            if wrap_failed {
                rsp.test_passed = Some(false);
            } else {
                rsp.pt = Some(hex::bytes_to_hex(tc.pt_bytes()));
            }
        }
    }
}

/// Payload length in bits: the hex length times four, overridden by an
/// explicit `payloadLen` for CFB1.
fn payload_bits(cipher: TdesMode, hex_str: &str, payload_len: Option<usize>) -> usize {
    let bits = hex_str.len() * 4;
    if cipher == TdesMode::Cfb1 {
        match payload_len {
            Some(n) if n > 0 => n,
            _ => bits,
        }
    } else {
        bits
    }
}

fn key_fragment<'a>(fragment: Option<&'a str>, name: &str) -> Result<&'a str> {
    let fragment = fragment
        .ok_or_else(|| AcvpError::MissingArg(format!("server JSON missing '{name}'")))?;
    if fragment.len() != TDES_KEY_FRAGMENT_HEX_LEN {
        return Err(AcvpError::InvalidArg(format!(
            "'{name}' wrong length ({}), expected {}",
            fragment.len(),
            TDES_KEY_FRAGMENT_HEX_LEN
        )));
    }
    Ok(fragment)
}
