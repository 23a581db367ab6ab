//! End-to-end session-loop tests over a scripted transport.
//!
//! These drive the public session API the way a DUT integration would:
//! login, registration, vector-set fetch, compute, and submission, with
//! the network played back from a script and the crypto module stubbed.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use acvpclient::{
    AcvpError, ClientConfig, CipherDirection, CredentialSource, CryptoModule, CryptoModuleError,
    HttpTransport, Result, SymCipherTestCase, TdesMode, TestSession,
};

#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    url: String,
    body: Option<String>,
    bearer: Option<String>,
}

// A scripted transport: pops one canned response per request.
struct ScriptedTransport {
    script: Mutex<VecDeque<(u16, String)>>,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedTransport {
    fn new(script: Vec<(u16, &str)>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|(status, body)| (status, body.to_string()))
                    .collect(),
            ),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn respond(
        &self,
        method: &'static str,
        url: &str,
        body: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<acvpclient::HttpResponse> {
        self.seen.lock().expect("poisoned").push(Seen {
            method,
            url: url.to_string(),
            body: body.map(str::to_string),
            bearer: bearer.map(str::to_string),
        });
        let (status, text) = self
            .script
            .lock()
            .expect("poisoned")
            .pop_front()
            .expect("script exhausted: unexpected extra request");
        Ok(acvpclient::HttpResponse { status, body: text.into_bytes() })
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl HttpTransport for &ScriptedTransport {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<acvpclient::HttpResponse> {
        self.respond("GET", url, None, bearer)
    }

    async fn post(
        &self,
        url: &str,
        body: &str,
        bearer: Option<&str>,
    ) -> Result<acvpclient::HttpResponse> {
        self.respond("POST", url, Some(body), bearer)
    }

    async fn put(
        &self,
        url: &str,
        body: &str,
        bearer: Option<&str>,
    ) -> Result<acvpclient::HttpResponse> {
        self.respond("PUT", url, Some(body), bearer)
    }
}

struct StaticCreds;

impl CredentialSource for StaticCreds {
    fn login_payload(&self) -> Result<String> {
        Ok(r#"{"password":"hunter2"}"#.to_string())
    }
}

/// Invertible XOR stand-in for a real TDES module.
struct EchoModule;

impl CryptoModule for EchoModule {
    fn process(&self, tc: &mut SymCipherTestCase) -> std::result::Result<(), CryptoModuleError> {
        match tc.direction {
            CipherDirection::Encrypt => {
                let n = tc.pt_bytes().len();
                for i in 0..n {
                    tc.ct[i] = tc.pt[i] ^ 0xFF;
                }
                tc.ct_len = tc.pt_len;
            }
            CipherDirection::Decrypt => {
                let n = tc.ct_bytes().len();
                for i in 0..n {
                    tc.pt[i] = tc.ct[i] ^ 0xFF;
                }
                tc.pt_len = tc.ct_len;
            }
        }
        Ok(())
    }
}

const VECTOR_SET: &str = r#"{
    "vsId": 12,
    "algorithm": "ACVP-TDES-CBC",
    "revision": "1.0",
    "testGroups": [{
        "tgId": 1,
        "direction": "encrypt",
        "testType": "AFT",
        "tests": [{
            "tcId": 1,
            "key1": "0123456789abcdef",
            "key2": "23456789abcdef01",
            "key3": "456789abcdef0123",
            "pt": "8899aabbccddeeff",
            "iv": "0011223344556677"
        }]
    }]
}"#;

fn session(transport: &ScriptedTransport) -> TestSession<&ScriptedTransport, StaticCreds> {
    let config = ClientConfig::new("acvts.test", 443);
    let mut session = TestSession::with_transport(transport, &config, StaticCreds);
    session
        .registry_mut()
        .register(TdesMode::Cbc, Arc::new(EchoModule));
    session
}

#[tokio::test]
async fn full_session_flow_submits_computed_responses() {
    let transport = ScriptedTransport::new(vec![
        (200, r#"{"accessToken":"jwt-1"}"#),
        (
            200,
            r#"[{"acvVersion":"1.0"},{"url":"/acvp/v1/testSessions/9",
                "vectorSetUrls":["/acvp/v1/testSessions/9/vectorSets/12"]}]"#,
        ),
        (200, VECTOR_SET),
        (200, "{}"),
    ]);
    let mut session = session(&transport);

    session.login().await.unwrap();
    let urls = session.register(r#"[{"algorithms":[]}]"#).await.unwrap();
    assert_eq!(urls, vec!["/acvp/v1/testSessions/9/vectorSets/12"]);
    assert_eq!(session.session_url(), Some("/acvp/v1/testSessions/9"));

    session.run(&urls).await.unwrap();

    let seen = transport.seen();
    assert_eq!(seen.len(), 4);
    assert!(seen[0].url.ends_with("/acvp/v1/login"));
    assert_eq!(seen[0].bearer, None);
    assert!(seen[1].url.ends_with("/acvp/v1/testSessions"));
    assert_eq!(seen[1].bearer.as_deref(), Some("jwt-1"));
    assert_eq!(seen[2].method, "GET");
    assert!(seen[2].url.ends_with("/vectorSets/12"));
    assert_eq!(seen[3].method, "POST");
    assert!(seen[3].url.ends_with("/vectorSets/12/results"));

    // The submitted document mirrors the request tree with computed ct.
    let posted: serde_json::Value =
        serde_json::from_str(seen[3].body.as_deref().unwrap()).unwrap();
    assert_eq!(posted["vectorSetId"], 12);
    assert_eq!(posted["algorithm"], "ACVP-TDES-CBC");
    assert_eq!(posted["testGroups"][0]["tgId"], 1);
    assert_eq!(posted["testGroups"][0]["tests"][0]["tcId"], 1);
    assert_eq!(posted["testGroups"][0]["tests"][0]["ct"], "7766554433221100");
}

#[tokio::test]
async fn mid_session_token_expiry_recovers_transparently() {
    let transport = ScriptedTransport::new(vec![
        (200, r#"{"accessToken":"jwt-1"}"#),
        (401, r#"{"error":"JWT expired"}"#),
        (200, r#"{"accessToken":"jwt-2"}"#),
        (200, VECTOR_SET),
        (200, "{}"),
    ]);
    let mut session = session(&transport);

    session.login().await.unwrap();
    session
        .process_and_submit("/acvp/v1/testSessions/9/vectorSets/12")
        .await
        .unwrap();

    let seen = transport.seen();
    assert_eq!(seen.len(), 5);
    assert_eq!(seen[1].bearer.as_deref(), Some("jwt-1"));
    assert!(seen[2].url.ends_with("/login"));
    assert_eq!(seen[3].bearer.as_deref(), Some("jwt-2"));
    assert_eq!(seen[4].method, "POST");
}

#[tokio::test]
async fn unsupported_algorithm_fails_before_submission() {
    let transport = ScriptedTransport::new(vec![(
        200,
        r#"{"vsId":1,"algorithm":"ACVP-AES-GCM","testGroups":[]}"#,
    )]);
    let mut session = session(&transport);
    session
        .client_mut()
        .tokens_mut()
        .set_session("jwt".to_string())
        .unwrap();

    let err = session
        .process_and_submit("/acvp/v1/testSessions/9/vectorSets/99")
        .await
        .unwrap_err();
    assert!(matches!(err, AcvpError::UnsupportedOp(_)));
    // Only the GET went out; nothing was submitted.
    assert_eq!(transport.seen().len(), 1);
}

#[tokio::test]
async fn registration_without_vector_sets_is_malformed() {
    let transport = ScriptedTransport::new(vec![
        (200, r#"{"accessToken":"jwt-1"}"#),
        (200, r#"[{"acvVersion":"1.0"},{"url":"/acvp/v1/testSessions/9"}]"#),
    ]);
    let mut session = session(&transport);
    session.login().await.unwrap();

    let err = session.register(r#"[{"algorithms":[]}]"#).await.unwrap_err();
    assert!(matches!(err, AcvpError::MalformedJson(_)));
}

#[tokio::test]
async fn validation_submission_requires_session_url() {
    let transport = ScriptedTransport::new(vec![]);
    let mut session = session(&transport);

    let err = session
        .submit_for_validation(r#"[{"acvVersion":"1.0"}]"#)
        .await
        .unwrap_err();
    assert!(matches!(err, AcvpError::MissingArg(_)));
    assert!(transport.seen().is_empty());
}
