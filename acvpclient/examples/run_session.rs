//! Drive a complete test session against a validation server.
//!
//! The crypto module here is a placeholder that echoes its input; a real
//! integration wires in the implementation under validation.
//!
//! ```sh
//! ACV_SERVER=acvts.example.org ACV_PASSWORD=... cargo run --example run_session
//! ```

use std::sync::Arc;

use acvpclient::{
    CipherDirection, ClientConfig, CredentialSource, CryptoModule, CryptoModuleError, Result,
    SymCipherTestCase, TdesMode, TestSession,
};

struct EnvCreds;

impl CredentialSource for EnvCreds {
    fn login_payload(&self) -> Result<String> {
        let password = std::env::var("ACV_PASSWORD").map_err(|_| {
            acvpclient::AcvpError::MissingArg("ACV_PASSWORD is not set".to_string())
        })?;
        Ok(serde_json::json!({ "password": password }).to_string())
    }
}

struct EchoTdes;

impl CryptoModule for EchoTdes {
    fn process(&self, tc: &mut SymCipherTestCase) -> std::result::Result<(), CryptoModuleError> {
        match tc.direction {
            CipherDirection::Encrypt => {
                let n = tc.pt_bytes().len();
                tc.ct[..n].copy_from_slice(&tc.pt[..n]);
                tc.ct_len = tc.pt_len;
            }
            CipherDirection::Decrypt => {
                let n = tc.ct_bytes().len();
                tc.pt[..n].copy_from_slice(&tc.ct[..n]);
                tc.pt_len = tc.ct_len;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    acvpclient::init_tracing()?;

    let host = std::env::var("ACV_SERVER").unwrap_or_else(|_| "acvts.example.org".to_string());
    let config = ClientConfig::new(&host, 443);

    let mut session = TestSession::connect(&config, EnvCreds)?;
    for mode in [
        TdesMode::Ecb,
        TdesMode::Cbc,
        TdesMode::Ofb,
        TdesMode::Cfb1,
        TdesMode::Cfb8,
        TdesMode::Cfb64,
    ] {
        session.registry_mut().register(mode, Arc::new(EchoTdes));
    }

    session.login().await?;
    let registration = serde_json::json!([
        { "acvVersion": "1.0" },
        { "algorithms": [
            { "algorithm": "ACVP-TDES-CBC", "revision": "1.0" }
        ]}
    ])
    .to_string();
    let vector_set_urls = session.register(&registration).await?;
    session.run(&vector_set_urls).await?;

    let session_url = session.session_url().map(str::to_string);
    if let Some(session_url) = session_url {
        let results = session.results(&session_url).await?;
        println!("{results:#}");
    }
    Ok(())
}
