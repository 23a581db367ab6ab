//! The test-session loop: login, register, then fetch-compute-submit
//! for each vector set the server issued, in order.

use acv_engine::{handle_sym_vector_set, CapabilityRegistry, SymVectorSetResponse, TdesMode};
use acv_prelude::{AcvpError, Result};
use acv_transport::{
    user_agent_string, Credential, CredentialSource, HttpTransport, NetAction, NetClient,
    ReqwestTransport, ServerEndpoint,
};
use tracing::{debug, info};

use crate::context::ClientConfig;

/// One ACVP test session against one server.
pub struct TestSession<T: HttpTransport, C: CredentialSource> {
    client: NetClient<T, C>,
    registry: CapabilityRegistry,
    session_url: Option<String>,
}

impl<C: CredentialSource> TestSession<ReqwestTransport, C> {
    /// Build the TLS transport described by `config` and wrap a session
    /// around it.
    ///
    /// # Errors
    ///
    /// Returns `MissingArg` for an incomplete config and `TransportFail`
    /// when TLS material cannot be loaded.
    pub fn connect(config: &ClientConfig, credentials: C) -> Result<Self> {
        config.sanity_check()?;
        let agent = user_agent_string();
        let client = config.tls.build_client(&agent, config.timeout)?;
        Ok(Self::with_transport(ReqwestTransport::new(client), config, credentials))
    }
}

impl<T: HttpTransport, C: CredentialSource> TestSession<T, C> {
    /// Wrap a session around an existing transport.
    pub fn with_transport(transport: T, config: &ClientConfig, credentials: C) -> Self {
        let endpoint = ServerEndpoint {
            host: config.server.host.clone(),
            port: config.server.port,
        };
        Self {
            client: NetClient::new(transport, endpoint, &config.path_segment, credentials),
            registry: CapabilityRegistry::new(),
            session_url: None,
        }
    }

    /// The capability registry the dispatcher consults.
    pub fn registry_mut(&mut self) -> &mut CapabilityRegistry {
        &mut self.registry
    }

    /// The underlying network client.
    pub fn client_mut(&mut self) -> &mut NetClient<T, C> {
        &mut self.client
    }

    /// The session URL captured at registration, if any.
    #[must_use]
    pub fn session_url(&self) -> Option<&str> {
        self.session_url.as_deref()
    }

    /// Log in and store the issued bearer token.
    ///
    /// # Errors
    ///
    /// Propagates transport and authentication failures.
    pub async fn login(&mut self) -> Result<()> {
        self.client.login().await
    }

    /// Register the DUT's capabilities, returning the vector-set URLs
    /// the server issued. The session URL is captured for later
    /// validation submission.
    ///
    /// # Errors
    ///
    /// Propagates transport failures; a response without vector-set
    /// URLs is `MalformedJson`.
    pub async fn register(&mut self, registration: &str) -> Result<Vec<String>> {
        let url = self.client.api_url("testSessions")?;
        let response = self
            .client
            .execute(
                NetAction::PostRegistration { body: registration },
                &url,
                Credential::Session,
            )
            .await?;
        let value: serde_json::Value = serde_json::from_slice(&response.body)
            .map_err(|e| AcvpError::JsonError(format!("registration response: {e}")))?;

        let (session_url, vector_set_urls) = extract_session(&value);
        if let Some(session_url) = &session_url {
            info!(session_url, "test session registered");
        }
        self.session_url = session_url;
        if vector_set_urls.is_empty() {
            return Err(AcvpError::MalformedJson(
                "registration response carries no vectorSetUrls".to_string(),
            ));
        }
        Ok(vector_set_urls)
    }

    /// Fetch one vector set.
    ///
    /// # Errors
    ///
    /// Propagates transport failures; an undecodable body is `JsonError`.
    pub async fn fetch_vector_set(&mut self, vsid_url: &str) -> Result<serde_json::Value> {
        let url = self.client.url(vsid_url)?;
        let response = self
            .client
            .execute(NetAction::GetVectorSet, &url, Credential::Session)
            .await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| AcvpError::JsonError(format!("vector set body: {e}")))
    }

    /// Dispatch a fetched vector set to the handler for its algorithm.
    ///
    /// # Errors
    ///
    /// Returns `MalformedJson` when the document has no algorithm name
    /// and `UnsupportedOp` when no handler covers it.
    pub fn process_vector_set(&mut self, vs_json: &serde_json::Value) -> Result<SymVectorSetResponse> {
        let algorithm = vs_json
            .get("algorithm")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                AcvpError::MalformedJson("unable to parse 'algorithm' from JSON".to_string())
            })?;
        debug!(algorithm, "dispatching vector set");

        if TdesMode::from_algorithm(algorithm).is_some() {
            return handle_sym_vector_set(&self.registry, vs_json);
        }
        Err(AcvpError::UnsupportedOp(format!("unsupported algorithm: {algorithm}")))
    }

    /// Submit a computed response document to the results endpoint.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn submit_responses(
        &mut self,
        vsid_url: &str,
        response: &SymVectorSetResponse,
    ) -> Result<()> {
        let body = serde_json::to_string(response)
            .map_err(|e| AcvpError::JsonError(format!("response document: {e}")))?;
        let url = self.client.url(&format!("{vsid_url}/results"))?;
        self.client
            .execute(NetAction::PostVsResponse { body: &body }, &url, Credential::Session)
            .await?;
        Ok(())
    }

    /// Fetch, compute, and submit one vector set.
    ///
    /// # Errors
    ///
    /// Fails fast on the first transport, parsing, or DUT error.
    pub async fn process_and_submit(&mut self, vsid_url: &str) -> Result<()> {
        let vs_json = self.fetch_vector_set(vsid_url).await?;
        let response = self.process_vector_set(&vs_json)?;
        self.submit_responses(vsid_url, &response).await
    }

    /// Run the linear session loop over every issued vector set, in the
    /// order the server issued them.
    ///
    /// # Errors
    ///
    /// Stops at the first failing vector set.
    pub async fn run(&mut self, vector_set_urls: &[String]) -> Result<()> {
        for vsid_url in vector_set_urls {
            info!(vsid_url, "processing vector set");
            self.process_and_submit(vsid_url).await?;
        }
        Ok(())
    }

    /// Fetch the server's judgment for a session or vector set.
    ///
    /// # Errors
    ///
    /// Propagates transport failures; an undecodable body is `JsonError`.
    pub async fn results(&mut self, api_url: &str) -> Result<serde_json::Value> {
        let url = self.client.url(&format!("{api_url}/results"))?;
        let response = self
            .client
            .execute(NetAction::GetVsResult, &url, Credential::Session)
            .await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| AcvpError::JsonError(format!("results body: {e}")))
    }

    /// Fetch sample expected values for a vector set (debug aid).
    ///
    /// # Errors
    ///
    /// Propagates transport failures; an undecodable body is `JsonError`.
    pub async fn expected_results(&mut self, api_url: &str) -> Result<serde_json::Value> {
        let url = self.client.url(&format!("{api_url}/expected"))?;
        let response = self
            .client
            .execute(NetAction::GetSample, &url, Credential::Session)
            .await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| AcvpError::JsonError(format!("expected body: {e}")))
    }

    /// Submit the completed session for validation.
    ///
    /// # Errors
    ///
    /// Returns `MissingArg` when no session URL was captured at
    /// registration; otherwise propagates transport failures.
    pub async fn submit_for_validation(&mut self, body: &str) -> Result<()> {
        let session_url = self
            .session_url
            .clone()
            .ok_or_else(|| AcvpError::MissingArg("no session URL recorded".to_string()))?;
        let url = self.client.url(&session_url)?;
        self.client
            .execute(NetAction::PutValidation { body }, &url, Credential::Session)
            .await?;
        Ok(())
    }
}

/// Pull the session URL and vector-set URLs out of a registration
/// response, accepting both the bare object and the version-prefixed
/// array the server wraps it in.
fn extract_session(value: &serde_json::Value) -> (Option<String>, Vec<String>) {
    let objects: Vec<&serde_json::Value> = match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut session_url = None;
    let mut vector_set_urls = Vec::new();
    for obj in objects {
        if session_url.is_none() {
            if let Some(url) = obj.get("url").and_then(serde_json::Value::as_str) {
                session_url = Some(url.to_string());
            }
        }
        if let Some(urls) = obj.get("vectorSetUrls").and_then(serde_json::Value::as_array) {
            vector_set_urls.extend(
                urls.iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_string),
            );
        }
    }
    (session_url, vector_set_urls)
}
