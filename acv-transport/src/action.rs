//! The network-action coordinator.
//!
//! Every request the session makes goes through [`NetClient::execute`],
//! which validates the payload, dispatches the verb, inspects the
//! outcome, and applies the one recovery the protocol allows: a single
//! token refresh followed by a single replay when a non-login action
//! comes back with an expired JWT. Refresh never recurses; an expired
//! response to login itself is a protocol error.

use acv_prelude::{AcvpError, Result};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::{inspect, Credential, TokenStore};
use crate::http::{HttpResponse, HttpTransport, ServerEndpoint};

/// Supplies the login payload, fresh per call (TOTP-style credentials
/// change between invocations).
pub trait CredentialSource: Send + Sync {
    /// Render the JSON body for `POST /login`.
    ///
    /// # Errors
    ///
    /// Returns an error when credentials are unavailable.
    fn login_payload(&self) -> Result<String>;
}

/// One network action, tagged the way the session loop reasons about it.
#[derive(Debug, Clone, Copy)]
pub enum NetAction<'a> {
    /// Generic GET.
    Get,
    /// GET a vector set.
    GetVectorSet,
    /// GET a vector-set result.
    GetVsResult,
    /// GET sample expected values.
    GetSample,
    /// Generic POST.
    Post {
        /// JSON request body.
        body: &'a str,
    },
    /// POST the login payload.
    PostLogin {
        /// JSON request body.
        body: &'a str,
    },
    /// POST the test-session registration.
    PostRegistration {
        /// JSON request body.
        body: &'a str,
    },
    /// POST a vector-set response document.
    PostVsResponse {
        /// Serialized response document.
        body: &'a str,
    },
    /// Generic PUT.
    Put {
        /// JSON request body.
        body: &'a str,
    },
    /// PUT the test session for validation.
    PutValidation {
        /// JSON request body.
        body: &'a str,
    },
}

impl NetAction<'_> {
    /// Short label for status logging.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::GetVectorSet => "GET vector set",
            Self::GetVsResult => "GET vector set result",
            Self::GetSample => "GET vector set sample",
            Self::Post { .. } => "POST",
            Self::PostLogin { .. } => "POST login",
            Self::PostRegistration { .. } => "POST registration",
            Self::PostVsResponse { .. } => "POST response submission",
            Self::Put { .. } => "PUT",
            Self::PutValidation { .. } => "PUT testSession validation",
        }
    }

    const fn is_login(&self) -> bool {
        matches!(self, Self::PostLogin { .. })
    }

    const fn body(&self) -> Option<&str> {
        match *self {
            Self::Get | Self::GetVectorSet | Self::GetVsResult | Self::GetSample => None,
            Self::Post { body }
            | Self::PostLogin { body }
            | Self::PostRegistration { body }
            | Self::PostVsResponse { body }
            | Self::Put { body }
            | Self::PutValidation { body } => Some(body),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

/// The authenticated client a test session drives.
pub struct NetClient<T: HttpTransport, C: CredentialSource> {
    transport: T,
    endpoint: ServerEndpoint,
    path_segment: String,
    tokens: TokenStore,
    credentials: C,
}

impl<T: HttpTransport, C: CredentialSource> NetClient<T, C> {
    /// Assemble a client for one server endpoint.
    ///
    /// `path_segment` is the API prefix, e.g. `/acvp/v1`.
    pub fn new(transport: T, endpoint: ServerEndpoint, path_segment: &str, credentials: C) -> Self {
        Self {
            transport,
            endpoint,
            path_segment: path_segment.to_string(),
            tokens: TokenStore::new(),
            credentials,
        }
    }

    /// The token store, for callers that install single-use tokens.
    pub fn tokens_mut(&mut self) -> &mut TokenStore {
        &mut self.tokens
    }

    /// Render an absolute URL for a server-relative path (no API prefix).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` when the URL would exceed the cap.
    pub fn url(&self, path: &str) -> Result<String> {
        self.endpoint.url(path)
    }

    /// Render an absolute URL under the API prefix.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` when the URL would exceed the cap.
    pub fn api_url(&self, uri: &str) -> Result<String> {
        self.endpoint.url(&format!("{}/{uri}", self.path_segment))
    }

    /// Log in and store the issued session token.
    ///
    /// # Errors
    ///
    /// Propagates transport failures; a `JwtExpired` answer to login is
    /// itself a fatal protocol error.
    pub async fn login(&mut self) -> Result<()> {
        let payload = self.credentials.login_payload()?;
        let url = self.api_url("login")?;
        let response = Box::pin(self.execute(
            NetAction::PostLogin { body: &payload },
            &url,
            Credential::None,
        ))
        .await?;
        let login: LoginResponse = serde_json::from_slice(&response.body)
            .map_err(|e| AcvpError::JsonError(format!("login response: {e}")))?;
        self.tokens.set_session(login.access_token)
    }

    /// Execute one action against an absolute URL.
    ///
    /// # Errors
    ///
    /// Fails fast on transport errors; recovers an expired session token
    /// once per request as described on the module.
    pub async fn execute(
        &mut self,
        action: NetAction<'_>,
        url: &str,
        credential: Credential,
    ) -> Result<HttpResponse> {
        if action.body().is_some_and(str::is_empty) {
            error!("{} requires a non-empty payload", action.describe());
            return Err(AcvpError::NoData(format!(
                "{} requires a request body",
                action.describe()
            )));
        }

        if action.is_login() {
            // A login must never ride on a stale token.
            self.tokens.clear_session();
        }

        let response = self.dispatch(&action, url, credential).await?;
        match inspect(response.status, &response.body) {
            Ok(()) => {
                log_status(&action, &response, url);
                Ok(response)
            }
            Err(AcvpError::JwtExpired) if !action.is_login() => {
                warn!(
                    status = response.status,
                    "JWT authorization has timed out, refreshing session"
                );
                self.refresh().await?;
                let retry = self.dispatch(&action, url, Credential::Session).await?;
                log_status(&action, &retry, url);
                match inspect(retry.status, &retry.body) {
                    Ok(()) => Ok(retry),
                    Err(e) => {
                        error!(status = retry.status, "refreshed and retried, transport still failing");
                        Err(e)
                    }
                }
            }
            Err(AcvpError::JwtExpired) => {
                error!("login answered with an expired-token response");
                Err(AcvpError::JwtExpired)
            }
            Err(AcvpError::JwtInvalid) => {
                error!(status = response.status, "JWT invalid, not retrying");
                Err(AcvpError::JwtInvalid)
            }
            Err(e) => {
                log_status(&action, &response, url);
                Err(e)
            }
        }
    }

    async fn dispatch(
        &mut self,
        action: &NetAction<'_>,
        url: &str,
        credential: Credential,
    ) -> Result<HttpResponse> {
        let token = self.tokens.take(credential);
        let bearer = token.as_ref().map(|t| t.as_str());
        match action.body() {
            None => self.transport.get(url, bearer).await,
            Some(body) => match action {
                NetAction::Put { .. } | NetAction::PutValidation { .. } => {
                    self.transport.put(url, body, bearer).await
                }
                _ => self.transport.post(url, body, bearer).await,
            },
        }
    }

    /// Re-login and swap the stored session token. Called at most once
    /// per failed request, never from login itself.
    async fn refresh(&mut self) -> Result<()> {
        self.login().await.map_err(|e| {
            error!("JWT refresh failed");
            e
        })
    }
}

fn log_status(action: &NetAction<'_>, response: &HttpResponse, url: &str) {
    info!(
        status = response.status,
        url,
        "{}\nResp: {}",
        action.describe(),
        response.body_text()
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Seen {
        method: &'static str,
        url: String,
        body: Option<String>,
        bearer: Option<String>,
    }

    /// Plays back a scripted sequence of responses, recording requests.
    struct FakeTransport {
        script: Mutex<VecDeque<HttpResponse>>,
        seen: Mutex<Vec<Seen>>,
    }

    impl FakeTransport {
        fn new(script: Vec<HttpResponse>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, method: &'static str, url: &str, body: Option<&str>, bearer: Option<&str>) {
            self.seen.lock().expect("poisoned").push(Seen {
                method,
                url: url.to_string(),
                body: body.map(str::to_string),
                bearer: bearer.map(str::to_string),
            });
        }

        fn next(&self) -> HttpResponse {
            self.script
                .lock()
                .expect("poisoned")
                .pop_front()
                .expect("script exhausted: unexpected extra request")
        }
    }

    #[async_trait]
    impl HttpTransport for &FakeTransport {
        async fn get(&self, url: &str, bearer: Option<&str>) -> Result<HttpResponse> {
            self.record("GET", url, None, bearer);
            Ok(self.next())
        }

        async fn post(&self, url: &str, body: &str, bearer: Option<&str>) -> Result<HttpResponse> {
            self.record("POST", url, Some(body), bearer);
            Ok(self.next())
        }

        async fn put(&self, url: &str, body: &str, bearer: Option<&str>) -> Result<HttpResponse> {
            self.record("PUT", url, Some(body), bearer);
            Ok(self.next())
        }
    }

    struct StaticCreds;

    impl CredentialSource for StaticCreds {
        fn login_payload(&self) -> Result<String> {
            Ok(r#"{"password":"hunter2"}"#.to_string())
        }
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse { status: 200, body: body.as_bytes().to_vec() }
    }

    fn unauthorized(error: &str) -> HttpResponse {
        HttpResponse {
            status: 401,
            body: format!(r#"{{"error":"{error}"}}"#).into_bytes(),
        }
    }

    fn client(fake: &FakeTransport) -> NetClient<&FakeTransport, StaticCreds> {
        let endpoint = ServerEndpoint { host: "acvts.test".to_string(), port: 443 };
        NetClient::new(fake, endpoint, "/acvp/v1", StaticCreds)
    }

    #[tokio::test]
    async fn expired_jwt_refreshes_once_and_replays() {
        let fake = FakeTransport::new(vec![
            unauthorized("JWT expired"),
            ok(r#"{"accessToken":"fresh-token"}"#),
            ok("{}"),
        ]);
        let mut client = client(&fake);
        client.tokens_mut().set_session("stale-token".to_string()).unwrap();

        let url = client
            .url("/acvp/v1/testSessions/7/vectorSets/12/results")
            .unwrap();
        let body = r#"{"vectorSetId":12}"#;
        let response = client
            .execute(NetAction::PostVsResponse { body }, &url, Credential::Session)
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        let seen = fake.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3, "original, login, replay; nothing more");
        assert_eq!(seen[0].bearer.as_deref(), Some("stale-token"));
        assert!(seen[1].url.ends_with("/acvp/v1/login"));
        assert_eq!(seen[1].bearer, None);
        assert_eq!(seen[2].bearer.as_deref(), Some("fresh-token"));
        // The replayed request carries the identical body.
        assert_eq!(seen[2].body, seen[0].body);
        let result_posts = seen.iter().filter(|s| s.url.ends_with("/results")).count();
        assert_eq!(result_posts, 2, "exactly two POSTs of the results body");
    }

    #[tokio::test]
    async fn expired_login_is_fatal_with_no_refresh() {
        let fake = FakeTransport::new(vec![unauthorized("JWT expired")]);
        let mut client = client(&fake);

        let url = client.api_url("login").unwrap();
        let err = client
            .execute(
                NetAction::PostLogin { body: r#"{"password":"hunter2"}"# },
                &url,
                Credential::None,
            )
            .await
            .unwrap_err();
        assert_eq!(err, AcvpError::JwtExpired);
        assert_eq!(fake.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_jwt_is_fatal_with_no_refresh() {
        let fake = FakeTransport::new(vec![unauthorized(
            "JWT signature does not match locally computed signature",
        )]);
        let mut client = client(&fake);
        client.tokens_mut().set_session("bad".to_string()).unwrap();

        let url = client.api_url("testSessions").unwrap();
        let err = client
            .execute(NetAction::Get, &url, Credential::Session)
            .await
            .unwrap_err();
        assert_eq!(err, AcvpError::JwtInvalid);
        assert_eq!(fake.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_auth_failure_is_not_retried() {
        let fake = FakeTransport::new(vec![HttpResponse { status: 503, body: Vec::new() }]);
        let mut client = client(&fake);
        client.tokens_mut().set_session("token".to_string()).unwrap();

        let url = client.api_url("testSessions").unwrap();
        let err = client
            .execute(NetAction::Get, &url, Credential::Session)
            .await
            .unwrap_err();
        assert!(matches!(err, AcvpError::TransportFail(_)));
        assert_eq!(fake.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_stops_without_replay() {
        let fake = FakeTransport::new(vec![
            unauthorized("JWT expired"),
            HttpResponse { status: 500, body: Vec::new() },
        ]);
        let mut client = client(&fake);
        client.tokens_mut().set_session("stale".to_string()).unwrap();

        let url = client.api_url("testSessions").unwrap();
        let err = client
            .execute(NetAction::Get, &url, Credential::Session)
            .await
            .unwrap_err();
        assert!(matches!(err, AcvpError::TransportFail(_)));
        let seen = fake.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2, "original plus login, no replay after failed refresh");
    }

    #[tokio::test]
    async fn post_without_payload_is_rejected_before_any_request() {
        let fake = FakeTransport::new(vec![]);
        let mut client = client(&fake);
        let url = client.api_url("testSessions").unwrap();
        let err = client
            .execute(NetAction::Post { body: "" }, &url, Credential::Session)
            .await
            .unwrap_err();
        assert!(matches!(err, AcvpError::NoData(_)));
        assert!(fake.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn login_clears_previous_session_token() {
        let fake = FakeTransport::new(vec![ok(r#"{"accessToken":"issued"}"#)]);
        let mut client = client(&fake);
        client.tokens_mut().set_session("leftover".to_string()).unwrap();

        client.login().await.unwrap();
        let seen = fake.seen.lock().unwrap().clone();
        // The login POST itself must not carry the leftover token.
        assert_eq!(seen[0].bearer, None);
        assert_eq!(
            client.tokens_mut().take(Credential::Session).unwrap().as_str(),
            "issued"
        );
    }

    #[tokio::test]
    async fn single_use_credential_rides_one_request() {
        let fake = FakeTransport::new(vec![ok("{}"), ok("{}")]);
        let mut client = client(&fake);
        client.tokens_mut().set_session("session".to_string()).unwrap();
        client.tokens_mut().set_single_use("one-shot".to_string()).unwrap();

        let url = client.api_url("large").unwrap();
        client
            .execute(NetAction::Get, &url, Credential::SingleUse)
            .await
            .unwrap();
        client
            .execute(NetAction::Get, &url, Credential::SingleUse)
            .await
            .unwrap();

        let seen = fake.seen.lock().unwrap().clone();
        assert_eq!(seen[0].bearer.as_deref(), Some("one-shot"));
        assert_eq!(seen[1].bearer, None, "single-use slot already consumed");
    }

    #[tokio::test]
    async fn get_vector_set_uses_get_verb() {
        let fake = FakeTransport::new(vec![ok(r#"{"vsId":1}"#)]);
        let mut client = client(&fake);
        client.tokens_mut().set_session("token".to_string()).unwrap();

        let url = client.url("/acvp/v1/testSessions/7/vectorSets/12").unwrap();
        client
            .execute(NetAction::GetVectorSet, &url, Credential::Session)
            .await
            .unwrap();
        let seen = fake.seen.lock().unwrap().clone();
        assert_eq!(seen[0].method, "GET");
        assert_eq!(seen[0].body, None);
    }

    #[tokio::test]
    async fn put_validation_uses_put_verb() {
        let fake = FakeTransport::new(vec![ok("{}")]);
        let mut client = client(&fake);
        client.tokens_mut().set_session("token".to_string()).unwrap();

        let url = client.url("/acvp/v1/testSessions/7").unwrap();
        client
            .execute(
                NetAction::PutValidation { body: r#"[{"acvVersion":"1.0"}]"# },
                &url,
                Credential::Session,
            )
            .await
            .unwrap();
        assert_eq!(fake.seen.lock().unwrap()[0].method, "PUT");
    }
}
