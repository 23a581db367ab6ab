//! HTTP verbs and bounded response-body accumulation.
//!
//! The three verbs the protocol needs, behind a trait so the action
//! coordinator can be driven by a scripted transport in tests. Response
//! bodies stream into a buffer bounded by [`HTTP_BODY_MAX`]; an
//! oversize response fails the call and no partial body is surfaced.

use acv_prelude::{AcvpError, Result, ATTR_URL_MAX, HTTP_BODY_MAX};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in query-string values: everything except the
/// URL-safe set curl leaves alone.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Host and port of the validation server.
#[derive(Debug, Clone)]
pub struct ServerEndpoint {
    /// Server hostname.
    pub host: String,
    /// Server TCP port.
    pub port: u16,
}

impl ServerEndpoint {
    /// Render an absolute `https://` URL for a server-relative path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` when the assembled URL exceeds the URL cap.
    pub fn url(&self, path: &str) -> Result<String> {
        let url = format!("https://{}:{}{}", self.host, self.port, path);
        if url.len() > ATTR_URL_MAX {
            return Err(AcvpError::InvalidArg(format!(
                "url exceeds maximum length ({ATTR_URL_MAX})"
            )));
        }
        Ok(url)
    }
}

/// Append percent-encoded query parameters to a URL.
///
/// # Errors
///
/// Returns `InvalidArg` when the assembled URL exceeds the URL cap.
pub fn build_query_url(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = base.to_string();
    for (i, (key, value)) in params.iter().enumerate() {
        let sep = if i == 0 { '?' } else { '&' };
        let escaped = utf8_percent_encode(value, QUERY_ESCAPE);
        url.push(sep);
        url.push_str(key);
        url.push('=');
        url.push_str(&escaped.to_string());
    }
    if url.len() > ATTR_URL_MAX {
        return Err(AcvpError::InvalidArg(format!(
            "url exceeds maximum length ({ATTR_URL_MAX})"
        )));
    }
    Ok(url)
}

/// A completed HTTP exchange: status code plus the full body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, bounded by [`HTTP_BODY_MAX`].
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// The body as UTF-8, lossily converted for logging.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The verb set the session needs, abstracted for test doubles.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// HTTP GET. `bearer` attaches an `Authorization: Bearer` header.
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<HttpResponse>;
    /// HTTP POST with a JSON body.
    async fn post(&self, url: &str, body: &str, bearer: Option<&str>) -> Result<HttpResponse>;
    /// HTTP PUT with a JSON body.
    async fn put(&self, url: &str, body: &str, bearer: Option<&str>) -> Result<HttpResponse>;
}

/// Production transport backed by a TLS-configured reqwest client.
pub struct ReqwestTransport {
    client: reqwest::Client,
    body_max: usize,
}

impl ReqwestTransport {
    /// Wrap a configured client with the default body cap.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, body_max: HTTP_BODY_MAX }
    }

    /// Override the response-body cap.
    #[must_use]
    pub fn with_body_max(mut self, body_max: usize) -> Self {
        self.body_max = body_max;
        self
    }

    async fn run(&self, request: reqwest::RequestBuilder) -> Result<HttpResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| AcvpError::TransportFail(format!("request failed: {e}")))?;
        let status = response.status().as_u16();
        let body = read_bounded(response, self.body_max).await?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.run(request).await
    }

    async fn post(&self, url: &str, body: &str, bearer: Option<&str>) -> Result<HttpResponse> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.run(request).await
    }

    async fn put(&self, url: &str, body: &str, bearer: Option<&str>) -> Result<HttpResponse> {
        let mut request = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.run(request).await
    }
}

/// Stream a response body into a bounded buffer.
async fn read_bounded(mut response: reqwest::Response, cap: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AcvpError::TransportFail(format!("failed to read response body: {e}")))?
    {
        append_bounded(&mut buf, &chunk, cap)?;
    }
    Ok(buf)
}

/// Append a chunk, failing the whole body once the cap would be crossed.
fn append_bounded(buf: &mut Vec<u8>, chunk: &[u8], cap: usize) -> Result<()> {
    if buf.len().saturating_add(chunk.len()) > cap {
        tracing::error!("server response is too large (cap {cap} bytes)");
        buf.clear();
        return Err(AcvpError::TransportFail(format!(
            "server response exceeds {cap}-byte buffer"
        )));
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_renders_scheme_host_port_path() {
        let endpoint = ServerEndpoint { host: "acvts.example.org".to_string(), port: 443 };
        let url = endpoint.url("/acvp/v1/login").unwrap();
        assert_eq!(url, "https://acvts.example.org:443/acvp/v1/login");
    }

    #[test]
    fn endpoint_url_respects_cap() {
        let endpoint = ServerEndpoint { host: "h".to_string(), port: 443 };
        let long_path = format!("/{}", "x".repeat(ATTR_URL_MAX));
        assert!(endpoint.url(&long_path).is_err());
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let url = build_query_url(
            "https://h:443/acvp/v1/validations",
            &[("name", "Acme Corp/HSM"), ("limit", "25")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://h:443/acvp/v1/validations?name=Acme%20Corp%2FHSM&limit=25"
        );
    }

    #[test]
    fn url_safe_characters_pass_through() {
        let url = build_query_url("https://h:443/x", &[("v", "a-b_c.d~e")]).unwrap();
        assert_eq!(url, "https://h:443/x?v=a-b_c.d~e");
    }

    #[test]
    fn query_url_respects_cap() {
        let big = "v".repeat(ATTR_URL_MAX);
        assert!(build_query_url("https://h:443/x", &[("k", big.as_str())]).is_err());
    }

    #[test]
    fn append_within_cap_accumulates() {
        let mut buf = Vec::new();
        append_bounded(&mut buf, &[1, 2, 3], 8).unwrap();
        append_bounded(&mut buf, &[4, 5], 8).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn oversize_body_fails_and_discards_partial_data() {
        let mut buf = Vec::new();
        let chunk = vec![0u8; 600 * 1024];
        append_bounded(&mut buf, &chunk, HTTP_BODY_MAX).unwrap();
        let err = append_bounded(&mut buf, &chunk, HTTP_BODY_MAX).unwrap_err();
        assert!(matches!(err, AcvpError::TransportFail(_)));
        assert!(buf.is_empty(), "partial body must not be surfaced");
    }

    #[test]
    fn exact_cap_is_accepted() {
        let mut buf = Vec::new();
        append_bounded(&mut buf, &vec![0u8; HTTP_BODY_MAX], HTTP_BODY_MAX).unwrap();
        assert_eq!(buf.len(), HTTP_BODY_MAX);
    }
}
