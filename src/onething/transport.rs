//! HTTP request transport for the OneThing API.
//!
//! The transport issues authenticated calls against a base URL, applies the
//! timeout and retry policy, and decodes the `{code, msg, data}` envelope.
//! It does not interpret the envelope code; that is the client's job.

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

use crate::error::{ConfigError, TransportError};

use super::types::Envelope;

/// Default OneThing API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api-lab.onethingai.com";

/// Default number of attempts per call.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default base delay of the linear backoff.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Immutable transport configuration.
#[derive(Clone)]
pub struct TransportSettings {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Total attempts per call.
    pub max_retries: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Base delay; the wait after attempt `k` is `retry_delay * k`.
    pub retry_delay: Duration,
}

impl TransportSettings {
    /// Creates settings with the default base URL and retry policy.
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_key: api_key.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Sets the total number of attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the backoff base delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

impl std::fmt::Debug for TransportSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("max_retries", &self.max_retries)
            .field("timeout", &self.timeout)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

/// Per-call overrides of the transport defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Per-attempt timeout for this call.
    pub timeout: Option<Duration>,
    /// Total attempts for this call.
    pub max_retries: Option<u32>,
}

impl CallOptions {
    /// Overrides the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the attempt count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// Executes API calls and returns the decoded envelope.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` to `endpoint`.
    ///
    /// GET requests carry the request fields in the query string, other
    /// methods send them as a JSON body.
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        request: Option<Value>,
        options: CallOptions,
    ) -> Result<Envelope, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client.
    client: Client,
    /// Transport configuration.
    settings: TransportSettings,
}

impl HttpTransport {
    /// Creates a transport from its settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(mut settings: TransportSettings) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ConfigError::HttpClient {
                message: e.to_string(),
            })?;

        settings.base_url = settings.base_url.trim_end_matches('/').to_string();

        Ok(Self { client, settings })
    }

    /// Returns the transport configuration.
    #[must_use]
    pub const fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    /// Builds the full URL of an endpoint.
    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.settings.base_url, endpoint.trim_start_matches('/'))
    }

    /// Performs a single attempt.
    async fn execute_once(
        &self,
        method: &Method,
        url: &str,
        request: Option<&Value>,
        timeout: Duration,
        attempt: u32,
    ) -> Result<Envelope, TransportError> {
        trace!("{method} {url} (attempt {attempt})");

        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(timeout);

        if let Some(request) = request {
            builder = if *method == Method::GET {
                builder.query(&query_pairs(request)?)
            } else {
                builder.json(request)
            };
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_send_error(&e, attempt))?;

        let status = response.status();

        if status.is_server_error() {
            return Err(TransportError::ServerError {
                status: status.as_u16(),
                attempts: attempt,
            });
        }

        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::ClientStatus {
                status: status.as_u16(),
                body,
            });
        }

        if !status.is_success() {
            return Err(TransportError::request(format!("unexpected HTTP status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_send_error(&e, attempt))?;

        serde_json::from_str(&body).map_err(|e| TransportError::decode(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        request: Option<Value>,
        options: CallOptions,
    ) -> Result<Envelope, TransportError> {
        let url = self.url(endpoint);
        let timeout = options.timeout.unwrap_or(self.settings.timeout);
        let max_attempts = options
            .max_retries
            .unwrap_or(self.settings.max_retries)
            .max(1);

        debug!("{method} {url}");

        let mut attempt = 0;
        loop {
            attempt += 1;

            match self
                .execute_once(&method, &url, request.as_ref(), timeout, attempt)
                .await
            {
                Ok(envelope) => return Ok(envelope),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!("{method} {url}: {e}, retrying ({attempt}/{max_attempts})");
                    tokio::time::sleep(backoff_delay(self.settings.retry_delay, attempt)).await;
                }
                Err(e) => {
                    error!("{method} {url} failed: {e}");
                    return Err(e);
                }
            }
        }
    }
}

/// Wait after failed attempt `attempt`, growing linearly from `base`.
///
/// Saturates at `Duration::MAX` instead of overflowing.
const fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

/// Maps a `reqwest` failure to a transport error.
fn classify_send_error(error: &reqwest::Error, attempt: u32) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout { attempts: attempt }
    } else {
        TransportError::request(error.to_string())
    }
}

/// Encodes the top-level fields of a request object as query pairs.
///
/// `null` fields are skipped; nested arrays and objects cannot be encoded.
fn query_pairs(request: &Value) -> Result<Vec<(String, String)>, TransportError> {
    let Value::Object(fields) = request else {
        return Err(TransportError::request("query request must be a JSON object"));
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        let encoded = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(TransportError::request(format!(
                    "field '{key}' cannot be encoded in a query string"
                )));
            }
        };
        pairs.push((key.clone(), encoded));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> HttpTransport {
        let settings = TransportSettings::new("test-key")
            .with_base_url(&server.uri())
            .with_timeout(Duration::from_millis(200))
            .with_retry_delay(Duration::from_millis(1));
        HttpTransport::new(settings).unwrap()
    }

    fn ok_envelope() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "msg": "success", "data": {} }))
    }

    #[tokio::test]
    async fn test_get_encodes_query_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/app"))
            .and(query_param("page", "1"))
            .and(query_param("pageSize", "10"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("content-type", "application/json"))
            .respond_with(ok_envelope())
            .expect(1)
            .mount(&server)
            .await;

        let envelope = transport(&server)
            .execute(
                Method::GET,
                "api/v2/app",
                Some(json!({ "page": 1, "pageSize": 10, "appId": null })),
                CallOptions::default(),
            )
            .await
            .unwrap();

        assert!(envelope.is_success());
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        let body = json!({ "appImageId": "img-1", "gpuNum": 1 });

        Mock::given(method("POST"))
            .and(path("/api/v2/app"))
            .and(body_json(&body))
            .respond_with(ok_envelope())
            .expect(1)
            .mount(&server)
            .await;

        let result = transport(&server)
            .execute(Method::POST, "api/v2/app", Some(body), CallOptions::default())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_timeouts_exhaust_retries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/account/wallet/detail"))
            .respond_with(ok_envelope().set_delay(Duration::from_secs(2)))
            .expect(3)
            .mount(&server)
            .await;

        let err = transport(&server)
            .execute(
                Method::GET,
                "api/v1/account/wallet/detail",
                None,
                CallOptions::default().with_timeout(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Timeout { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/resources"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such route"))
            .expect(1)
            .mount(&server)
            .await;

        let err = transport(&server)
            .execute(Method::GET, "api/v2/resources", None, CallOptions::default())
            .await
            .unwrap_err();

        match err {
            TransportError::ClientStatus { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such route");
            }
            other => panic!("expected client status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v1/app/abc"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let err = transport(&server)
            .execute(Method::DELETE, "api/v1/app/abc", None, CallOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::ServerError { status: 502, attempts: 3 }));
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/app/operate/boot/abc"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/app/operate/boot/abc"))
            .respond_with(ok_envelope())
            .expect(1)
            .mount(&server)
            .await;

        let result = transport(&server)
            .execute(Method::PUT, "api/v1/app/operate/boot/abc", None, CallOptions::default())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_per_call_retry_override() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = transport(&server)
            .execute(
                Method::GET,
                "api/v2/app",
                None,
                CallOptions::default().with_max_retries(1),
            )
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), Some(1));
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = transport(&server)
            .execute(Method::GET, "api/v2/app", None, CallOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Decode { .. }));
    }

    #[test]
    fn test_query_pairs() {
        let pairs =
            query_pairs(&json!({ "appImageName": "torch", "regionId": 3, "gpuType": null }))
                .unwrap();
        assert!(pairs.contains(&(String::from("appImageName"), String::from("torch"))));
        assert!(pairs.contains(&(String::from("regionId"), String::from("3"))));
        assert_eq!(pairs.len(), 2);

        assert!(query_pairs(&json!({ "customPort": [1, 2] })).is_err());
        assert!(query_pairs(&json!([1])).is_err());
    }

    #[test]
    fn test_backoff_grows_linearly() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(750));
        assert_eq!(backoff_delay(Duration::ZERO, 5), Duration::ZERO);
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(backoff_delay(Duration::MAX, 2), Duration::MAX);
        assert_eq!(
            backoff_delay(Duration::from_secs(u64::MAX / 2), 3),
            Duration::MAX
        );
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let rendered = format!("{:?}", TransportSettings::new("secret-key"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let settings = TransportSettings::new("k").with_base_url("https://example.com/");
        let transport = HttpTransport::new(settings).unwrap();
        assert_eq!(transport.url("/api/v2/app"), "https://example.com/api/v2/app");
    }
}
