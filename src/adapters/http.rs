use crate::config::{ClientConfig, OperatingMode};
use crate::core::classifier::{classify, RaisedFailure};
use crate::utils::error::{FailureClassification, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    fn as_reqwest(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
        }
    }
}

/// One network operation. Immutable once handed to the executor.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: HttpMethod,
    /// Path relative to the configured base URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Overrides the process-wide timeout when set.
    pub timeout_ms: Option<u64>,
}

impl RequestConfig {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout_ms: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Issues a single network operation raced against a timer.
pub struct RequestExecutor {
    client: Client,
    base_url: String,
    default_timeout: Duration,
    mode: OperatingMode,
    bearer_token: RwLock<Option<String>>,
    dispatched: AtomicU64,
}

impl RequestExecutor {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        // No client-level timeout: expiry is decided by the race in `execute`.
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_timeout: config.timeout(),
            mode: config.mode,
            bearer_token: RwLock::new(None),
            dispatched: AtomicU64::new(0),
        })
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Number of network operations started since construction.
    pub fn dispatched_requests(&self) -> u64 {
        self.dispatched.load(Ordering::SeqCst)
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.bearer_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_bearer_token(&self, token: Option<String>) {
        let mut slot = self
            .bearer_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = token;
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn execute(
        &self,
        request: &RequestConfig,
    ) -> std::result::Result<serde_json::Value, FailureClassification> {
        if self.mode.is_demo() {
            tracing::debug!("🧪 Demo mode: {} {} short-circuited", request.method, request.path);
            return Err(classify(RaisedFailure::ShortCircuit));
        }

        let timeout = request
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);
        let builder = self.build_request(request);

        self.dispatched.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        tracing::debug!("📡 {} {} (timeout {:?})", request.method, request.path, timeout);

        let exchange = async {
            let response = builder
                .send()
                .await
                .map_err(|e| classify(RaisedFailure::Transport(&e)))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| classify(RaisedFailure::Transport(&e)))?;

            if !status.is_success() {
                return Err(classify(RaisedFailure::Status {
                    status: status.as_u16(),
                    body: &body,
                }));
            }
            decode_payload(status.as_u16(), &body)
        };

        // The losing side is dropped: an expired timer aborts the in-flight
        // request, a settled request discards the timer.
        let outcome = tokio::select! {
            outcome = exchange => outcome,
            _ = tokio::time::sleep(timeout) => Err(classify(RaisedFailure::Elapsed)),
        };

        match &outcome {
            Ok(_) => tracing::debug!(
                "📡 {} {} settled in {:?}",
                request.method,
                request.path,
                started.elapsed()
            ),
            Err(failure) => tracing::debug!(
                "📡 {} {} failed after {:?}: {:?}",
                request.method,
                request.path,
                started.elapsed(),
                failure
            ),
        }
        outcome
    }

    fn build_request(&self, request: &RequestConfig) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), self.url_for(&request.path))
            .header(ACCEPT, "application/json");

        if let Some(token) = self.bearer_token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder
    }
}

/// Turns a 2xx body into the raw payload.
///
/// Empty bodies become `null`. An object with `success: false` is a rejection
/// whatever else it carries; `{success: true, data}` is unwrapped to `data`.
fn decode_payload(
    status: u16,
    body: &str,
) -> std::result::Result<serde_json::Value, FailureClassification> {
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| classify(RaisedFailure::Malformed(format!("invalid JSON body: {}", e))))?;

    match value {
        serde_json::Value::Object(obj)
            if obj.get("success").and_then(|s| s.as_bool()) == Some(false) =>
        {
            let message = obj
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            Err(FailureClassification::HttpError { status, message })
        }
        serde_json::Value::Object(mut obj)
            if obj.get("success").and_then(|s| s.as_bool()) == Some(true)
                && obj.contains_key("data") =>
        {
            Ok(obj.remove("data").unwrap_or(serde_json::Value::Null))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_plain_and_empty_bodies() {
        assert_eq!(decode_payload(200, "").unwrap(), serde_json::Value::Null);
        assert_eq!(decode_payload(200, "[1,2]").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_decode_unwraps_envelope() {
        let body = r#"{"success": true, "data": {"id": 7}, "message": null}"#;
        assert_eq!(decode_payload(200, body).unwrap(), json!({"id": 7}));

        let rejected = r#"{"success": false, "data": null, "message": "Cupo lleno"}"#;
        assert_eq!(
            decode_payload(200, rejected).unwrap_err(),
            FailureClassification::HttpError {
                status: 200,
                message: Some("Cupo lleno".to_string())
            }
        );
    }

    #[test]
    fn test_decode_rejection_without_data_key() {
        let rejected = r#"{"success": false, "message": "Cupo lleno"}"#;
        assert_eq!(
            decode_payload(200, rejected).unwrap_err(),
            FailureClassification::HttpError {
                status: 200,
                message: Some("Cupo lleno".to_string())
            }
        );

        // A bare `success: true` without `data` is passed through untouched.
        let plain = r#"{"success": true}"#;
        assert_eq!(decode_payload(200, plain).unwrap(), json!({"success": true}));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode_payload(200, "<html>"),
            Err(FailureClassification::Unknown(_))
        ));
    }

    #[test]
    fn test_url_joining() {
        let executor =
            RequestExecutor::new(&ClientConfig::live("http://localhost:3000/api/")).unwrap();
        assert_eq!(executor.url_for("/courses"), "http://localhost:3000/api/courses");
        assert_eq!(executor.url_for("grades"), "http://localhost:3000/api/grades");
    }

    #[tokio::test]
    async fn test_demo_mode_short_circuits_without_dispatch() {
        let executor = RequestExecutor::new(&ClientConfig::demo()).unwrap();
        let outcome = executor.execute(&RequestConfig::get("/courses")).await;

        assert_eq!(outcome.unwrap_err(), FailureClassification::DemoModeShortCircuit);
        assert_eq!(executor.dispatched_requests(), 0);
    }

    #[tokio::test]
    async fn test_per_request_timeout_and_headers() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/slow").header("x-client", "aula");
                then.status(200).delay(Duration::from_secs(2));
            })
            .await;

        let executor = RequestExecutor::new(&ClientConfig::live(server.url("/api"))).unwrap();
        let request = RequestConfig::get("/slow")
            .header("x-client", "aula")
            .timeout_ms(100);

        let started = Instant::now();
        let outcome = executor.execute(&request).await;

        assert_eq!(outcome.unwrap_err(), FailureClassification::Timeout);
        assert!(started.elapsed() < Duration::from_millis(100 + 250));
        assert_eq!(executor.dispatched_requests(), 1);
    }

    #[test]
    fn test_bearer_token_slot() {
        let executor = RequestExecutor::new(&ClientConfig::default()).unwrap();
        assert_eq!(executor.bearer_token(), None);
        executor.set_bearer_token(Some("abc".to_string()));
        assert_eq!(executor.bearer_token().as_deref(), Some("abc"));
    }
}
