//! Typed HTTP transport with bounded latency.
//!
//! Every call gets exactly one attempt, one deterministic timeout, and one
//! terminal classification. Callers that want retries re-invoke the
//! operation. Expected failures come back as data, not panics: the four
//! error kinds are mutually exclusive tags on one result type.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::session_manager::TokenProvider;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SNIPPET_LIMIT: usize = 256;

/// Terminal classification of a failed call.
///
/// `Display` carries the operator-facing diagnostic; `user_message` is the
/// short text safe to put in front of a user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The timer fired before the transport completed.
    #[error("Request timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body did not match its declared shape.
    #[error("Failed to parse response (status {status}): {snippet}")]
    Parse { status: u16, snippet: String },

    /// Transport-level failure before a response was received.
    #[error("Network error: {message}")]
    Network { message: String },
}

impl ApiError {
    /// Short, user-facing text. Server-supplied for HTTP errors, generic
    /// for everything else; never the raw diagnostic.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Timeout { .. } => "The request timed out. Please try again.".to_string(),
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Parse { .. } => {
                "Received an unexpected response from the server.".to_string()
            }
            ApiError::Network { .. } => "Could not reach the server.".to_string(),
        }
    }

    /// Raw HTTP status for programmatic branching, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::Parse { status, .. } => Some(*status),
            ApiError::Timeout { .. } | ApiError::Network { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }
}

/// Classification of a successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBody<T> {
    /// A JSON body parsed into the requested type.
    Json(T),
    /// A non-JSON body, returned as raw text.
    Text(String),
    /// No content. An explicit value, never an error.
    Empty,
}

impl<T> ApiBody<T> {
    /// The parsed JSON value, if this was a JSON body.
    pub fn into_json(self) -> Option<T> {
        match self {
            ApiBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// One call's worth of request parameters, discarded after completion.
struct RequestDescriptor {
    method: Method,
    endpoint: String,
    body: Option<serde_json::Value>,
    timeout: Duration,
}

/// The shape servers use for structured error bodies.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Typed HTTP client with per-call timeout and uniform error
/// classification. Cheap to clone.
#[derive(Clone)]
pub struct ResilientClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    default_timeout: Duration,
}

impl ResilientClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            tokens,
            default_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Overrides the default per-request timeout.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiBody<T>, ApiError> {
        self.request(Method::GET, endpoint, None, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiBody<T>, ApiError> {
        self.request(Method::POST, endpoint, Some(encode_body(body)?), None)
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiBody<T>, ApiError> {
        self.request(Method::PUT, endpoint, Some(encode_body(body)?), None)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<ApiBody<T>, ApiError> {
        self.request(Method::DELETE, endpoint, None, None).await
    }

    /// Like `get`, with a per-call timeout override.
    pub async fn get_with_timeout<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<ApiBody<T>, ApiError> {
        self.request(Method::GET, endpoint, None, Some(timeout)).await
    }

    /// Like `post`, with a per-call timeout override.
    pub async fn post_with_timeout<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<ApiBody<T>, ApiError> {
        self.request(Method::POST, endpoint, Some(encode_body(body)?), Some(timeout))
            .await
    }

    /// Like `put`, with a per-call timeout override.
    pub async fn put_with_timeout<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<ApiBody<T>, ApiError> {
        self.request(Method::PUT, endpoint, Some(encode_body(body)?), Some(timeout))
            .await
    }

    /// Like `delete`, with a per-call timeout override.
    pub async fn delete_with_timeout<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<ApiBody<T>, ApiError> {
        self.request(Method::DELETE, endpoint, None, Some(timeout))
            .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
        timeout: Option<Duration>,
    ) -> Result<ApiBody<T>, ApiError> {
        let descriptor = RequestDescriptor {
            method,
            endpoint: endpoint.to_string(),
            body,
            timeout: timeout.unwrap_or(self.default_timeout),
        };
        self.execute(descriptor).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<ApiBody<T>, ApiError> {
        let url = format!("{}{}", self.base_url, descriptor.endpoint);

        let mut builder = self.http.request(descriptor.method.clone(), &url);
        if let Some(token) = self.tokens.bearer_token().await {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &descriptor.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }

        // One timer bounds the whole call: connect, response headers, and
        // body read. The guard stops it on every exit path.
        let cancel = CancellationToken::new();
        let _timer = TimerGuard::start(cancel.clone(), descriptor.timeout);

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                log::warn!(
                    "{} {} timed out after {:?}",
                    descriptor.method, url, descriptor.timeout
                );
                return Err(ApiError::Timeout { elapsed: descriptor.timeout });
            }
            sent = builder.send() => sent.map_err(|err| {
                log::warn!("{} {} failed before a response: {}", descriptor.method, url, err);
                ApiError::Network {
                    message: err.to_string(),
                }
            })?,
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let text = tokio::select! {
            _ = cancel.cancelled() => {
                log::warn!(
                    "{} {} body read timed out after {:?}",
                    descriptor.method, url, descriptor.timeout
                );
                return Err(ApiError::Timeout { elapsed: descriptor.timeout });
            }
            read = response.text() => read.map_err(|err| {
                log::warn!("{} {} body read failed: {}", descriptor.method, url, err);
                ApiError::Network {
                    message: err.to_string(),
                }
            })?,
        };

        if !status.is_success() {
            let err = classify_failure(status, &text);
            log::warn!(
                "{} {} -> {} ({}); body: {}",
                descriptor.method,
                url,
                status,
                err,
                snippet(&text)
            );
            return Err(err);
        }

        classify_success(status, content_type.as_deref(), text).inspect_err(|err| {
            log::warn!("{} {} -> {}: {}", descriptor.method, url, status, err);
        })
    }
}

/// Serializes a request body, or classifies the failure.
fn encode_body<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    // Still on the caller's side of the wire, so this counts as a
    // transport failure before a response.
    serde_json::to_value(body).map_err(|err| ApiError::Network {
        message: format!("Failed to encode request body: {}", err),
    })
}

/// Builds the `Http` classification for a non-2xx response.
///
/// A JSON body with a `message` field supplies the user-facing text;
/// anything else falls back to a generic message. The numeric status is
/// preserved either way.
fn classify_failure(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.message)
        .unwrap_or_else(|_| format!("Request failed with status {}", status.as_u16()));

    ApiError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Classifies a 2xx response body by its declared content type.
fn classify_success<T: DeserializeOwned>(
    status: StatusCode,
    content_type: Option<&str>,
    text: String,
) -> Result<ApiBody<T>, ApiError> {
    if status == StatusCode::NO_CONTENT || text.is_empty() {
        return Ok(ApiBody::Empty);
    }

    let is_json = content_type
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&text)
            .map(ApiBody::Json)
            .map_err(|_| ApiError::Parse {
                status: status.as_u16(),
                snippet: snippet(&text),
            })
    } else {
        Ok(ApiBody::Text(text))
    }
}

/// Truncates a body for diagnostics.
fn snippet(text: &str) -> String {
    if text.len() <= SNIPPET_LIMIT {
        return text.to_string();
    }
    let mut end = SNIPPET_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Aborts the timeout timer task when the call leaves scope, on every exit
/// path: success, HTTP failure, parse failure, or cancellation itself.
struct TimerGuard {
    handle: JoinHandle<()>,
}

impl TimerGuard {
    fn start(cancel: CancellationToken, after: Duration) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            cancel.cancel();
        });
        Self { handle }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure_extracts_json_message() {
        let err = classify_failure(StatusCode::BAD_REQUEST, r#"{"message": "invalid input"}"#);
        assert_eq!(
            err,
            ApiError::Http {
                status: 400,
                message: "invalid input".to_string()
            }
        );
        assert_eq!(err.user_message(), "invalid input");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_classify_failure_falls_back_on_non_json_body() {
        for body in ["", "<html>oops</html>", "{\"detail\": \"other shape\"}"] {
            let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, body);
            assert_eq!(err.status(), Some(500));
            assert_eq!(err.user_message(), "Request failed with status 500");
        }
    }

    #[test]
    fn test_classify_success_empty_body() {
        let body: ApiBody<serde_json::Value> =
            classify_success(StatusCode::OK, Some("application/json"), String::new()).unwrap();
        assert_eq!(body, ApiBody::Empty);

        let body: ApiBody<serde_json::Value> =
            classify_success(StatusCode::NO_CONTENT, None, String::new()).unwrap();
        assert_eq!(body, ApiBody::Empty);
    }

    #[test]
    fn test_classify_success_json_body() {
        let body: ApiBody<serde_json::Value> = classify_success(
            StatusCode::OK,
            Some("application/json; charset=utf-8"),
            r#"{"ok": true}"#.to_string(),
        )
        .unwrap();
        assert_eq!(body.into_json().unwrap()["ok"], true);
    }

    #[test]
    fn test_classify_success_invalid_json_is_parse_error() {
        let result: Result<ApiBody<serde_json::Value>, _> = classify_success(
            StatusCode::OK,
            Some("application/json"),
            "not json at all".to_string(),
        );
        let err = result.unwrap_err();
        assert_eq!(
            err,
            ApiError::Parse {
                status: 200,
                snippet: "not json at all".to_string()
            }
        );
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn test_classify_success_text_body() {
        let body: ApiBody<serde_json::Value> = classify_success(
            StatusCode::OK,
            Some("text/plain"),
            "plain response".to_string(),
        )
        .unwrap();
        assert_eq!(body, ApiBody::Text("plain response".to_string()));
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let long = "x".repeat(SNIPPET_LIMIT * 2);
        let short = snippet(&long);
        assert!(short.len() < long.len());
        assert!(short.ends_with("..."));

        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_user_message_is_not_the_diagnostic() {
        let err = ApiError::Parse {
            status: 200,
            snippet: "<garbage>".to_string(),
        };
        assert!(!err.user_message().contains("<garbage>"));
        assert!(err.to_string().contains("<garbage>"));

        let timeout = ApiError::Timeout {
            elapsed: Duration::from_secs(30),
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.status(), None);
    }
}
