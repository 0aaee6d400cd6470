use super::form::{AddFeedRequest, FormBody, ModifyFeedRequest, FIELD_FEED_KEY};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Header marking a request as programmatic, so the backend answers with a
/// partial/JSON response instead of a full page.
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 5 * 1024 * 1024; // 5MB

// ============================================================================
// Endpoint Contract
// ============================================================================

/// How a response body is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// JSON payload (`{"message": ...}`).
    Structured,
    /// Server-rendered markup or plain text, passed through untouched.
    RawMarkup,
}

/// The fixed set of backend actions.
///
/// Method and response shape are properties of the endpoint, so a caller
/// cannot pair an endpoint with the wrong verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListFeeds,
    Changelog,
    AddFeed,
    ModifyFeed,
    RemoveFeed,
    Reload,
    Health,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::ListFeeds => "/feeds",
            Endpoint::Changelog => "/changelog",
            Endpoint::AddFeed => "/add",
            Endpoint::ModifyFeed => "/modify",
            Endpoint::RemoveFeed => "/remove",
            Endpoint::Reload => "/reload",
            Endpoint::Health => "/health",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Endpoint::ListFeeds | Endpoint::Changelog | Endpoint::Health => Method::GET,
            Endpoint::AddFeed | Endpoint::ModifyFeed | Endpoint::RemoveFeed | Endpoint::Reload => {
                Method::POST
            }
        }
    }

    pub const fn response_shape(self) -> ResponseShape {
        match self {
            Endpoint::ListFeeds | Endpoint::Changelog | Endpoint::Health => {
                ResponseShape::RawMarkup
            }
            Endpoint::AddFeed | Endpoint::ModifyFeed | Endpoint::RemoveFeed | Endpoint::Reload => {
                ResponseShape::Structured
            }
        }
    }
}

/// A successful response, parsed according to its [`ResponseShape`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(serde_json::Value),
    Markup(String),
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    message: String,
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by the transport. No variant is retried; callers report them.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS, connection refused, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    /// Non-2xx response; `body` is the raw text the server sent.
    #[error("HTTP error: status {status}")]
    HttpStatus { status: u16, body: String },
    /// 2xx response whose payload did not match the expected shape.
    #[error("Malformed response: {reason}")]
    Malformed { reason: String, body: String },
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
}

impl TransportError {
    /// Raw response text carried by the error, if the server sent any.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            TransportError::HttpStatus { body, .. } | TransportError::Malformed { body, .. } => {
                Some(body.as_str())
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            TransportError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Thin client over the podconfig backend contract.
///
/// Cloning is cheap: `reqwest::Client` is reference-counted internally.
#[derive(Debug, Clone)]
pub struct FeedApi {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
    max_response_bytes: usize,
}

impl FeedApi {
    /// Creates a client rooted at `base`. A missing trailing slash is added so
    /// endpoint paths resolve under any path prefix the server is mounted at.
    pub fn new(client: reqwest::Client, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            client,
            base,
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for an endpoint, relative to the base.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Url {
        let relative = endpoint.path().trim_start_matches('/');
        match self.base.join(relative) {
            Ok(url) => url,
            // Joining a plain relative segment onto a valid base cannot fail;
            // fall back to the base rather than panic.
            Err(_) => self.base.clone(),
        }
    }

    /// Issues a request against `endpoint` and parses the response.
    ///
    /// The whole exchange (connect, headers, body) is bounded by the client
    /// timeout.
    pub async fn request(
        &self,
        endpoint: Endpoint,
        body: Option<&FormBody>,
    ) -> Result<Payload, TransportError> {
        tracing::debug!(
            endpoint = endpoint.path(),
            method = %endpoint.method(),
            fields = ?body.map(|b| b.names().collect::<Vec<_>>()),
            "Sending request"
        );

        let result = tokio::time::timeout(self.timeout, self.execute(endpoint, body))
            .await
            .map_err(|_| TransportError::Timeout)?;

        if let Err(e) = &result {
            tracing::warn!(endpoint = endpoint.path(), error = %e, "Request failed");
        }
        result
    }

    async fn execute(
        &self,
        endpoint: Endpoint,
        body: Option<&FormBody>,
    ) -> Result<Payload, TransportError> {
        let mut request = self
            .client
            .request(endpoint.method(), self.endpoint_url(endpoint))
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE);

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.encode());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = read_limited_text(response, self.max_response_bytes).await?;

        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        match endpoint.response_shape() {
            ResponseShape::RawMarkup => Ok(Payload::Markup(text)),
            ResponseShape::Structured => serde_json::from_str(&text)
                .map(Payload::Structured)
                .map_err(|e| TransportError::Malformed {
                    reason: e.to_string(),
                    body: text,
                }),
        }
    }

    /// `GET /feeds`: the server-rendered feed rows.
    pub async fn fetch_feeds(&self) -> Result<String, TransportError> {
        self.request(Endpoint::ListFeeds, None).await.and_then(into_markup)
    }

    /// `GET /changelog`: the pending-changes partial.
    pub async fn fetch_changelog(&self) -> Result<String, TransportError> {
        self.request(Endpoint::Changelog, None).await.and_then(into_markup)
    }

    pub async fn add_feed(&self, req: &AddFeedRequest) -> Result<String, TransportError> {
        self.request(Endpoint::AddFeed, Some(&req.to_form()))
            .await
            .and_then(into_message)
    }

    pub async fn modify_feed(&self, req: &ModifyFeedRequest) -> Result<String, TransportError> {
        self.request(Endpoint::ModifyFeed, Some(&req.to_form()))
            .await
            .and_then(into_message)
    }

    pub async fn remove_feed(&self, feed_key: &str) -> Result<String, TransportError> {
        let body = FormBody::new().field(FIELD_FEED_KEY, feed_key);
        self.request(Endpoint::RemoveFeed, Some(&body))
            .await
            .and_then(into_message)
    }

    /// `POST /reload`: restarts the podsync container server-side.
    pub async fn reload(&self) -> Result<String, TransportError> {
        self.request(Endpoint::Reload, None).await.and_then(into_message)
    }

    /// `GET /health`: any 2xx counts as healthy.
    pub async fn health(&self) -> Result<(), TransportError> {
        self.request(Endpoint::Health, None).await.map(|_| ())
    }
}

fn into_markup(payload: Payload) -> Result<String, TransportError> {
    match payload {
        Payload::Markup(text) => Ok(text),
        Payload::Structured(value) => Ok(value.to_string()),
    }
}

fn into_message(payload: Payload) -> Result<String, TransportError> {
    match payload {
        Payload::Structured(value) => serde_json::from_value::<MessagePayload>(value.clone())
            .map(|p| p.message)
            .map_err(|e| TransportError::Malformed {
                reason: e.to_string(),
                body: value.to_string(),
            }),
        Payload::Markup(text) => Err(TransportError::Malformed {
            reason: "expected a JSON message payload".to_string(),
            body: text,
        }),
    }
}

/// Read a response body with a size limit to prevent memory exhaustion.
async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, TransportError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(TransportError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(TransportError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| TransportError::InvalidUtf8)
}
