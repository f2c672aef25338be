//! Transport layer.
//!
//! [`HttpBackend`] is the only thing this crate needs from the host's HTTP
//! stack: send one request, hand back a status and a body. [`Transport`]
//! wraps a backend, turns non-success statuses and every other failure into
//! a [`TransportError`], and reports each failure to a [`DiagnosticSink`]
//! before returning it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BoxError, Error, ErrorCode, Result, TransportError};

/// Headers whose values never reach a diagnostic record.
const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

// ─────────────────────────────────────────────────────────────────────────────
// Cache policy
// ─────────────────────────────────────────────────────────────────────────────

/// Caching hint passed through to the backend.
///
/// The names follow the fetch cache modes. The client never caches anything
/// itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Let the HTTP stack decide.
    Default,
    /// Bypass caches entirely.
    NoStore,
    /// Fetch fresh, then update caches.
    Reload,
    /// Revalidate cached entries.
    NoCache,
    /// Prefer any cached entry, stale or not.
    #[default]
    ForceCache,
    /// Only answer from cache.
    OnlyIfCached,
}

impl CachePolicy {
    /// Equivalent `Cache-Control` request directive, if any.
    ///
    /// `Default` and `ForceCache` only concern a local cache and put nothing
    /// on the wire.
    pub fn cache_control(&self) -> Option<&'static str> {
        match self {
            CachePolicy::Default | CachePolicy::ForceCache => None,
            CachePolicy::NoStore => Some("no-store"),
            CachePolicy::Reload | CachePolicy::NoCache => Some("no-cache"),
            CachePolicy::OnlyIfCached => Some("only-if-cached"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend boundary
// ─────────────────────────────────────────────────────────────────────────────

/// A request as handed to an [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully built URL.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Caching hint.
    pub cache: CachePolicy,
    /// Serialized body. Always `None` for GET.
    pub body: Option<Vec<u8>>,
}

/// A response as returned by an [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response from a status and raw body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Create a response with a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP primitive the client is built on.
///
/// Implementations send exactly one request per call and do not interpret
/// the status; that is the job of [`Transport`].
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Send a request and return the raw response.
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, BoxError>;
}

/// [`HttpBackend`] on top of `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    http: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a backend with a fresh `reqwest` client.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("wagtail-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, BoxError> {
        let mut headers = request.headers;
        if let Some(directive) = request.cache.cache_control() {
            headers
                .entry(CACHE_CONTROL)
                .or_insert(HeaderValue::from_static(directive));
        }

        let mut builder = self
            .http
            .request(request.method, request.url.as_str())
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A backend that answers from a queue and records what it was sent.
///
/// Responses are returned in order. Once the queue is empty every call
/// fails with a backend error, which [`Transport`] reports as
/// `UNEXPECTED_ERROR`.
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: Mutex<VecDeque<std::result::Result<HttpResponse, String>>>,
    request_log: Mutex<Vec<HttpRequest>>,
}

impl MockBackend {
    /// Create a mock with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock answering once with `200` and the given JSON body.
    pub fn with_json(body: Value) -> Self {
        let mock = Self::new();
        mock.push_json(200, body);
        mock
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(HttpResponse::json(status, &body));
    }

    /// Queue a raw response.
    pub fn push_response(&self, response: HttpResponse) {
        lock(&self.responses).push_back(Ok(response));
    }

    /// Queue a backend failure (network error and the like).
    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.responses).push_back(Err(message.into()));
    }

    /// All requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.request_log).clone()
    }

    /// Number of requests sent so far.
    pub fn request_count(&self) -> usize {
        lock(&self.request_log).len()
    }

    /// URLs of all requests sent so far.
    pub fn urls(&self) -> Vec<String> {
        lock(&self.request_log)
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl HttpBackend for MockBackend {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, BoxError> {
        lock(&self.request_log).push(request);
        match lock(&self.responses).pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(message.into()),
            None => Err("MockBackend: no more responses available".into()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostics
// ─────────────────────────────────────────────────────────────────────────────

/// Everything known about a failed request, for operators.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// HTTP method.
    pub method: Method,
    /// Request URL.
    pub url: String,
    /// Request body, if any was supplied.
    pub body: Option<Value>,
    /// Request headers, sensitive values redacted.
    pub headers: Vec<(String, String)>,
    /// Failure code.
    pub code: ErrorCode,
    /// Underlying cause, rendered.
    pub cause: String,
}

impl FailureRecord {
    fn new(
        method: &Method,
        url: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
        error: &TransportError,
    ) -> Self {
        let cause = match std::error::Error::source(error) {
            Some(source) => source.to_string(),
            None => error.message().to_string(),
        };
        Self {
            method: method.clone(),
            url: url.to_string(),
            body: body.cloned(),
            headers: redact(headers),
            code: error.code(),
            cause,
        }
    }
}

fn redact(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name = name.as_str().to_string();
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "[redacted]".to_string()
            } else {
                value.to_str().unwrap_or("[binary]").to_string()
            };
            (name, value)
        })
        .collect()
}

/// Receives a record for every failed request.
pub trait DiagnosticSink: Send + Sync {
    /// Record one failure. Must not panic.
    fn record(&self, record: &FailureRecord);
}

/// Default sink: one structured `tracing` error event per failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, record: &FailureRecord) {
        tracing::error!(
            method = %record.method,
            url = %record.url,
            body = ?record.body,
            headers = ?record.headers,
            code = %record.code,
            cause = %record.cause,
            "Content API request failed"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Issues single requests and normalizes their failures.
#[derive(Clone)]
pub struct Transport {
    backend: Arc<dyn HttpBackend>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Transport {
    /// Create a transport over `backend`, reporting failures to `diagnostics`.
    pub fn new(backend: Arc<dyn HttpBackend>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            backend,
            diagnostics,
        }
    }

    /// Issue one request and parse the JSON body.
    ///
    /// GET never sends a body. Other methods send `body` as JSON when given.
    /// A non-2xx status fails with `REQUEST_FAILED`; anything else that goes
    /// wrong fails with `UNEXPECTED_ERROR`.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
        cache: CachePolicy,
    ) -> std::result::Result<Value, TransportError> {
        let result = self
            .execute(method.clone(), url, body, headers, cache)
            .await;
        if let Err(err) = &result {
            self.diagnostics
                .record(&FailureRecord::new(&method, url, body, headers, err));
        }
        result
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
        cache: CachePolicy,
    ) -> std::result::Result<Value, TransportError> {
        tracing::debug!(%method, url, "Sending content API request");

        let mut headers = headers.clone();
        let payload = match body {
            Some(body) if method != Method::GET => {
                headers
                    .entry(CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("application/json"));
                Some(serde_json::to_vec(body).map_err(TransportError::unexpected)?)
            }
            _ => None,
        };

        let response = self
            .backend
            .send(HttpRequest {
                method,
                url: url.to_string(),
                headers,
                cache,
                body: payload,
            })
            .await
            .map_err(TransportError::unexpected)?;

        if !response.is_success() {
            return Err(TransportError::request_failed(response.status));
        }

        serde_json::from_slice(&response.body).map_err(TransportError::unexpected)
    }
}
