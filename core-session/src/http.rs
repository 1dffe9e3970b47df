//! HTTP transport abstraction.
//!
//! Narrow async client trait so the session and provider layers can be
//! exercised against mocks without touching the network. The production
//! implementation is [`ReqwestHttpClient`](crate::ReqwestHttpClient).

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Streaming response body, ready to be pumped into a sink.
pub type ByteReader = Box<dyn tokio::io::AsyncRead + Send + Unpin>;

#[derive(Error, Debug)]
pub enum HttpError {
    /// The request never produced a response (connect failure, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// A streaming request was answered with a non-success status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request body could not be encoded.
    #[error("request body error: {0}")]
    Body(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP request builder.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a JSON body and matching content type.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, HttpError> {
        let encoded = serde_json::to_vec(body).map_err(|e| HttpError::Body(e.to_string()))?;
        self.body = Some(Bytes::from(encoded));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Attach a form-encoded body and matching content type.
    pub fn form<T: Serialize>(mut self, body: &T) -> Result<Self, HttpError> {
        let encoded =
            serde_urlencoded::to_string(body).map_err(|e| HttpError::Body(e.to_string()))?;
        self.body = Some(Bytes::from(encoded));
        self.headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        Ok(self)
    }
}

/// HTTP response with the body fully collected.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort body text for error reporting.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Async HTTP client.
///
/// `execute` collects the whole response and reports any status back to the
/// caller; `open_stream` is for large transfers and only yields a reader for
/// success statuses. No retries at this layer: failures surface to the
/// caller unchanged.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a request, collecting the response body.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;

    /// Execute a request and hand back the response body as a byte stream.
    ///
    /// Non-success statuses are reported as [`HttpError::Status`] before any
    /// streaming begins.
    async fn open_stream(&self, request: HttpRequest) -> Result<ByteReader, HttpError>;
}
