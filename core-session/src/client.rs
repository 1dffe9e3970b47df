//! Reqwest-backed [`HttpClient`] implementation.

use crate::http::{ByteReader, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Production HTTP client: connection pooling, TLS and streaming via reqwest.
///
/// The request timeout applies to `execute` calls only; streaming transfers
/// run until the body is exhausted and are bounded by the connect timeout
/// alone.
pub struct ReqwestHttpClient {
    client: Client,
    request_timeout: Duration,
}

impl ReqwestHttpClient {
    /// Create a client with default timeouts.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(request_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("drive-gateway/0.1.0")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            request_timeout,
        }
    }

    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut req = self.client.request(method, &request.url);
        for (key, value) in request.headers {
            req = req.header(key, value);
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }
        req
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = request.url.clone();
        let response = self
            .build_request(request)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        debug!(url = %url, status, "request completed");

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }

    async fn open_stream(&self, request: HttpRequest) -> Result<ByteReader, HttpError> {
        let url = request.url.clone();
        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_string());
            return Err(HttpError::Status { status, message });
        }

        debug!(url = %url, status, "response stream opened");

        use futures_util::TryStreamExt;
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let reader = tokio_util::io::StreamReader::new(stream);

        Ok(Box::new(reader))
    }
}
