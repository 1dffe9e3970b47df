//! Interactive consent flow.
//!
//! The session layer only depends on the [`AuthorizationFlow`] trait; the
//! shipped [`LoopbackConsentFlow`] implements the installed-app pattern:
//! announce an authorization URL, catch the provider redirect on a loopback
//! listener, and exchange the code for tokens. It blocks until the operator
//! completes or abandons consent.

use crate::error::{Result, SessionError};
use crate::http::HttpClient;
use crate::oauth::{build_auth_url, exchange_code, PkceVerifier};
use crate::types::{AccessToken, ClientSecretKey};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{info, instrument};
use url::Url;

/// Live credentials produced by a completed consent exchange.
///
/// `refresh_token` may be absent: the provider only issues one on first
/// consent. Callers treat that as a degraded success and skip persistence.
pub struct ConsentOutcome {
    pub client_id: String,
    pub client_secret: String,
    pub access: AccessToken,
    pub refresh_token: Option<String>,
}

/// Interactive OAuth 2.0 consent exchange.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Run the consent flow for the given scopes, reading the client key
    /// from the secrets file at `secrets_path`. May block on user
    /// interaction.
    async fn authenticate(&self, scopes: &[String], secrets_path: &Path)
        -> Result<ConsentOutcome>;
}

/// Loopback-redirect consent flow for a single local operator.
pub struct LoopbackConsentFlow {
    http: Arc<dyn HttpClient>,
}

impl LoopbackConsentFlow {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthorizationFlow for LoopbackConsentFlow {
    #[instrument(skip_all)]
    async fn authenticate(
        &self,
        scopes: &[String],
        secrets_path: &Path,
    ) -> Result<ConsentOutcome> {
        let key = ClientSecretKey::from_bundle_file(secrets_path).await?;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| SessionError::Consent(format!("failed to bind loopback listener: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| SessionError::Consent(format!("loopback listener has no address: {e}")))?;
        let redirect_uri = format!("http://{addr}");

        let verifier = PkceVerifier::new();
        let auth_url = build_auth_url(&key.client_id, &redirect_uri, scopes, &verifier)?;

        info!(url = %auth_url, "authorization required, open this URL in a browser");

        let redirect = wait_for_redirect(&listener).await?;
        if redirect.state != verifier.state() {
            return Err(SessionError::Consent(
                "redirect state does not match this authorization attempt".to_string(),
            ));
        }

        let (access, refresh_token) = exchange_code(
            self.http.as_ref(),
            &key,
            &redirect_uri,
            &redirect.code,
            &verifier,
        )
        .await?;

        info!(
            has_refresh_token = refresh_token.is_some(),
            "consent completed"
        );

        Ok(ConsentOutcome {
            client_id: key.client_id,
            client_secret: key.client_secret,
            access,
            refresh_token,
        })
    }
}

struct Redirect {
    code: String,
    state: String,
}

const REDIRECT_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Connection: close\r\n\
\r\n\
Authorization received. You can close this tab.";

/// Accept one connection on the loopback listener and parse the provider
/// redirect out of the request line.
async fn wait_for_redirect(listener: &TcpListener) -> Result<Redirect> {
    let (mut socket, _) = listener
        .accept()
        .await
        .map_err(|e| SessionError::Consent(format!("loopback accept failed: {e}")))?;

    let mut head = Vec::with_capacity(2048);
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket
            .read(&mut chunk)
            .await
            .map_err(|e| SessionError::Consent(format!("loopback read failed: {e}")))?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") || head.len() > 16 * 1024 {
            break;
        }
    }

    // Respond before parsing so the browser tab settles either way.
    let _ = socket.write_all(REDIRECT_RESPONSE).await;
    let _ = socket.shutdown().await;

    let head = String::from_utf8_lossy(&head);
    let request_line = head.lines().next().unwrap_or_default();
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| SessionError::Consent("malformed redirect request".to_string()))?;

    let url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|e| SessionError::Consent(format!("malformed redirect target: {e}")))?;

    let mut code = None;
    let mut state = None;
    let mut denial = None;
    for (name, value) in url.query_pairs() {
        match name.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => denial = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(reason) = denial {
        return Err(SessionError::Consent(format!(
            "authorization denied: {reason}"
        )));
    }

    match (code, state) {
        (Some(code), Some(state)) => Ok(Redirect { code, state }),
        _ => Err(SessionError::Consent(
            "redirect carried no code or state".to_string(),
        )),
    }
}
