//! OAuth 2.0 wire protocol: authorization URL construction with PKCE,
//! authorization-code exchange, and refresh-token grants.
//!
//! # Security
//!
//! - PKCE (RFC 7636) with the S256 challenge method
//! - Cryptographically random state for CSRF protection
//! - Token values never appear in logs or error messages

use crate::error::{Result, SessionError};
use crate::http::{HttpClient, HttpMethod, HttpRequest};
use crate::types::{AccessToken, ClientSecretKey};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Google OAuth 2.0 authorization endpoint.
pub const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth 2.0 token endpoint.
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// PKCE code verifier plus the CSRF state for one authorization attempt.
///
/// The verifier must stay local until the code exchange; only the derived
/// challenge is sent during authorization.
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Generate a fresh verifier (32 random bytes) and state (16 random
    /// bytes), both URL-safe base64 without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// S256 challenge: BASE64URL(SHA256(verifier)).
    pub fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the authorization URL the operator must visit.
///
/// Requests offline access so the provider issues a refresh token on first
/// consent.
pub fn build_auth_url(
    client_id: &str,
    redirect_uri: &str,
    scopes: &[String],
    verifier: &PkceVerifier,
) -> Result<String> {
    let mut url = Url::parse(AUTH_ENDPOINT)
        .map_err(|e| SessionError::Consent(format!("invalid authorization endpoint: {e}")))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", client_id);
        query.append_pair("redirect_uri", redirect_uri);
        query.append_pair("response_type", "code");
        query.append_pair("scope", &scopes.join(" "));
        query.append_pair("state", verifier.state());
        query.append_pair("code_challenge", &verifier.challenge());
        query.append_pair("code_challenge_method", "S256");
        query.append_pair("access_type", "offline");
    }

    Ok(url.to_string())
}

/// Exchange an authorization code for tokens.
///
/// Returns the minted access token and the refresh token when the provider
/// issued one (it may not on repeat consent).
pub async fn exchange_code(
    http: &dyn HttpClient,
    key: &ClientSecretKey,
    redirect_uri: &str,
    code: &str,
    verifier: &PkceVerifier,
) -> Result<(AccessToken, Option<String>)> {
    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);
    params.insert("client_id", key.client_id.as_str());
    params.insert("client_secret", key.client_secret.as_str());
    params.insert("code_verifier", verifier.verifier());

    debug!("exchanging authorization code for tokens");

    let request = HttpRequest::new(HttpMethod::Post, TOKEN_ENDPOINT)
        .form(&params)
        .map_err(|e| SessionError::Consent(e.to_string()))?;

    let response = http
        .execute(request)
        .await
        .map_err(|e| SessionError::Consent(format!("token request failed: {e}")))?;

    if !response.is_success() {
        warn!(status = response.status, "code exchange rejected");
        return Err(SessionError::Consent(format!(
            "token endpoint returned {}: {}",
            response.status,
            response.text_lossy()
        )));
    }

    let token_response: TokenResponse = serde_json::from_slice(&response.body)
        .map_err(|e| SessionError::Consent(format!("unparseable token response: {e}")))?;

    debug!(
        expires_in = token_response.expires_in,
        has_refresh_token = token_response.refresh_token.is_some(),
        "authorization code exchanged"
    );

    Ok((
        AccessToken::new(token_response.access_token, token_response.expires_in),
        token_response.refresh_token,
    ))
}

/// Mint a fresh access token from a refresh token. Not retried: a rejected
/// grant surfaces to the caller as [`SessionError::TokenRefresh`].
pub async fn refresh_access_token(
    http: &dyn HttpClient,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<AccessToken> {
    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);
    params.insert("client_id", client_id);
    params.insert("client_secret", client_secret);

    debug!("refreshing access token");

    let request = HttpRequest::new(HttpMethod::Post, TOKEN_ENDPOINT)
        .form(&params)
        .map_err(|e| SessionError::TokenRefresh(e.to_string()))?;

    let response = http
        .execute(request)
        .await
        .map_err(|e| SessionError::TokenRefresh(e.to_string()))?;

    if !response.is_success() {
        warn!(status = response.status, "refresh grant rejected");
        return Err(SessionError::TokenRefresh(format!(
            "token endpoint returned {}: {}",
            response.status,
            response.text_lossy()
        )));
    }

    let token_response: TokenResponse = serde_json::from_slice(&response.body)
        .map_err(|e| SessionError::TokenRefresh(format!("unparseable token response: {e}")))?;

    debug!(
        expires_in = token_response.expires_in,
        "access token refreshed"
    );

    Ok(AccessToken::new(
        token_response.access_token,
        token_response.expires_in,
    ))
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}
