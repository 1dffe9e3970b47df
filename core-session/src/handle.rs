//! Authorized client handle.

use crate::consent::ConsentOutcome;
use crate::error::{Result, SessionError};
use crate::http::HttpClient;
use crate::oauth;
use crate::types::{AccessToken, StoredCredential};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Opaque capability representing an authorized connection to the provider.
///
/// Owned by the session; API sub-clients hold an `Arc` of it and share its
/// lifetime. The handle mints short-lived access tokens on demand from the
/// refresh token and caches them until they near expiry. A handle built from
/// a consent outcome without a refresh token serves its seeded access token
/// for as long as it lasts and then reports [`SessionError::NotAuthenticated`].
pub struct AuthorizedClient {
    http: Arc<dyn HttpClient>,
    client_id: String,
    client_secret: String,
    refresh_token: Option<String>,
    access: Mutex<Option<AccessToken>>,
}

impl AuthorizedClient {
    /// Build a handle from a credential loaded off disk. The first API call
    /// mints an access token.
    pub fn from_stored(http: Arc<dyn HttpClient>, credential: StoredCredential) -> Self {
        Self {
            http,
            client_id: credential.client_id,
            client_secret: credential.client_secret,
            refresh_token: Some(credential.refresh_token),
            access: Mutex::new(None),
        }
    }

    /// Build a handle from a fresh consent outcome, seeding the token cache
    /// with the access token the exchange already produced.
    pub fn from_consent(http: Arc<dyn HttpClient>, outcome: ConsentOutcome) -> Self {
        Self {
            http,
            client_id: outcome.client_id,
            client_secret: outcome.client_secret,
            refresh_token: outcome.refresh_token,
            access: Mutex::new(Some(outcome.access)),
        }
    }

    /// The transport this handle was authorized against.
    pub fn http(&self) -> &Arc<dyn HttpClient> {
        &self.http
    }

    /// A bearer token valid for at least the expiry buffer, minting a fresh
    /// one when the cached token is absent or stale.
    pub async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.access.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.secret().to_string());
            }
        }

        let refresh_token = self
            .refresh_token
            .as_deref()
            .ok_or(SessionError::NotAuthenticated)?;

        debug!(client_id = %self.client_id, "minting fresh access token");
        let fresh = oauth::refresh_access_token(
            self.http.as_ref(),
            &self.client_id,
            &self.client_secret,
            refresh_token,
        )
        .await?;

        let secret = fresh.secret().to_string();
        *cached = Some(fresh);
        Ok(secret)
    }
}

impl fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ByteReader, HttpError, HttpRequest, HttpResponse};
    use async_trait::async_trait;
    use bytes::Bytes;
    use mockall::mock;
    use crate::types::ClientSecretKey;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, HttpError>;
            async fn open_stream(&self, request: HttpRequest) -> std::result::Result<ByteReader, HttpError>;
        }
    }

    fn stored_credential() -> StoredCredential {
        let key = ClientSecretKey {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        StoredCredential::new(&key, "refresh-1")
    }

    #[tokio::test]
    async fn mints_token_once_and_caches_it() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from(r#"{"access_token":"minted","expires_in":3600}"#),
            })
        });

        let handle = AuthorizedClient::from_stored(Arc::new(http), stored_credential());
        assert_eq!(handle.bearer_token().await.unwrap(), "minted");
        // Second call hits the cache: the mock only allows one execute.
        assert_eq!(handle.bearer_token().await.unwrap(), "minted");
    }

    #[tokio::test]
    async fn consent_seeded_token_avoids_refresh() {
        let http = MockHttp::new(); // any execute call would panic
        let outcome = ConsentOutcome {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            access: AccessToken::new("seeded", 3600),
            refresh_token: Some("refresh-1".to_string()),
        };

        let handle = AuthorizedClient::from_consent(Arc::new(http), outcome);
        assert_eq!(handle.bearer_token().await.unwrap(), "seeded");
    }

    #[tokio::test]
    async fn degraded_handle_without_refresh_token_serves_seed_then_fails() {
        let http = MockHttp::new();
        let outcome = ConsentOutcome {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            access: AccessToken::new("short-lived", -10),
            refresh_token: None,
        };

        let handle = AuthorizedClient::from_consent(Arc::new(http), outcome);
        let result = handle.bearer_token().await;
        assert!(matches!(result, Err(SessionError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn stale_cached_token_triggers_refresh() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from(r#"{"access_token":"renewed","expires_in":3600}"#),
            })
        });

        let outcome = ConsentOutcome {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            access: AccessToken::new("stale", -10),
            refresh_token: Some("refresh-1".to_string()),
        };

        let handle = AuthorizedClient::from_consent(Arc::new(http), outcome);
        assert_eq!(handle.bearer_token().await.unwrap(), "renewed");
    }
}
