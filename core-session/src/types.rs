//! Credential and secret-bundle data types.

use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Record type tag written into the token file.
pub const CREDENTIAL_KIND: &str = "authorized-user";

/// Persisted authorized-user credential.
///
/// This is the sole record of the token file. Once a refresh token has been
/// obtained it is durable across process restarts; a missing or corrupt file
/// simply forces re-authorization.
///
/// # Security
///
/// The `Debug` implementation redacts the refresh token so credentials can be
/// traced without leaking secrets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Record type tag, always `"authorized-user"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// OAuth client ID from the provider-issued secrets file.
    pub client_id: String,
    /// OAuth client secret from the provider-issued secrets file.
    pub client_secret: String,
    /// Long-lived refresh token obtained through consent.
    pub refresh_token: String,
}

impl StoredCredential {
    /// Assemble a credential from a client key and a refresh token.
    pub fn new(key: &ClientSecretKey, refresh_token: impl Into<String>) -> Self {
        Self {
            kind: CREDENTIAL_KIND.to_string(),
            client_id: key.client_id.clone(),
            client_secret: key.client_secret.clone(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// OAuth client identity loaded from the provider-issued secrets file.
///
/// The bundle carries either an `installed` or a `web` object; the first one
/// present wins. The file is operator-provided and never mutated here.
#[derive(Clone, Deserialize)]
pub struct ClientSecretKey {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientSecretKey {
    /// Read the secrets file at `path` and select the client key.
    ///
    /// Returns [`SessionError::FileSystem`] when the file cannot be read and
    /// [`SessionError::SecretBundle`] when it parses but carries neither an
    /// `installed` nor a `web` object.
    pub async fn from_bundle_file(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SessionError::FileSystem {
                path: path.to_owned(),
                source,
            })?;
        let bundle: SecretBundle =
            serde_json::from_slice(&bytes).map_err(|e| SessionError::SecretBundle {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        bundle
            .installed
            .or(bundle.web)
            .ok_or_else(|| SessionError::SecretBundle {
                path: path.to_owned(),
                reason: "neither \"installed\" nor \"web\" key present".to_string(),
            })
    }
}

impl fmt::Debug for ClientSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretKey")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct SecretBundle {
    #[serde(default)]
    installed: Option<ClientSecretKey>,
    #[serde(default)]
    web: Option<ClientSecretKey>,
}

/// Short-lived bearer token minted from a refresh-token grant.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

/// Seconds before nominal expiry at which a token is treated as expired, so
/// a fresh one is minted before in-flight requests can outlive it.
const EXPIRY_BUFFER_SECS: i64 = 300;

impl AccessToken {
    /// Create a token that expires `expires_in` seconds from now.
    pub fn new(token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            token: token.into(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(expires_in),
        }
    }

    /// The raw bearer token value.
    pub fn secret(&self) -> &str {
        &self.token
    }

    /// Whether the token is expired or will expire within the buffer period.
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now() >= self.expires_at - chrono::Duration::seconds(EXPIRY_BUFFER_SECS)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
