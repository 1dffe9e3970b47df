//! On-disk credential persistence.
//!
//! The store owns the token file. Reads are deliberately forgiving: any
//! failure (missing file, bad JSON, wrong shape) is logged and reported as
//! "no credential" so callers fall through to re-authorization. Writes are
//! strict and atomic.

use crate::error::{Result, SessionError};
use crate::types::{ClientSecretKey, StoredCredential, CREDENTIAL_KIND};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads and writes the persisted authorized-user credential. No network
/// access.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    token_path: PathBuf,
}

impl CredentialStore {
    pub fn new(token_path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: token_path.into(),
        }
    }

    /// Load the stored credential, or `None` when the token file is missing,
    /// unreadable or malformed. Never returns an error.
    pub async fn load(&self) -> Option<StoredCredential> {
        let bytes = match tokio::fs::read(&self.token_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(
                    path = %self.token_path.display(),
                    error = %e,
                    "no stored credential"
                );
                return None;
            }
        };

        let credential: StoredCredential = match serde_json::from_slice(&bytes) {
            Ok(credential) => credential,
            Err(e) => {
                warn!(
                    path = %self.token_path.display(),
                    error = %e,
                    "stored credential is malformed, re-authorization required"
                );
                return None;
            }
        };

        if credential.kind != CREDENTIAL_KIND {
            warn!(
                path = %self.token_path.display(),
                kind = %credential.kind,
                "stored credential has unexpected type, re-authorization required"
            );
            return None;
        }

        debug!(path = %self.token_path.display(), "loaded stored credential");
        Some(credential)
    }

    /// Persist a credential assembled from the secret bundle at
    /// `secrets_path` and the given refresh token.
    ///
    /// The file is written via a temp-file-then-rename so a concurrent
    /// reader never observes a partial record. A write failure is fatal to
    /// the enclosing authorization attempt.
    pub async fn save(&self, secrets_path: &Path, refresh_token: &str) -> Result<()> {
        let key = ClientSecretKey::from_bundle_file(secrets_path).await?;
        let credential = StoredCredential::new(&key, refresh_token);

        let payload =
            serde_json::to_vec(&credential).map_err(|e| SessionError::FileSystem {
                path: self.token_path.clone(),
                source: std::io::Error::other(e),
            })?;

        let staging = self.token_path.with_extension("json.tmp");
        tokio::fs::write(&staging, &payload)
            .await
            .map_err(|source| SessionError::FileSystem {
                path: staging.clone(),
                source,
            })?;
        tokio::fs::rename(&staging, &self.token_path)
            .await
            .map_err(|source| SessionError::FileSystem {
                path: self.token_path.clone(),
                source,
            })?;

        info!(path = %self.token_path.display(), "stored authorized-user credential");
        Ok(())
    }
}
