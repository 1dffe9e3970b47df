//! Per-request Drive session.
//!
//! `DriveSession` orchestrates the credential store, the consent flow and
//! the API sub-clients behind one handle. Each incoming request constructs
//! its own session, so the token file is the only state shared between
//! requests; two first-time authorizations racing on it resolve as
//! last-writer-wins, which is acceptable for a single operator and is not
//! hardened further.

use crate::activity::{DriveActivityClient, DEFAULT_PAGE_SIZE};
use crate::error::{DriveError, Result};
use crate::files::{DriveFilesClient, PDF_MIME};
use crate::types::{ActivityRecord, DriveFile};
use core_session::{
    AuthorizationFlow, AuthorizedClient, CredentialStore, HttpClient, SessionConfig, SessionError,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Session state machine: `Unauthenticated` until [`DriveSession::authorize`]
/// succeeds, then `Authenticated` with memoized sub-clients built on first
/// use. Dropped with the request.
pub struct DriveSession {
    config: SessionConfig,
    store: CredentialStore,
    flow: Arc<dyn AuthorizationFlow>,
    http: Arc<dyn HttpClient>,
    client: Option<Arc<AuthorizedClient>>,
    files: Option<DriveFilesClient>,
    activity: Option<DriveActivityClient>,
}

impl DriveSession {
    pub fn new(
        config: SessionConfig,
        flow: Arc<dyn AuthorizationFlow>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let store = CredentialStore::new(config.token_path.clone());
        Self {
            config,
            store,
            flow,
            http,
            client: None,
            files: None,
            activity: None,
        }
    }

    /// Whether the session holds an active credential.
    pub fn is_authenticated(&self) -> bool {
        self.client.is_some()
    }

    /// Establish the session credential. Idempotent: once authenticated,
    /// further calls are no-ops.
    ///
    /// A stored credential is adopted as-is, with no network traffic and no
    /// write. Otherwise the interactive consent flow runs; when it yields a
    /// refresh token the credential is persisted, and when it does not the
    /// session stays authenticated in memory only, which is a degraded
    /// success rather than an error.
    #[instrument(skip(self))]
    pub async fn authorize(&mut self) -> std::result::Result<(), SessionError> {
        self.acquire().await.map(|_| ())
    }

    async fn acquire(&mut self) -> std::result::Result<Arc<AuthorizedClient>, SessionError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        if let Some(credential) = self.store.load().await {
            debug!("adopted stored credential");
            let client = Arc::new(AuthorizedClient::from_stored(self.http.clone(), credential));
            self.client = Some(client.clone());
            return Ok(client);
        }

        let outcome = self
            .flow
            .authenticate(&self.config.scopes, &self.config.secrets_path)
            .await?;

        match outcome.refresh_token.as_deref() {
            Some(refresh_token) => {
                self.store
                    .save(&self.config.secrets_path, refresh_token)
                    .await?;
            }
            None => {
                debug!("consent yielded no refresh token, credential will not be persisted");
            }
        }

        let client = Arc::new(AuthorizedClient::from_consent(self.http.clone(), outcome));
        self.client = Some(client.clone());
        Ok(client)
    }

    async fn ensure_files(&mut self) -> Result<&DriveFilesClient> {
        let handle = self
            .acquire()
            .await
            .map_err(|e| DriveError::Connection {
                client: "files",
                reason: e.to_string(),
            })?;
        Ok(self.files.get_or_insert_with(|| DriveFilesClient::new(handle)))
    }

    async fn ensure_activity(&mut self) -> Result<&DriveActivityClient> {
        let handle = self
            .acquire()
            .await
            .map_err(|e| DriveError::Connection {
                client: "activity",
                reason: e.to_string(),
            })?;
        Ok(self
            .activity
            .get_or_insert_with(|| DriveActivityClient::new(handle)))
    }

    /// List files, optionally filtered to an exact name match.
    pub async fn list_files(&mut self, name_filter: Option<&str>) -> Result<Vec<DriveFile>> {
        let query = name_filter.map(|name| format!("name = '{}'", name.replace('\'', "\\'")));
        let files = self.ensure_files().await?;
        files.list(query.as_deref()).await
    }

    /// Stream the raw content of `file_id` into the downloads directory as
    /// `destination_name`.
    pub async fn download(&mut self, file_id: &str, destination_name: &str) -> Result<u64> {
        let dest = self.config.downloads_dir.join(destination_name);
        let files = self.ensure_files().await?;
        files.download_to(file_id, &dest).await
    }

    /// Stream a converted rendition of `file_id` into the exports directory
    /// as `destination_name`. `mime_type` defaults to PDF when `None`.
    pub async fn export(
        &mut self,
        file_id: &str,
        destination_name: &str,
        mime_type: Option<&str>,
    ) -> Result<u64> {
        let dest = self.config.exports_dir.join(destination_name);
        let files = self.ensure_files().await?;
        files
            .export_to(file_id, mime_type.unwrap_or(PDF_MIME), &dest)
            .await
    }

    /// Fetch the most recent change-activity records, `None` when there are
    /// none.
    pub async fn recent_activity(
        &mut self,
        page_size: Option<u32>,
    ) -> Result<Option<Vec<ActivityRecord>>> {
        let activity = self.ensure_activity().await?;
        activity.recent(page_size.unwrap_or(DEFAULT_PAGE_SIZE)).await
    }
}
