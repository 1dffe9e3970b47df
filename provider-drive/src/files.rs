//! Drive file API client: listing plus streaming download and export.

use crate::error::{DriveError, Result};
use crate::transfer;
use crate::types::{DriveFile, FilesListResponse};
use core_session::{AuthorizedClient, HttpMethod, HttpRequest};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Drive API v3 base URL.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Fields requested for file listings.
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,size,modifiedTime)";

/// Listing page size.
const LIST_PAGE_SIZE: u32 = 100;

/// MIME type used for the default export rendition.
pub const PDF_MIME: &str = "application/pdf";

/// View over an [`AuthorizedClient`] for the Drive file API. Cheap to
/// construct; shares the handle's lifetime.
pub struct DriveFilesClient {
    auth: Arc<AuthorizedClient>,
}

impl DriveFilesClient {
    pub(crate) fn new(auth: Arc<AuthorizedClient>) -> Self {
        Self { auth }
    }

    /// List files, optionally constrained by a Drive search query such as
    /// `name = 'report.gdoc'`.
    #[instrument(skip(self))]
    pub async fn list(&self, query: Option<&str>) -> Result<Vec<DriveFile>> {
        let mut url = format!(
            "{}/files?pageSize={}&fields={}",
            DRIVE_API_BASE,
            LIST_PAGE_SIZE,
            urlencoding::encode(LIST_FIELDS)
        );
        if let Some(query) = query {
            url.push_str(&format!("&q={}", urlencoding::encode(query)));
        }

        let token = self.auth.bearer_token().await?;
        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(token)
            .header("Accept", "application/json");

        let response = self
            .auth
            .http()
            .execute(request)
            .await
            .map_err(DriveError::from_transport)?;

        if !response.is_success() {
            return Err(DriveError::Api {
                status: Some(response.status),
                message: response.text_lossy(),
            });
        }

        let list: FilesListResponse = serde_json::from_slice(&response.body)
            .map_err(|e| DriveError::Parse(e.to_string()))?;

        info!(count = list.files.len(), "listed drive files");
        Ok(list.files)
    }

    /// Stream the raw content of `file_id` into `dest`.
    ///
    /// Resolves with the byte count once the destination has received and
    /// flushed end-of-stream; see [`crate::transfer`] for the failure split.
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub async fn download_to(&self, file_id: &str, dest: &Path) -> Result<u64> {
        let url = format!("{DRIVE_API_BASE}/files/{file_id}?alt=media");
        self.stream_to(url, dest).await
    }

    /// Stream a format-converted rendition of `file_id` into `dest`.
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub async fn export_to(&self, file_id: &str, mime_type: &str, dest: &Path) -> Result<u64> {
        let url = format!(
            "{}/files/{}/export?mimeType={}",
            DRIVE_API_BASE,
            file_id,
            urlencoding::encode(mime_type)
        );
        self.stream_to(url, dest).await
    }

    async fn stream_to(&self, url: String, dest: &Path) -> Result<u64> {
        let token = self.auth.bearer_token().await?;
        let request = HttpRequest::new(HttpMethod::Get, url).bearer_token(token);

        let reader = self
            .auth
            .http()
            .open_stream(request)
            .await
            .map_err(DriveError::from_transport)?;

        debug!("transfer stream opened");
        transfer::pump_to_file(reader, dest).await
    }
}
