//! Drive API response types.

use serde::{Deserialize, Serialize};

/// Change-activity record, passed through as provider-shaped JSON. The
/// gateway only ever checks whether any were returned.
pub type ActivityRecord = serde_json::Value;

/// Drive `files` resource, limited to the fields the gateway requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID.
    pub id: String,

    /// File name.
    pub name: String,

    /// MIME type.
    pub mime_type: String,

    /// File size in bytes, as a decimal string (absent for folders and
    /// provider-native documents).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Modification time (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
}

/// Drive `files.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Drive Activity `activity:query` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQueryResponse {
    #[serde(default)]
    pub activities: Option<Vec<ActivityRecord>>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}
