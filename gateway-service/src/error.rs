//! Error-to-response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use core_session::SessionError;
use provider_drive::DriveError;
use tracing::warn;

/// Wrapper turning core failures into HTTP responses with a JSON error body.
pub struct GatewayError(DriveError);

impl From<DriveError> for GatewayError {
    fn from(error: DriveError) -> Self {
        Self(error)
    }
}

impl From<SessionError> for GatewayError {
    fn from(error: SessionError) -> Self {
        Self(DriveError::Session(error))
    }
}

impl GatewayError {
    /// Status and machine-readable kind for the wrapped failure. Upstream
    /// and auth failures map to 502, local filesystem failures to 500, a
    /// missing credential to 401.
    fn classify(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            DriveError::Session(SessionError::NotAuthenticated) => {
                (StatusCode::UNAUTHORIZED, "not_authenticated")
            }
            DriveError::Session(SessionError::FileSystem { .. })
            | DriveError::Session(SessionError::SecretBundle { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "filesystem_error")
            }
            DriveError::Session(_) => (StatusCode::BAD_GATEWAY, "auth_error"),
            DriveError::Connection { .. } => (StatusCode::BAD_GATEWAY, "connection_error"),
            DriveError::Api { .. } | DriveError::Parse(_) => {
                (StatusCode::BAD_GATEWAY, "api_error")
            }
            DriveError::Stream(_) => (StatusCode::BAD_GATEWAY, "stream_error"),
            DriveError::Sink { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "filesystem_error"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        warn!(status = %status, kind, error = %self.0, "request failed");

        let body = serde_json::json!({
            "error": {
                "type": kind,
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
