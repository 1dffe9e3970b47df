//! HTTP routes.
//!
//! Thin glue over the core: each handler constructs its own
//! [`DriveSession`], delegates, and maps the outcome. Session construction
//! per request is deliberate: requests share no mutable state, at the cost
//! of re-reading the token file each time.

use crate::error::GatewayError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use core_session::{AuthorizationFlow, HttpClient, SessionConfig};
use provider_drive::{DriveFile, DriveSession};
use serde::Deserialize;
use std::sync::Arc;

/// Shared, immutable pieces handlers build sessions from.
#[derive(Clone)]
pub struct AppState {
    pub config: SessionConfig,
    pub flow: Arc<dyn AuthorizationFlow>,
    pub http: Arc<dyn HttpClient>,
}

impl AppState {
    fn session(&self) -> DriveSession {
        DriveSession::new(self.config.clone(), self.flow.clone(), self.http.clone())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/session", get(authorize))
        .route("/drive/list", get(list_files))
        .route("/drive/download/{file_id}", get(download))
        .route("/drive/export/{file_id}", get(export))
        .route("/drive/changes", get(changes))
        .with_state(state)
}

async fn authorize(State(state): State<AppState>) -> Result<&'static str, GatewayError> {
    let mut session = state.session();
    session.authorize().await?;
    Ok("authorization complete")
}

#[derive(Deserialize)]
struct ListParams {
    name: Option<String>,
}

async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DriveFile>>, GatewayError> {
    let mut session = state.session();
    let files = session.list_files(params.name.as_deref()).await?;
    Ok(Json(files))
}

#[derive(Deserialize)]
struct TransferParams {
    file_name: String,
    mime_type: Option<String>,
}

async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(params): Query<TransferParams>,
) -> Result<StatusCode, GatewayError> {
    let mut session = state.session();
    session.download(&file_id, &params.file_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(params): Query<TransferParams>,
) -> Result<StatusCode, GatewayError> {
    let mut session = state.session();
    session
        .export(&file_id, &params.file_name, params.mime_type.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct ChangesParams {
    page_size: Option<u32>,
}

async fn changes(
    State(state): State<AppState>,
    Query(params): Query<ChangesParams>,
) -> Result<Response, GatewayError> {
    let mut session = state.session();
    match session.recent_activity(params.page_size).await? {
        Some(records) => Ok(Json(records).into_response()),
        None => Ok("no recent drive activity".into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use bytes::Bytes;
    use core_session::{
        ByteReader, ConsentOutcome, HttpError, HttpRequest, HttpResponse, SessionError,
    };
    use mockall::mock;
    use std::path::PathBuf;
    use tower::ServiceExt;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, HttpError>;
            async fn open_stream(&self, request: HttpRequest) -> std::result::Result<ByteReader, HttpError>;
        }
    }

    mock! {
        Flow {}

        #[async_trait]
        impl AuthorizationFlow for Flow {
            async fn authenticate(
                &self,
                scopes: &[String],
                secrets_path: &std::path::Path,
            ) -> core_session::Result<ConsentOutcome>;
        }
    }

    async fn scratch_state(http: MockHttp, flow: MockFlow) -> (PathBuf, AppState) {
        let root = std::env::temp_dir().join(format!("routes-test-{}", uuid::Uuid::new_v4()));
        let secrets_dir = root.join("secrets");
        let assets_dir = root.join("assets");
        let config = SessionConfig::new(
            vec!["scope".to_string()],
            secrets_dir.clone(),
            assets_dir.clone(),
        );
        tokio::fs::create_dir_all(&secrets_dir).await.unwrap();
        tokio::fs::create_dir_all(&config.downloads_dir).await.unwrap();
        tokio::fs::create_dir_all(&config.exports_dir).await.unwrap();
        tokio::fs::write(
            &config.secrets_path,
            r#"{"installed":{"client_id":"abc","client_secret":"xyz"}}"#,
        )
        .await
        .unwrap();

        let state = AppState {
            config,
            flow: Arc::new(flow),
            http: Arc::new(http),
        };
        (root, state)
    }

    async fn seed_token(state: &AppState) {
        tokio::fs::write(
            &state.config.token_path,
            r#"{"type":"authorized-user","client_id":"abc","client_secret":"xyz","refresh_token":"r0"}"#,
        )
        .await
        .unwrap();
    }

    /// Answer token-endpoint calls with a fixed access token, everything
    /// else through `handler`.
    fn http_with_token_endpoint(
        handler: fn(HttpRequest) -> std::result::Result<HttpResponse, HttpError>,
    ) -> MockHttp {
        let mut http = MockHttp::new();
        http.expect_execute().returning(move |request| {
            if request.url.starts_with(core_session::oauth::TOKEN_ENDPOINT) {
                return Ok(HttpResponse {
                    status: 200,
                    body: Bytes::from(r#"{"access_token":"at","expires_in":3600}"#),
                });
            }
            handler(request)
        });
        http
    }

    #[tokio::test]
    async fn session_route_runs_consent_and_persists_token() {
        let mut flow = MockFlow::new();
        flow.expect_authenticate().times(1).returning(|_, _| {
            Ok(ConsentOutcome {
                client_id: "abc".to_string(),
                client_secret: "xyz".to_string(),
                access: core_session::AccessToken::new("at", 3600),
                refresh_token: Some("r1".to_string()),
            })
        });

        let (root, state) = scratch_state(MockHttp::new(), flow).await;
        let token_path = state.config.token_path.clone();

        let response = router(state)
            .oneshot(Request::builder().uri("/session").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let token: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(&token_path).await.unwrap()).unwrap();
        assert_eq!(token["refresh_token"], "r1");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn list_route_returns_files_json() {
        let http = http_with_token_endpoint(|_| {
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from(
                    r#"{"files":[{"id":"f1","name":"notes.txt","mimeType":"text/plain"}]}"#,
                ),
            })
        });

        let (root, state) = scratch_state(http, MockFlow::new()).await;
        seed_token(&state).await;

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/drive/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let files: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(files[0]["id"], "f1");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn download_route_writes_file_and_returns_204() {
        let mut http = http_with_token_endpoint(|request| {
            panic!("unexpected execute call to {}", request.url)
        });
        http.expect_open_stream().times(1).returning(|_| {
            use futures_util::stream;
            let chunks: Vec<std::io::Result<Bytes>> = vec![Ok(Bytes::from_static(b"content"))];
            Ok(Box::new(tokio_util::io::StreamReader::new(stream::iter(chunks))) as ByteReader)
        });

        let (root, state) = scratch_state(http, MockFlow::new()).await;
        seed_token(&state).await;
        let downloads_dir = state.config.downloads_dir.clone();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/drive/download/f1?file_name=saved.bin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let content = tokio::fs::read(downloads_dir.join("saved.bin")).await.unwrap();
        assert_eq!(content, b"content");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn changes_route_reports_no_activity_as_success() {
        let http = http_with_token_endpoint(|_| {
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from(r#"{"activities":[]}"#),
            })
        });

        let (root, state) = scratch_state(http, MockFlow::new()).await;
        seed_token(&state).await;

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/drive/changes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        assert_eq!(&body[..], b"no recent drive activity");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn provider_failure_maps_to_502_error_body() {
        let http = http_with_token_endpoint(|_| {
            Ok(HttpResponse {
                status: 500,
                body: Bytes::from("backend exploded"),
            })
        });

        let (root, state) = scratch_state(http, MockFlow::new()).await;
        seed_token(&state).await;

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/drive/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "api_error");
        assert!(json["error"]["message"].is_string());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn abandoned_consent_maps_to_502() {
        let mut flow = MockFlow::new();
        flow.expect_authenticate()
            .times(1)
            .returning(|_, _| Err(SessionError::Consent("operator closed the tab".to_string())));

        let (root, state) = scratch_state(MockHttp::new(), flow).await;

        let response = router(state)
            .oneshot(Request::builder().uri("/session").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "auth_error");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
