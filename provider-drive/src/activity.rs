//! Drive Activity API client.

use crate::error::{DriveError, Result};
use crate::types::{ActivityQueryResponse, ActivityRecord};
use core_session::{AuthorizedClient, HttpMethod, HttpRequest};
use std::sync::Arc;
use tracing::{info, instrument};

/// Drive Activity API v2 base URL.
const ACTIVITY_API_BASE: &str = "https://driveactivity.googleapis.com/v2";

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// View over an [`AuthorizedClient`] for the Drive Activity API.
pub struct DriveActivityClient {
    auth: Arc<AuthorizedClient>,
}

impl DriveActivityClient {
    pub(crate) fn new(auth: Arc<AuthorizedClient>) -> Self {
        Self { auth }
    }

    /// Fetch up to `page_size` most recent activity records.
    ///
    /// Returns `Ok(None)` when the provider reports no activity, which is
    /// distinct from any failure.
    #[instrument(skip(self))]
    pub async fn recent(&self, page_size: u32) -> Result<Option<Vec<ActivityRecord>>> {
        let token = self.auth.bearer_token().await?;
        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{ACTIVITY_API_BASE}/activity:query"),
        )
        .bearer_token(token)
        .json(&serde_json::json!({ "pageSize": page_size }))
        .map_err(DriveError::from_transport)?;

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

        let query: ActivityQueryResponse = serde_json::from_slice(&response.body)
            .map_err(|e| DriveError::Parse(e.to_string()))?;

        match query.activities {
            Some(records) if !records.is_empty() => {
                info!(count = records.len(), "fetched recent drive activity");
                Ok(Some(records))
            }
            _ => {
                info!("no recent drive activity");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use core_session::{
        AccessToken, ByteReader, ConsentOutcome, HttpClient, HttpError, HttpResponse,
    };
    use mockall::mock;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, HttpError>;
            async fn open_stream(&self, request: HttpRequest) -> std::result::Result<ByteReader, HttpError>;
        }
    }

    fn seeded_client(http: MockHttp) -> DriveActivityClient {
        let outcome = ConsentOutcome {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            access: AccessToken::new("test-token", 3600),
            refresh_token: Some("rt".to_string()),
        };
        DriveActivityClient::new(Arc::new(AuthorizedClient::from_consent(
            Arc::new(http),
            outcome,
        )))
    }

    #[tokio::test]
    async fn sends_page_size_in_query_body() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|request| {
            assert!(request.url.ends_with("/activity:query"));
            let body: serde_json::Value =
                serde_json::from_slice(&request.body.unwrap()).unwrap();
            assert_eq!(body["pageSize"], 25);
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from(r#"{"activities":[{"primaryActionDetail":{"edit":{}}}]}"#),
            })
        });

        let records = seeded_client(http).recent(25).await.unwrap();
        assert_eq!(records.map(|r| r.len()), Some(1));
    }

    #[tokio::test]
    async fn empty_activities_is_none_not_error() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from(r#"{"activities":[]}"#),
            })
        });

        let records = seeded_client(http).recent(DEFAULT_PAGE_SIZE).await.unwrap();
        assert!(records.is_none());
    }

    #[tokio::test]
    async fn absent_activities_field_is_none() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from("{}"),
            })
        });

        let records = seeded_client(http).recent(DEFAULT_PAGE_SIZE).await.unwrap();
        assert!(records.is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_api_error() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(HttpError::Transport("connection refused".to_string())));

        let result = seeded_client(http).recent(DEFAULT_PAGE_SIZE).await;
        assert!(matches!(result, Err(DriveError::Api { status: None, .. })));
    }

    #[tokio::test]
    async fn records_pass_through_unmodified() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 200,
                body: Bytes::from(
                    r#"{"activities":[{"timestamp":"2023-06-01T00:00:00Z","targets":[{"driveItem":{"name":"items/f1"}}]}]}"#,
                ),
            })
        });

        let records = seeded_client(http)
            .recent(DEFAULT_PAGE_SIZE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(records[0]["targets"][0]["driveItem"]["name"], "items/f1");
    }
}
