use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{CreateEvent, Event, ListPage, ListParams, PageCursor, UpdateEvent};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// The remote event gateway as the core consumes it. The HTTP client below is
/// the production implementation; tests substitute their own.
#[async_trait]
pub trait EventGateway: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<ListPage, ApiError>;
    async fn create(&self, req: &CreateEvent) -> Result<Event, ApiError>;
    async fn update(&self, id: &str, patch: &UpdateEvent) -> Result<Event, ApiError>;
    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
    // Session-expiry notice is surfaced once per client instance.
    session_notified: AtomicBool,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            session_notified: AtomicBool::new(false),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn error_from(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body),
            Err(e) => return ApiError::Network(e.to_string()),
        };

        if status == 404 {
            return ApiError::NotFound(message);
        }
        if matches!(status, 401 | 429)
            && is_session_message(&message)
            && !self.session_notified.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(%message, "session no longer valid");
            return ApiError::Server {
                status,
                message: "Your session has expired. Please log in again.".to_string(),
            };
        }
        if message == "ThrottlerException: Too Many Requests" {
            return ApiError::Server {
                status,
                message: "Too many requests. Please try again later.".to_string(),
            };
        }
        ApiError::Server { status, message }
    }
}

fn is_session_message(message: &str) -> bool {
    matches!(
        message,
        "Invalid Token"
            | "Session expired"
            | "You have been logged out"
            | "Authorization token not found"
    )
}

#[async_trait]
impl EventGateway for HttpGateway {
    async fn list(&self, params: &ListParams) -> Result<ListPage, ApiError> {
        let mut query = vec![
            ("userId", params.user_id.clone()),
            (
                "upcomingOnly",
                if params.upcoming_only { "true" } else { "false" }.to_string(),
            ),
            ("limit", params.limit.to_string()),
        ];
        if let Some(cursor) = &params.cursor {
            let encoded = serde_json::to_string(cursor)
                .map_err(|e| ApiError::Network(e.to_string()))?;
            query.push(("lastEvaluatedKey", encoded));
        }

        let response = self
            .client
            .get(self.url("/api/events"))
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }

        let envelope: ListEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::debug!(
            events = envelope.data.len(),
            has_more = envelope.meta.has_more,
            "fetched event page"
        );

        let next_cursor = if envelope.meta.has_more {
            envelope.meta.last_evaluated_key
        } else {
            None
        };
        Ok(ListPage {
            events: envelope.data,
            next_cursor,
        })
    }

    async fn create(&self, req: &CreateEvent) -> Result<Event, ApiError> {
        if req.title.trim().is_empty() {
            return Err(ApiError::Validation("title must not be empty".to_string()));
        }

        let response = self
            .client
            .post(self.url("/api/events"))
            .json(req)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn update(&self, id: &str, patch: &UpdateEvent) -> Result<Event, ApiError> {
        let response = self
            .client
            .patch(self.url(&format!("/api/events/{id}")))
            .json(patch)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/events/{id}")))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    data: Vec<Event>,
    meta: ListMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct ListMeta {
    limit: u32,
    has_more: bool,
    #[serde(default)]
    last_evaluated_key: Option<PageCursor>,
    #[serde(default)]
    page: u32,
}
