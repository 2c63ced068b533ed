use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled reminder event as the gateway returns it.
///
/// Server-confirmed events carry a server-assigned `id`; events created
/// optimistically on this device carry a `temp-<millis>` id until the next
/// full refresh replaces them with server truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub event_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub reminder_minutes: i64,
}

impl Event {
    pub fn time_display(&self) -> String {
        self.event_time.format("%a %b %d, %H:%M").to_string()
    }
}

/// Opaque pagination token (the backend's `lastEvaluatedKey` record).
/// Round-trips verbatim; compared structurally for the stale-fetch guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(pub serde_json::Value);

#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub user_id: String,
    pub upcoming_only: bool,
    pub limit: u32,
    pub cursor: Option<PageCursor>,
}

/// One fetched page: the events plus the cursor for the next page,
/// `None` when the backend reports no further pages.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub events: Vec<Event>,
    pub next_cursor: Option<PageCursor>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub user_id: String,
    pub title: String,
    pub event_time: DateTime<Utc>,
}

/// Partial update body; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
}
