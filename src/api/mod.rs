pub mod client;
pub mod types;

pub use client::{ApiError, EventGateway, HttpGateway};
pub use types::{CreateEvent, Event, ListPage, ListParams, PageCursor, UpdateEvent};
