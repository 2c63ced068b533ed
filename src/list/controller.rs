use chrono::{DateTime, Utc};

use crate::api::{ApiError, Event, ListPage, ListParams, PageCursor};

use super::optimistic::OptimisticUpdates;
use super::reconcile::{reconcile, SortDirection};

pub const INITIAL_LIMIT: u32 = 10;
pub const LIMIT_INCREMENT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    Upcoming,
    All,
}

impl EventFilter {
    pub fn toggled(self) -> Self {
        match self {
            EventFilter::Upcoming => EventFilter::All,
            EventFilter::All => EventFilter::Upcoming,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Fetching,
    FetchingMore,
    Error,
}

/// The filter/cursor state a fetch was issued under. A response whose
/// snapshot no longer matches the controller is stale and must be discarded,
/// so a slow response cannot overwrite state accumulated under newer
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSnapshot {
    generation: u64,
    filter: EventFilter,
    cursor: Option<PageCursor>,
}

#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub snapshot: FetchSnapshot,
    pub params: ListParams,
}

/// Owns the accumulated server page, the optimistic tracker, and the
/// pagination cursor for one list-screen session. All mutations go through
/// the intent methods below; the view only reads the cached reconciled
/// sequence.
pub struct ListController {
    user_id: String,
    filter: EventFilter,
    sort: SortDirection,
    limit: u32,
    cursor: Option<PageCursor>,
    phase: Phase,
    generation: u64,
    server_events: Vec<Event>,
    optimistic: OptimisticUpdates,
    visible: Vec<Event>,
    error: Option<String>,
    last_temp_millis: i64,
}

impl ListController {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            filter: EventFilter::Upcoming,
            sort: SortDirection::Asc,
            limit: INITIAL_LIMIT,
            cursor: None,
            phase: Phase::Idle,
            generation: 0,
            server_events: Vec::new(),
            optimistic: OptimisticUpdates::default(),
            visible: Vec::new(),
            error: None,
            last_temp_millis: 0,
        }
    }

    /// Reset pagination and optimistic state and start a full fetch.
    /// Valid from any phase.
    pub fn reload(&mut self) -> FetchPlan {
        self.generation += 1;
        self.cursor = None;
        self.limit = INITIAL_LIMIT;
        self.server_events.clear();
        self.optimistic.clear();
        self.error = None;
        self.phase = Phase::Fetching;
        self.refresh_view();
        self.plan()
    }

    /// Switching the filter is a new query: same reset as a reload.
    pub fn set_filter(&mut self, filter: EventFilter) -> Option<FetchPlan> {
        if filter == self.filter {
            return None;
        }
        self.filter = filter;
        Some(self.reload())
    }

    /// Sort is a presentation transform, not a query parameter: reorder the
    /// already-accumulated set without refetching.
    pub fn set_sort(&mut self, sort: SortDirection) {
        if sort != self.sort {
            self.sort = sort;
            self.refresh_view();
        }
    }

    /// Request the next page. No-op while a fetch is in flight or when the
    /// last response reported no further pages.
    pub fn load_more(&mut self) -> Option<FetchPlan> {
        if self.phase != Phase::Idle || self.cursor.is_none() {
            return None;
        }
        self.limit += LIMIT_INCREMENT;
        self.phase = Phase::FetchingMore;
        Some(self.plan())
    }

    /// Apply a list response. Stale responses (issued under an older
    /// generation, filter, or cursor) are discarded without touching state.
    pub fn apply_list_result(
        &mut self,
        snapshot: &FetchSnapshot,
        result: Result<ListPage, ApiError>,
    ) {
        if *snapshot != self.snapshot() {
            tracing::debug!(
                stale_generation = snapshot.generation,
                current_generation = self.generation,
                "discarding stale list response"
            );
            return;
        }

        match result {
            Ok(page) => {
                if self.phase == Phase::FetchingMore {
                    for event in page.events {
                        if !self.server_events.iter().any(|e| e.id == event.id) {
                            self.server_events.push(event);
                        }
                    }
                } else {
                    self.server_events = page.events;
                }
                self.cursor = page.next_cursor;
                self.error = None;
                self.phase = Phase::Idle;
                self.refresh_view();
            }
            Err(err) => {
                tracing::warn!(error = %err, "list fetch failed");
                // Accumulated events and cursor stay as they were.
                self.error = Some(err.to_string());
                self.phase = Phase::Error;
            }
        }
    }

    /// Create the optimistic entry for a new event and return it so the
    /// caller can issue the create request. Temp ids are monotonic within the
    /// session, so two adds in the same millisecond cannot collide.
    pub fn begin_add(
        &mut self,
        title: String,
        event_time: DateTime<Utc>,
        reminder_minutes: i64,
        now: DateTime<Utc>,
    ) -> Event {
        let millis = now.timestamp_millis().max(self.last_temp_millis + 1);
        self.last_temp_millis = millis;

        let event = Event {
            id: format!("temp-{millis}"),
            title,
            event_time,
            created_at: now,
            user_id: self.user_id.clone(),
            reminder_minutes,
        };
        self.optimistic.begin_add(event.clone());
        self.refresh_view();
        event
    }

    pub fn confirm_add(&mut self, temp_id: &str, confirmed: Event) {
        self.optimistic.confirm_add(temp_id, confirmed);
        self.refresh_view();
    }

    pub fn fail_add(&mut self, temp_id: &str) {
        self.optimistic.fail_add(temp_id);
        self.refresh_view();
    }

    /// Mark `id` for deletion if it is eligible: present in the accumulated
    /// server page and not already pending. Returns whether the delete
    /// request should be issued.
    pub fn request_delete(&mut self, id: &str) -> bool {
        if self.optimistic.is_pending(id) {
            return false;
        }
        if !self.server_events.iter().any(|e| e.id == id) {
            return false;
        }
        self.optimistic.begin_delete(id);
        self.refresh_view();
        true
    }

    /// The id stays hidden; the next fetch will no longer contain it.
    pub fn confirm_delete(&mut self, id: &str) {
        self.optimistic.confirm_delete(id);
    }

    pub fn fail_delete(&mut self, id: &str) {
        self.optimistic.fail_delete(id);
        self.refresh_view();
    }

    /// The reconciled, sorted sequence to render.
    pub fn events(&self) -> &[Event] {
        &self.visible
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.optimistic.is_pending(id)
    }

    pub fn is_pending_add(&self, id: &str) -> bool {
        self.optimistic.is_added(id)
    }

    pub fn is_pending_delete(&self, id: &str) -> bool {
        self.optimistic.is_deleted(id)
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Fetching
    }

    pub fn is_loading_more(&self) -> bool {
        self.phase == Phase::FetchingMore
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn filter(&self) -> EventFilter {
        self.filter
    }

    pub fn sort(&self) -> SortDirection {
        self.sort
    }

    fn snapshot(&self) -> FetchSnapshot {
        FetchSnapshot {
            generation: self.generation,
            filter: self.filter,
            cursor: self.cursor.clone(),
        }
    }

    fn plan(&self) -> FetchPlan {
        FetchPlan {
            snapshot: self.snapshot(),
            params: ListParams {
                user_id: self.user_id.clone(),
                upcoming_only: self.filter == EventFilter::Upcoming,
                limit: self.limit,
                cursor: self.cursor.clone(),
            },
        }
    }

    fn refresh_view(&mut self) {
        self.visible = reconcile(&self.server_events, &self.optimistic, self.sort);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn event(id: &str, time: &str) -> Event {
        Event {
            id: id.to_string(),
            title: format!("event {id}"),
            event_time: time.parse().unwrap(),
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            user_id: "device-1".to_string(),
            reminder_minutes: 0,
        }
    }

    fn page(events: Vec<Event>, next: Option<PageCursor>) -> ListPage {
        ListPage {
            events,
            next_cursor: next,
        }
    }

    fn cursor(id: &str) -> PageCursor {
        PageCursor(json!({ "id": id }))
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn reload_plans_an_initial_fetch() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();

        assert_eq!(plan.params.limit, INITIAL_LIMIT);
        assert_eq!(plan.params.cursor, None);
        assert!(plan.params.upcoming_only);
        assert!(ctl.is_loading());
    }

    #[test]
    fn successful_fetch_replaces_events_and_stores_cursor() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(
                vec![event("1", "2024-01-01T10:00:00Z")],
                Some(cursor("1")),
            )),
        );

        assert_eq!(ids(ctl.events()), vec!["1"]);
        assert!(!ctl.is_loading());
        assert!(ctl.has_more());
    }

    #[test]
    fn stale_response_is_discarded_after_filter_change() {
        let mut ctl = ListController::new("device-1");
        let upcoming_plan = ctl.reload();

        // Filter flips to All while the upcoming fetch is still in flight.
        let all_plan = ctl.set_filter(EventFilter::All).unwrap();
        ctl.apply_list_result(
            &all_plan.snapshot,
            Ok(page(vec![event("all-1", "2024-01-01T10:00:00Z")], None)),
        );

        // The late upcoming response must not overwrite the All state.
        ctl.apply_list_result(
            &upcoming_plan.snapshot,
            Ok(page(vec![event("up-1", "2024-02-01T10:00:00Z")], None)),
        );
        assert_eq!(ids(ctl.events()), vec!["all-1"]);
    }

    #[test]
    fn load_more_is_a_noop_without_cursor() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(vec![event("1", "2024-01-01T10:00:00Z")], None)),
        );
        assert!(ctl.load_more().is_none());
    }

    #[test]
    fn load_more_is_a_noop_while_fetch_in_flight() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        assert!(ctl.load_more().is_none());

        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(
                vec![event("1", "2024-01-01T10:00:00Z")],
                Some(cursor("1")),
            )),
        );
        let more = ctl.load_more().unwrap();
        assert!(ctl.is_loading_more());
        // Second trigger while the first is outstanding issues nothing.
        assert!(ctl.load_more().is_none());
        assert_eq!(more.params.limit, INITIAL_LIMIT + LIMIT_INCREMENT);
        assert_eq!(more.params.cursor, Some(cursor("1")));
    }

    #[test]
    fn load_more_appends_deduplicated_by_id() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(
                vec![
                    event("1", "2024-01-01T10:00:00Z"),
                    event("2", "2024-01-02T10:00:00Z"),
                ],
                Some(cursor("2")),
            )),
        );

        let more = ctl.load_more().unwrap();
        ctl.apply_list_result(
            &more.snapshot,
            Ok(page(
                vec![
                    event("2", "2024-01-02T10:00:00Z"),
                    event("3", "2024-01-03T10:00:00Z"),
                ],
                None,
            )),
        );

        assert_eq!(ids(ctl.events()), vec!["1", "2", "3"]);
        assert!(!ctl.has_more());
    }

    #[test]
    fn failed_load_more_preserves_accumulated_events() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(
                vec![event("1", "2024-01-01T10:00:00Z")],
                Some(cursor("1")),
            )),
        );

        let more = ctl.load_more().unwrap();
        ctl.apply_list_result(
            &more.snapshot,
            Err(ApiError::Network("connection reset".to_string())),
        );

        assert_eq!(ids(ctl.events()), vec!["1"]);
        assert_eq!(ctl.cursor, Some(cursor("1")));
        assert!(ctl.error().is_some());
    }

    #[test]
    fn reload_clears_optimistic_state_and_pagination() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(
                vec![event("1", "2024-01-01T10:00:00Z")],
                Some(cursor("1")),
            )),
        );
        ctl.begin_add(
            "dentist".to_string(),
            "2024-03-01T10:00:00Z".parse().unwrap(),
            0,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(ctl.request_delete("1"));

        let plan = ctl.reload();
        assert_eq!(plan.params.limit, INITIAL_LIMIT);
        assert_eq!(plan.params.cursor, None);
        assert!(ctl.events().is_empty());
        assert!(!ctl.is_pending("1"));
    }

    #[test]
    fn sort_change_reorders_without_refetch() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(
                vec![
                    event("1", "2024-01-01T10:00:00Z"),
                    event("2", "2024-01-02T10:00:00Z"),
                ],
                None,
            )),
        );

        ctl.set_sort(SortDirection::Desc);
        assert_eq!(ids(ctl.events()), vec!["2", "1"]);
        // No phase change: nothing was issued.
        assert!(!ctl.is_loading() && !ctl.is_loading_more());
    }

    #[test]
    fn delete_is_refused_for_pending_entries() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(vec![event("1", "2024-01-01T10:00:00Z")], None)),
        );

        assert!(ctl.request_delete("1"));
        // A second delete while the first is unresolved is not issued.
        assert!(!ctl.request_delete("1"));

        // Unconfirmed adds cannot be deleted either.
        let temp = ctl.begin_add(
            "dentist".to_string(),
            "2024-03-01T10:00:00Z".parse().unwrap(),
            0,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(!ctl.request_delete(&temp.id));
    }

    #[test]
    fn failed_delete_restores_the_row() {
        let mut ctl = ListController::new("device-1");
        let plan = ctl.reload();
        ctl.apply_list_result(
            &plan.snapshot,
            Ok(page(vec![event("1", "2024-01-01T10:00:00Z")], None)),
        );

        assert!(ctl.request_delete("1"));
        assert_eq!(ids(ctl.events()), Vec::<&str>::new());
        ctl.fail_delete("1");
        assert_eq!(ids(ctl.events()), vec!["1"]);
    }

    #[test]
    fn temp_ids_are_unique_within_a_millisecond() {
        let mut ctl = ListController::new("device-1");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let a = ctl.begin_add("a".to_string(), now, 0, now);
        let b = ctl.begin_add("b".to_string(), now, 0, now);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("temp-") && b.id.starts_with("temp-"));
    }

    #[test]
    fn confirmed_add_stays_visible_under_its_temp_id() {
        let mut ctl = ListController::new("device-1");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let temp = ctl.begin_add(
            "dentist".to_string(),
            "2024-03-01T10:00:00Z".parse().unwrap(),
            0,
            now,
        );

        let confirmed = event("srv-7", "2024-03-01T10:00:00Z");
        ctl.confirm_add(&temp.id, confirmed);

        assert_eq!(ids(ctl.events()), vec![temp.id.as_str()]);
        assert!(ctl.is_pending(&temp.id));
    }
}
