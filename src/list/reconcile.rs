use crate::api::Event;

use super::optimistic::OptimisticUpdates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Merge one accumulated server page with the pending optimistic state into
/// the sequence the UI renders: drop pending deletes, append pending adds,
/// sort by event time. Pure; re-running with the same inputs yields the same
/// sequence. Adds can never duplicate a server id because unconfirmed entries
/// carry temp ids and confirmed ones are evicted on the refresh that follows.
pub fn reconcile(
    server_events: &[Event],
    updates: &OptimisticUpdates,
    sort: SortDirection,
) -> Vec<Event> {
    let mut merged: Vec<Event> = server_events
        .iter()
        .filter(|e| !updates.is_deleted(&e.id))
        .cloned()
        .collect();
    merged.extend(updates.adds().iter().cloned());

    // Stable sort keeps relative order for equal timestamps.
    match sort {
        SortDirection::Asc => merged.sort_by(|a, b| a.event_time.cmp(&b.event_time)),
        SortDirection::Desc => merged.sort_by(|a, b| b.event_time.cmp(&a.event_time)),
    }
    merged
}
