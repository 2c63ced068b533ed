use crate::api::Event;

/// Pending local mutations not yet confirmed (or rolled back) by the gateway.
///
/// `adds` holds optimistically created events in creation order; `deletes`
/// holds ids hidden from the view while their delete request is in flight.
/// Lifecycle is one list session: a filter change or forced reload clears
/// everything wholesale.
#[derive(Debug, Clone, Default)]
pub struct OptimisticUpdates {
    adds: Vec<Event>,
    deletes: Vec<String>,
}

impl OptimisticUpdates {
    /// Make `event` visible immediately, ahead of server confirmation.
    pub fn begin_add(&mut self, event: Event) {
        self.adds.push(event);
    }

    /// Replace the pending entry's fields with server truth, keeping the temp
    /// id as the in-place key until the next full refresh so the rendered
    /// list identity does not churn mid-render. No-op if the entry was
    /// already evicted.
    pub fn confirm_add(&mut self, temp_id: &str, confirmed: Event) {
        if let Some(entry) = self.adds.iter_mut().find(|e| e.id == temp_id) {
            *entry = Event {
                id: temp_id.to_string(),
                ..confirmed
            };
        }
    }

    /// Roll back a failed add. Idempotent.
    pub fn fail_add(&mut self, temp_id: &str) {
        self.adds.retain(|e| e.id != temp_id);
    }

    /// Hide `id` while its delete is in flight. Idempotent.
    pub fn begin_delete(&mut self, id: &str) {
        if !self.deletes.iter().any(|d| d == id) {
            self.deletes.push(id.to_string());
        }
    }

    /// A confirmed delete stays in `deletes`: the next server fetch will no
    /// longer contain the id, and a reload clears the tracker wholesale.
    pub fn confirm_delete(&mut self, _id: &str) {}

    /// Roll back a failed delete, restoring visibility.
    pub fn fail_delete(&mut self, id: &str) {
        self.deletes.retain(|d| d != id);
    }

    pub fn clear(&mut self) {
        self.adds.clear();
        self.deletes.clear();
    }

    pub fn adds(&self) -> &[Event] {
        &self.adds
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        self.deletes.iter().any(|d| d == id)
    }

    pub fn is_added(&self, id: &str) -> bool {
        self.adds.iter().any(|e| e.id == id)
    }

    /// An id with an unresolved add or delete in flight.
    pub fn is_pending(&self, id: &str) -> bool {
        self.is_added(id) || self.is_deleted(id)
    }

    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.deletes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            title: "standup".to_string(),
            event_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            user_id: "device-1".to_string(),
            reminder_minutes: 0,
        }
    }

    #[test]
    fn failed_add_restores_prior_state() {
        let mut updates = OptimisticUpdates::default();
        updates.begin_add(event("temp-1"));
        updates.fail_add("temp-1");
        assert!(updates.is_empty());
    }

    #[test]
    fn confirm_add_keeps_temp_id_but_takes_server_fields() {
        let mut updates = OptimisticUpdates::default();
        updates.begin_add(event("temp-1"));

        let mut confirmed = event("srv-9");
        confirmed.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        updates.confirm_add("temp-1", confirmed.clone());

        let entry = &updates.adds()[0];
        assert_eq!(entry.id, "temp-1");
        assert_eq!(entry.created_at, confirmed.created_at);
    }

    #[test]
    fn confirm_add_for_evicted_entry_is_a_noop() {
        let mut updates = OptimisticUpdates::default();
        updates.confirm_add("temp-1", event("srv-9"));
        assert!(updates.is_empty());
    }

    #[test]
    fn begin_delete_is_idempotent() {
        let mut updates = OptimisticUpdates::default();
        updates.begin_delete("1");
        updates.begin_delete("1");
        updates.fail_delete("1");
        assert!(!updates.is_deleted("1"));
        assert!(updates.is_empty());
    }

    #[test]
    fn confirmed_delete_stays_hidden_until_cleared() {
        let mut updates = OptimisticUpdates::default();
        updates.begin_delete("1");
        updates.confirm_delete("1");
        assert!(updates.is_deleted("1"));
        updates.clear();
        assert!(!updates.is_deleted("1"));
    }

    #[test]
    fn pending_covers_both_directions() {
        let mut updates = OptimisticUpdates::default();
        updates.begin_add(event("temp-1"));
        updates.begin_delete("2");
        assert!(updates.is_pending("temp-1"));
        assert!(updates.is_pending("2"));
        assert!(!updates.is_pending("3"));
    }
}
