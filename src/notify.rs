use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::api::Event;

/// Session-scoped reminder notices: each event fires at most once, when
/// `event_time - reminder_minutes` has passed and the event itself is still
/// ahead.
#[derive(Debug, Default)]
pub struct ReminderSchedule {
    fired: HashSet<String>,
}

impl ReminderSchedule {
    pub fn due(&mut self, events: &[Event], now: DateTime<Utc>) -> Vec<String> {
        let mut notices = Vec::new();
        for event in events {
            if event.event_time < now || self.fired.contains(&event.id) {
                continue;
            }
            let remind_at = event.event_time - Duration::minutes(event.reminder_minutes);
            if remind_at <= now {
                self.fired.insert(event.id.clone());
                notices.push(format!(
                    "Reminder: {} at {}",
                    event.title,
                    event.event_time.format("%H:%M")
                ));
            }
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, time: &str, reminder_minutes: i64) -> Event {
        Event {
            id: id.to_string(),
            title: format!("event {id}"),
            event_time: time.parse().unwrap(),
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            user_id: "device-1".to_string(),
            reminder_minutes,
        }
    }

    #[test]
    fn fires_once_inside_the_reminder_window() {
        let mut schedule = ReminderSchedule::default();
        let events = vec![event("1", "2024-01-01T10:00:00Z", 15)];

        let before: DateTime<Utc> = "2024-01-01T09:40:00Z".parse().unwrap();
        assert!(schedule.due(&events, before).is_empty());

        let inside: DateTime<Utc> = "2024-01-01T09:50:00Z".parse().unwrap();
        assert_eq!(schedule.due(&events, inside).len(), 1);

        // Same window, already fired.
        assert!(schedule.due(&events, inside).is_empty());
    }

    #[test]
    fn past_events_never_fire() {
        let mut schedule = ReminderSchedule::default();
        let events = vec![event("1", "2024-01-01T10:00:00Z", 30)];
        let after: DateTime<Utc> = "2024-01-01T10:01:00Z".parse().unwrap();
        assert!(schedule.due(&events, after).is_empty());
    }

    #[test]
    fn zero_lead_time_fires_at_event_time() {
        let mut schedule = ReminderSchedule::default();
        let events = vec![event("1", "2024-01-01T10:00:00Z", 0)];
        let at: DateTime<Utc> = "2024-01-01T10:00:00Z".parse().unwrap();
        assert_eq!(schedule.due(&events, at).len(), 1);
    }
}
