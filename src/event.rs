//! Event data model and countdown arithmetic
//!
//! An [`Event`] combines a calendar date and a time of day into one fixed
//! target instant. [`time_until`] decomposes the distance to that instant
//! into whole days/hours/minutes/seconds for countdown display and
//! urgency classification.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an event
pub type EventId = Uuid;

/// A scheduled event being counted down to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier (assigned by the repository on creation)
    pub id: EventId,
    /// Event name (never empty)
    pub name: String,
    /// Calendar date of the event
    pub date: NaiveDate,
    /// Time of day of the event
    pub time: NaiveTime,
    /// Optional free-form description
    pub description: Option<String>,
    /// Instant the event was created
    pub created_at: DateTime<Utc>,
    /// Whether the event has completed (auto or manual)
    pub completed: bool,
    /// Instant the event completed, set when `completed` flips true
    pub completed_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Mint an event from a construction payload.
    pub fn from_new(id: EventId, new_event: NewEvent, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new_event.name,
            date: new_event.date,
            time: new_event.time,
            description: new_event.description,
            created_at,
            completed: false,
            completed_at: None,
        }
    }

    /// The target instant this event occurs at. Fixed after creation.
    pub fn target(&self) -> DateTime<Utc> {
        self.date.and_time(self.time).and_utc()
    }
}

/// Construction-only payload for a new event. No id, no completion state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub description: Option<String>,
}

/// Remaining time to an event, decomposed into whole units.
///
/// Calendar-agnostic duration decomposition: each component is computed
/// from the remainder of the next larger unit, truncating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeRemaining {
    /// Total whole minutes remaining (seconds truncated away).
    pub fn total_minutes(&self) -> i64 {
        self.days * 24 * 60 + self.hours * 60 + self.minutes
    }

    /// Human-readable countdown text, e.g. "in 2d 3h 4m" or "now".
    pub fn humanize(&self) -> String {
        if self.days > 0 {
            format!("in {}d {}h {}m", self.days, self.hours, self.minutes)
        } else if self.hours > 0 {
            format!("in {}h {}m", self.hours, self.minutes)
        } else if self.minutes > 0 {
            format!("in {}m", self.minutes)
        } else {
            "now".to_string()
        }
    }
}

/// Remaining time to `event`'s target instant, or `None` if it has
/// already been reached or passed.
pub fn time_until(event: &Event, now: DateTime<Utc>) -> Option<TimeRemaining> {
    let millis = (event.target() - now).num_milliseconds();
    if millis <= 0 {
        return None;
    }

    let days = millis / (1000 * 60 * 60 * 24);
    let hours = (millis % (1000 * 60 * 60 * 24)) / (1000 * 60 * 60);
    let minutes = (millis % (1000 * 60 * 60)) / (1000 * 60);
    let seconds = (millis % (1000 * 60)) / 1000;

    Some(TimeRemaining {
        days,
        hours,
        minutes,
        seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event_at(target: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            date: target.date_naive(),
            time: target.time(),
            description: None,
            created_at: target - Duration::days(1),
            completed: false,
            completed_at: None,
        }
    }

    fn base_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_target_combines_date_and_time() {
        let event = event_at(base_now());
        assert_eq!(event.target(), base_now());
    }

    #[test]
    fn test_time_until_decomposition() {
        let now = base_now();
        let event = event_at(
            now + Duration::days(2) + Duration::hours(3) + Duration::minutes(4) + Duration::seconds(5),
        );
        let remaining = time_until(&event, now).unwrap();
        assert_eq!(remaining.days, 2);
        assert_eq!(remaining.hours, 3);
        assert_eq!(remaining.minutes, 4);
        assert_eq!(remaining.seconds, 5);
    }

    #[test]
    fn test_time_until_reconstructs_delta() {
        let now = base_now();
        let delta = Duration::seconds(100_000);
        let event = event_at(now + delta);
        let r = time_until(&event, now).unwrap();
        let reconstructed =
            ((r.days * 24 + r.hours) * 60 + r.minutes) * 60 + r.seconds;
        assert_eq!(reconstructed, delta.num_seconds());
    }

    #[test]
    fn test_time_until_truncates_subsecond() {
        let now = base_now();
        let event = event_at(now + Duration::milliseconds(1500));
        let r = time_until(&event, now).unwrap();
        assert_eq!(r.seconds, 1);
        assert_eq!(r.total_minutes(), 0);
    }

    #[test]
    fn test_time_until_none_when_due_or_passed() {
        let now = base_now();
        assert!(time_until(&event_at(now), now).is_none());
        assert!(time_until(&event_at(now - Duration::seconds(1)), now).is_none());
    }

    #[test]
    fn test_total_minutes() {
        let r = TimeRemaining {
            days: 1,
            hours: 2,
            minutes: 3,
            seconds: 59,
        };
        assert_eq!(r.total_minutes(), 24 * 60 + 2 * 60 + 3);
    }

    #[test]
    fn test_humanize() {
        let now = base_now();
        let r = |d| time_until(&event_at(now + d), now).unwrap().humanize();
        assert_eq!(r(Duration::days(2) + Duration::hours(3)), "in 2d 3h 0m");
        assert_eq!(r(Duration::hours(3) + Duration::minutes(4)), "in 3h 4m");
        assert_eq!(r(Duration::minutes(5)), "in 5m");
        assert_eq!(r(Duration::seconds(30)), "now");
    }
}
