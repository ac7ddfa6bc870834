//! Threshold notifier
//!
//! Watches events entering urgency bands and fires a one-shot alert per
//! band per event. Bands are evaluated most-urgent-first; the first match
//! wins for a tick. Dedup is keyed by `(event, hour bucket)` so at most
//! one alert fires per rolling hour of remaining time, plus exactly one
//! alert on entering the 24-hour window. This module is pure state
//! machine; side effects (toast, OS notification, tone) live in
//! `dispatch`.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::event::{time_until, Event, EventId, TimeRemaining};

/// Urgency bands, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    /// At most 5 minutes remaining
    Critical,
    /// At most 30 minutes remaining
    High,
    /// At most 60 minutes remaining
    Medium,
    /// Entering the 24-hour window
    Low,
}

impl Urgency {
    /// How long the UI toast stays up.
    pub fn toast_duration(self) -> Duration {
        match self {
            Urgency::Critical => Duration::from_secs(8),
            Urgency::High | Urgency::Medium => Duration::from_secs(5),
            Urgency::Low => Duration::from_secs(4),
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Urgency::Critical => "🚨",
            Urgency::High | Urgency::Medium => "⚠️",
            Urgency::Low => "📅",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Urgency::Critical => "URGENT EVENT ALERT",
            Urgency::High | Urgency::Medium => "Event Reminder",
            Urgency::Low => "Upcoming Event",
        }
    }
}

/// Dedup record: presence means that band's alert already fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BandKey {
    /// One alert per rolling hour of remaining time.
    HourBucket(EventId, i64),
    /// One-shot marker for entering the 24-hour window.
    Entry24h(EventId),
}

impl BandKey {
    fn event_id(self) -> EventId {
        match self {
            BandKey::HourBucket(id, _) | BandKey::Entry24h(id) => id,
        }
    }
}

/// A qualifying, non-duplicate band transition observed this tick.
#[derive(Debug, Clone)]
pub struct ThresholdAlert {
    pub event: Event,
    pub urgency: Urgency,
    pub remaining: TimeRemaining,
}

/// Per-(event, band) one-shot alert state machine.
pub struct ThresholdNotifier {
    notified: HashSet<BandKey>,
}

impl ThresholdNotifier {
    pub fn new() -> Self {
        Self {
            notified: HashSet::new(),
        }
    }

    /// Evaluate the imminent set for `now`, recording dedup keys and
    /// returning the alerts to dispatch. Dedup records for events no
    /// longer imminent are pruned first.
    pub fn evaluate(&mut self, imminent: &[&Event], now: DateTime<Utc>) -> Vec<ThresholdAlert> {
        self.prune(imminent);

        let mut alerts = Vec::new();
        for event in imminent {
            let Some(remaining) = time_until(event, now) else {
                continue;
            };
            let total_minutes = remaining.total_minutes();
            let bucket_key = BandKey::HourBucket(event.id, total_minutes / 60);
            if self.notified.contains(&bucket_key) {
                continue;
            }

            let urgency = if total_minutes <= 5 {
                Urgency::Critical
            } else if total_minutes <= 30 {
                Urgency::High
            } else if total_minutes <= 60 {
                Urgency::Medium
            } else if total_minutes <= 24 * 60 {
                // Entering the 24h window fires once, independent of the
                // repeating hourly key.
                let entry_key = BandKey::Entry24h(event.id);
                if !self.notified.insert(entry_key) {
                    continue;
                }
                Urgency::Low
            } else {
                continue;
            };

            self.notified.insert(bucket_key);
            alerts.push(ThresholdAlert {
                event: (*event).clone(),
                urgency,
                remaining,
            });
        }
        alerts
    }

    /// Drop all dedup state for an event, immediately (used on delete).
    pub fn purge_event(&mut self, id: EventId) {
        self.notified.retain(|key| key.event_id() != id);
    }

    fn prune(&mut self, imminent: &[&Event]) {
        let tracked: HashSet<EventId> = imminent.iter().map(|event| event.id).collect();
        self.notified.retain(|key| tracked.contains(&key.event_id()));
    }

    /// Number of live dedup records.
    pub fn tracked_len(&self) -> usize {
        self.notified.len()
    }
}

impl Default for ThresholdNotifier {
    fn default() -> Self {
        Self::new()
    }
}
