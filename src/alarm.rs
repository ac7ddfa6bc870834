//! Live alarm manager
//!
//! Detects an event crossing its due instant and runs a bounded-duration,
//! repeating, multi-channel alarm. Per-event lifecycle:
//!
//! ```text
//! idle -> armed -> expired | stopped
//! ```
//!
//! Arming spawns two tracked tasks: a repeat timer that plays the alarm
//! tone immediately and then every `repeat_interval`, and an expiry timer
//! that reports the alarm over the expiry channel after `expiry` elapses
//! (wall-clock, independent of the tick loop). Stopping, expiring or
//! dropping an alarm aborts both tasks. Expired and stopped are terminal:
//! an event only crosses its due instant once and never re-arms.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::AlarmConfig;
use crate::event::{Event, EventId};
use crate::sound::{alarm_tone, ToneHandle};

/// State of one armed alarm. Dropping it releases both timers.
pub struct LiveAlarm {
    pub started_at: DateTime<Utc>,
    repeat_task: JoinHandle<()>,
    expiry_task: JoinHandle<()>,
}

impl Drop for LiveAlarm {
    fn drop(&mut self) {
        self.repeat_task.abort();
        self.expiry_task.abort();
    }
}

/// Receives the ids of alarms whose expiry timer elapsed.
pub type ExpiryReceiver = mpsc::UnboundedReceiver<EventId>;

/// Per-event alarm state machine.
pub struct LiveAlarmManager {
    active: HashMap<EventId, LiveAlarm>,
    /// Events that already armed once; terminal states never re-arm.
    fired: HashSet<EventId>,
    config: AlarmConfig,
    tone: ToneHandle,
    expiry_tx: mpsc::UnboundedSender<EventId>,
}

impl LiveAlarmManager {
    /// Returns the manager plus the expiry channel the engine must drain:
    /// each received id is an alarm whose 2-minute lifetime elapsed and
    /// must be stopped via [`LiveAlarmManager::stop`].
    pub fn new(config: AlarmConfig, tone: ToneHandle) -> (Self, ExpiryReceiver) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        (
            Self {
                active: HashMap::new(),
                fired: HashSet::new(),
                config,
                tone,
                expiry_tx,
            },
            expiry_rx,
        )
    }

    /// Arm alarms for events that just crossed their due instant.
    ///
    /// An event arms when `now >= target` and `now - target` is within
    /// the arm window, it has no armed alarm and has never armed before,
    /// and it is not completed — except events in `just_swept`, which the
    /// auto-complete sweep flipped this same tick and which are still
    /// eligible. A completion from any earlier tick (manual completion
    /// included) blocks arming.
    ///
    /// Returns the newly armed events so the engine can dispatch their
    /// banner and OS notification.
    pub fn evaluate(
        &mut self,
        events: &[Event],
        now: DateTime<Utc>,
        just_swept: &[EventId],
    ) -> Vec<Event> {
        let mut armed = Vec::new();
        for event in events {
            if event.completed && !just_swept.contains(&event.id) {
                continue;
            }
            if self.active.contains_key(&event.id) || self.fired.contains(&event.id) {
                continue;
            }
            let since_due = now - event.target();
            if since_due < chrono::Duration::zero() || since_due >= self.config.arm_window() {
                continue;
            }
            self.arm(event, now);
            armed.push(event.clone());
        }
        armed
    }

    fn arm(&mut self, event: &Event, now: DateTime<Utc>) {
        let tone = self.tone.clone();
        let repeat_interval = self.config.repeat_interval();
        let repeat_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(repeat_interval);
            // First tick fires immediately: the arming tone.
            loop {
                ticker.tick().await;
                tone.play(alarm_tone());
            }
        });

        let id = event.id;
        let expiry = self.config.expiry();
        let expiry_tx = self.expiry_tx.clone();
        let expiry_task = tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            let _ = expiry_tx.send(id);
        });

        self.fired.insert(id);
        self.active.insert(
            id,
            LiveAlarm {
                started_at: now,
                repeat_task,
                expiry_task,
            },
        );
        info!(id = %id, name = %event.name, "Live alarm armed");
    }

    /// Stop an armed alarm, releasing both timers. Terminal: the event
    /// never re-arms. Returns false if no alarm was armed for `id`.
    pub fn stop(&mut self, id: EventId) -> bool {
        match self.active.remove(&id) {
            Some(_alarm) => {
                debug!(id = %id, "Live alarm stopped");
                true
            }
            None => false,
        }
    }

    /// The event was deleted: clear its alarm immediately, if any.
    pub fn remove_event(&mut self, id: EventId) -> bool {
        self.fired.remove(&id);
        self.stop(id)
    }

    /// Release every armed alarm's timers (process teardown).
    pub fn shutdown(&mut self) {
        let count = self.active.len();
        self.active.clear();
        if count > 0 {
            info!(count, "Released armed alarms on shutdown");
        }
    }

    pub fn is_armed(&self, id: EventId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn armed_count(&self) -> usize {
        self.active.len()
    }

    /// Ids of all currently armed alarms.
    pub fn armed_ids(&self) -> Vec<EventId> {
        self.active.keys().copied().collect()
    }
}
