//! Reminder engine
//!
//! The single long-lived controller owning the clock, the event store,
//! the threshold notifier and the live alarm manager. `run` drives a
//! 1-second tick loop and multiplexes it with the alarm expiry channel
//! and the command channel from the embedding client.
//!
//! Required sequencing within one tick:
//!
//! 1. `clock.refresh()` — one "now" for every observer this tick
//! 2. `store.sweep(now)` — auto-completion happens-before alert
//!    evaluation
//! 3. `notifier.evaluate` over the imminent set
//! 4. `alarms.evaluate` over all events, with the ids swept in step 2
//!    still eligible to arm
//!
//! Deleting an event cancels its armed alarm and purges its notifier
//! dedup state in the same command handling, not on the next tick.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::alarm::{ExpiryReceiver, LiveAlarmManager};
use crate::backend::{EventRepository, IdentityProvider};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::dispatch::AlertDispatcher;
use crate::error::{DuebellError, Result, StoreResult};
use crate::event::{Event, EventId, NewEvent};
use crate::notifier::ThresholdNotifier;
use crate::store::EventStore;
use crate::ui::UiAlertSender;

/// Commands from the embedding client.
pub enum EngineCommand {
    AddEvent {
        event: NewEvent,
        reply: oneshot::Sender<StoreResult<Event>>,
    },
    DeleteEvent {
        id: EventId,
        reply: oneshot::Sender<StoreResult<Event>>,
    },
    MarkCompleted {
        id: EventId,
        reply: oneshot::Sender<StoreResult<()>>,
    },
    RestoreEvent {
        id: EventId,
        reply: oneshot::Sender<StoreResult<()>>,
    },
    /// Stop control on the alarm banner or the OS notification.
    StopAlarm { id: EventId },
    /// Re-fetch the current user's events from the repository (after
    /// login/logout).
    Reload {
        reply: oneshot::Sender<StoreResult<usize>>,
    },
    /// Read-only view of the store for rendering.
    Snapshot {
        reply: oneshot::Sender<StoreSnapshot>,
    },
    Shutdown,
}

/// Derived views at one instant, for the embedding client to render.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub now: chrono::DateTime<chrono::Utc>,
    pub upcoming: Vec<Event>,
    pub completed: Vec<Event>,
    pub imminent: Vec<Event>,
    pub next: Option<Event>,
    pub armed_alarms: Vec<EventId>,
}

/// Cloneable handle for talking to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    pub async fn add_event(&self, event: NewEvent) -> Result<StoreResult<Event>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::AddEvent { event, reply })?;
        rx.await.map_err(|_| DuebellError::EngineClosed)
    }

    pub async fn delete_event(&self, id: EventId) -> Result<StoreResult<Event>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::DeleteEvent { id, reply })?;
        rx.await.map_err(|_| DuebellError::EngineClosed)
    }

    pub async fn mark_completed(&self, id: EventId) -> Result<StoreResult<()>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::MarkCompleted { id, reply })?;
        rx.await.map_err(|_| DuebellError::EngineClosed)
    }

    pub async fn restore_event(&self, id: EventId) -> Result<StoreResult<()>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::RestoreEvent { id, reply })?;
        rx.await.map_err(|_| DuebellError::EngineClosed)
    }

    pub fn stop_alarm(&self, id: EventId) -> Result<()> {
        self.send(EngineCommand::StopAlarm { id })
    }

    pub async fn reload(&self) -> Result<StoreResult<usize>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Reload { reply })?;
        rx.await.map_err(|_| DuebellError::EngineClosed)
    }

    pub async fn snapshot(&self) -> Result<StoreSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot { reply })?;
        rx.await.map_err(|_| DuebellError::EngineClosed)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(EngineCommand::Shutdown)
    }

    fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| DuebellError::EngineClosed)
    }
}

/// Tick-driven notification and state-transition engine.
pub struct ReminderEngine {
    clock: Clock,
    store: EventStore,
    notifier: ThresholdNotifier,
    alarms: LiveAlarmManager,
    dispatcher: AlertDispatcher,
    expiry_rx: ExpiryReceiver,
    cmd_rx: mpsc::UnboundedReceiver<EngineCommand>,
    tick_interval: std::time::Duration,
}

impl ReminderEngine {
    pub fn new(
        config: &AppConfig,
        clock: Clock,
        repository: Arc<dyn EventRepository>,
        identity: Arc<dyn IdentityProvider>,
        ui_tx: UiAlertSender,
    ) -> (Self, EngineHandle) {
        let dispatcher = AlertDispatcher::new(config, ui_tx);
        let (alarms, expiry_rx) =
            LiveAlarmManager::new(config.alarm.clone(), dispatcher.tone_handle());
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let engine = Self {
            clock,
            store: EventStore::new(repository, identity),
            notifier: ThresholdNotifier::new(),
            alarms,
            dispatcher,
            expiry_rx,
            cmd_rx,
            tick_interval: std::time::Duration::from_secs(1),
        };
        (engine, EngineHandle { tx: cmd_tx })
    }

    /// Drive the engine until shutdown. Releases all armed alarms on the
    /// way out.
    pub async fn run(mut self) {
        if let Err(err) = self.store.load() {
            warn!("Initial event load failed: {err}");
        }
        info!(events = self.store.len(), "Reminder engine started");

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_tick(),
                Some(id) = self.expiry_rx.recv() => self.on_alarm_expired(id),
                command = self.cmd_rx.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
            }
        }

        self.alarms.shutdown();
        info!("Reminder engine stopped");
    }

    fn on_tick(&mut self) {
        let now = self.clock.refresh();

        // Sweep first: completion this tick is visible to both alert
        // evaluations below.
        let swept = self.store.sweep(now);

        let imminent = self.store.imminent(now);
        let alerts = self.notifier.evaluate(&imminent, now);
        for alert in &alerts {
            debug!(
                id = %alert.event.id,
                urgency = ?alert.urgency,
                "Threshold alert fired"
            );
            self.dispatcher.dispatch_threshold(alert);
        }

        let armed = self.alarms.evaluate(self.store.events(), now, &swept);
        for event in &armed {
            self.dispatcher.dispatch_alarm_armed(event);
        }
    }

    fn on_alarm_expired(&mut self, id: EventId) {
        if self.alarms.stop(id) {
            debug!(id = %id, "Live alarm expired");
            self.dispatcher.dismiss_banner(id);
        }
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::AddEvent { event, reply } => {
                let result = self.store.create(event, self.clock.now());
                let _ = reply.send(result);
            }
            EngineCommand::DeleteEvent { id, reply } => {
                let result = self.store.remove(id);
                if result.is_ok() {
                    // Immediate cancellation: no dangling timers or dedup
                    // records for a removed event.
                    if self.alarms.remove_event(id) {
                        self.dispatcher.dismiss_banner(id);
                    }
                    self.notifier.purge_event(id);
                }
                let _ = reply.send(result);
            }
            EngineCommand::MarkCompleted { id, reply } => {
                let result = self.store.mark_completed(id, self.clock.now());
                let _ = reply.send(result);
            }
            EngineCommand::RestoreEvent { id, reply } => {
                let _ = reply.send(self.store.restore(id));
            }
            EngineCommand::StopAlarm { id } => {
                if self.alarms.stop(id) {
                    self.dispatcher.dismiss_banner(id);
                }
            }
            EngineCommand::Reload { reply } => {
                let _ = reply.send(self.store.load());
            }
            EngineCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            // Handled in the select loop.
            EngineCommand::Shutdown => {}
        }
    }

    fn snapshot(&self) -> StoreSnapshot {
        let now = self.clock.now();
        StoreSnapshot {
            now,
            upcoming: self.store.upcoming(now).into_iter().cloned().collect(),
            completed: self.store.completed().into_iter().cloned().collect(),
            imminent: self.store.imminent(now).into_iter().cloned().collect(),
            next: self.store.next_event(now).cloned(),
            armed_alarms: self.alarms.armed_ids(),
        }
    }
}
