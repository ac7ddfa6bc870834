//! In-memory event store
//!
//! Owns the user's event collection and the completion flag. Mutations go
//! through the persistence collaborator first; on failure the in-memory
//! collection is left unchanged (no partial apply). Derived views are
//! pure, recomputed from the collection plus the caller-supplied "now".
//!
//! The auto-complete sweep is the only place completion is inferred
//! rather than explicitly requested. The engine runs it before alert
//! evaluation on every tick; see `engine`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::backend::{EventRepository, IdentityProvider, UserId};
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::event::{Event, EventId, NewEvent};

/// The user's events plus the collaborators that back them.
pub struct EventStore {
    events: Vec<Event>,
    repository: Arc<dyn EventRepository>,
    identity: Arc<dyn IdentityProvider>,
}

impl EventStore {
    pub fn new(repository: Arc<dyn EventRepository>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            events: Vec::new(),
            repository,
            identity,
        }
    }

    fn require_user(&self) -> StoreResult<UserId> {
        self.identity
            .current_user()
            .ok_or(StoreError::Unauthenticated)
    }

    /// Replace the collection with the current user's events from the
    /// repository. With no current user the collection is cleared.
    pub fn load(&mut self) -> StoreResult<usize> {
        let Some(user) = self.identity.current_user() else {
            self.events.clear();
            return Ok(0);
        };
        let events = self.repository.list(&user).map_err(StoreError::from)?;
        let count = events.len();
        self.events = events;
        info!(count, "Loaded events");
        Ok(count)
    }

    /// Validate and create a new event.
    ///
    /// Rejects an empty name and a target instant that is not strictly in
    /// the future. The repository mints the id and creation timestamp; on
    /// repository failure nothing is applied locally.
    pub fn create(&mut self, new_event: NewEvent, now: DateTime<Utc>) -> StoreResult<Event> {
        let user = self.require_user()?;

        if new_event.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let target = new_event.date.and_time(new_event.time).and_utc();
        if target <= now {
            return Err(ValidationError::PastTarget { target }.into());
        }

        let event = self.repository.create(&user, new_event)?;
        info!(id = %event.id, name = %event.name, target = %target, "Event created");
        self.events.push(event.clone());
        Ok(event)
    }

    /// Delete an event, repository first. Returns the removed event.
    pub fn remove(&mut self, id: EventId) -> StoreResult<Event> {
        self.require_user()?;
        let index = self
            .events
            .iter()
            .position(|event| event.id == id)
            .ok_or(StoreError::NotFound { id })?;
        self.repository.delete(id)?;
        let event = self.events.remove(index);
        info!(id = %id, name = %event.name, "Event deleted");
        Ok(event)
    }

    /// Explicitly mark an event completed, stamping `completed_at`.
    ///
    /// Manual completion before the due instant is a deliberate state: the
    /// event leaves the upcoming view and will never arm a live alarm.
    pub fn mark_completed(&mut self, id: EventId, now: DateTime<Utc>) -> StoreResult<()> {
        let event = self.get_mut(id)?;
        if !event.completed {
            event.completed = true;
            event.completed_at = Some(now);
            debug!(id = %id, "Event marked completed");
        }
        Ok(())
    }

    /// Clear completion, returning the event to the upcoming set.
    pub fn restore(&mut self, id: EventId) -> StoreResult<()> {
        let event = self.get_mut(id)?;
        event.completed = false;
        event.completed_at = None;
        debug!(id = %id, "Event restored to upcoming");
        Ok(())
    }

    /// Auto-complete sweep: flip every incomplete event whose target
    /// instant is at or before `now`, stamping `completed_at = now`.
    ///
    /// Idempotent: an already-completed event is never re-stamped.
    /// Returns the ids flipped by this sweep, so same-tick consumers can
    /// distinguish "completed just now" from "completed earlier".
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<EventId> {
        let mut swept = Vec::new();
        for event in &mut self.events {
            if !event.completed && event.target() <= now {
                event.completed = true;
                event.completed_at = Some(now);
                swept.push(event.id);
                debug!(id = %event.id, name = %event.name, "Event auto-completed");
            }
        }
        swept
    }

    fn get_mut(&mut self, id: EventId) -> StoreResult<&mut Event> {
        self.events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or(StoreError::NotFound { id })
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// All events, unordered.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Incomplete events with a future target, ascending by target.
    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<&Event> {
        let mut upcoming: Vec<&Event> = self
            .events
            .iter()
            .filter(|event| !event.completed && event.target() > now)
            .collect();
        upcoming.sort_by_key(|event| event.target());
        upcoming
    }

    /// Completed events, most recently completed first. Events completed
    /// without a stamp fall back to their target instant.
    pub fn completed(&self) -> Vec<&Event> {
        let mut completed: Vec<&Event> = self
            .events
            .iter()
            .filter(|event| event.completed)
            .collect();
        completed.sort_by_key(|event| {
            std::cmp::Reverse(event.completed_at.unwrap_or_else(|| event.target()))
        });
        completed
    }

    /// Incomplete events due within the next 24 hours.
    pub fn imminent(&self, now: DateTime<Utc>) -> Vec<&Event> {
        let horizon = now + Duration::hours(24);
        self.events
            .iter()
            .filter(|event| {
                let target = event.target();
                !event.completed && target > now && target <= horizon
            })
            .collect()
    }

    /// The soonest upcoming event.
    pub fn next_event(&self, now: DateTime<Utc>) -> Option<&Event> {
        self.events
            .iter()
            .filter(|event| !event.completed && event.target() > now)
            .min_by_key(|event| event.target())
    }
}
