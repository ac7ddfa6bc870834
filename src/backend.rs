//! Collaborator contracts for persistence and identity
//!
//! The core treats the durable event store and the session provider as
//! external collaborators behind narrow traits. Failures are closed kind
//! enums ([`PersistenceError`], [`AuthError`]); the core never inspects
//! message text. In-memory implementations ship here for tests and for
//! embedding without a backend.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AuthError, AuthResult, PersistenceError, PersistenceResult};
use crate::event::{Event, EventId, NewEvent};

/// Opaque user identifier assigned by the identity collaborator
pub type UserId = String;

/// Durable event storage.
///
/// Guarantees: `list` returns all non-deleted events for the user in an
/// unspecified order (the core re-sorts); `create` returns the event with
/// a server-assigned id and creation timestamp and never partially
/// creates.
pub trait EventRepository: Send + Sync {
    fn create(&self, user: &UserId, new_event: NewEvent) -> PersistenceResult<Event>;
    fn list(&self, user: &UserId) -> PersistenceResult<Vec<Event>>;
    fn delete(&self, id: EventId) -> PersistenceResult<()>;
}

/// Session and identity provider.
pub trait IdentityProvider: Send + Sync {
    /// The logged-in user, if any. "No current user" means the event
    /// collection is empty and all mutations are rejected.
    fn current_user(&self) -> Option<UserId>;
    fn login(&self, email: &str, password: &str) -> AuthResult<UserId>;
    fn logout(&self) -> AuthResult<()>;
    fn signup(&self, email: &str, password: &str, name: &str) -> AuthResult<UserId>;
}

/// In-memory [`EventRepository`], used in tests and backend-less clients.
///
/// Creation timestamps come from the shared [`Clock`], keeping stored
/// events deterministic under a frozen clock. `inject_failure` makes the
/// next operation fail, for exercising persistence error paths.
pub struct InMemoryRepository {
    events: Mutex<HashMap<EventId, (UserId, Event)>>,
    clock: Clock,
    next_failure: Mutex<Option<PersistenceError>>,
}

impl InMemoryRepository {
    pub fn new(clock: Clock) -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            clock,
            next_failure: Mutex::new(None),
        }
    }

    /// Make the next repository operation fail with `error`.
    pub fn inject_failure(&self, error: PersistenceError) {
        *lock(&self.next_failure) = Some(error);
    }

    fn take_failure(&self) -> PersistenceResult<()> {
        match lock(&self.next_failure).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Number of stored events across all users.
    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventRepository for InMemoryRepository {
    fn create(&self, user: &UserId, new_event: NewEvent) -> PersistenceResult<Event> {
        self.take_failure()?;
        let event = Event::from_new(Uuid::new_v4(), new_event, self.clock.now());
        lock(&self.events).insert(event.id, (user.clone(), event.clone()));
        Ok(event)
    }

    fn list(&self, user: &UserId) -> PersistenceResult<Vec<Event>> {
        self.take_failure()?;
        Ok(lock(&self.events)
            .values()
            .filter(|(owner, _)| owner == user)
            .map(|(_, event)| event.clone())
            .collect())
    }

    fn delete(&self, id: EventId) -> PersistenceResult<()> {
        self.take_failure()?;
        match lock(&self.events).remove(&id) {
            Some(_) => Ok(()),
            None => Err(PersistenceError::NotFound { id }),
        }
    }
}

/// In-memory [`IdentityProvider`] with a registered-account map, so
/// login/signup exercise the real error kinds.
pub struct InMemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<UserId>>,
}

struct Account {
    password: String,
    user_id: UserId,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
        }
    }

    /// An identity provider with one registered and logged-in user.
    pub fn logged_in(user_id: &str) -> Self {
        let identity = Self::new();
        lock(&identity.accounts).insert(
            format!("{user_id}@example.com"),
            Account {
                password: "password".to_string(),
                user_id: user_id.to_string(),
            },
        );
        *lock(&identity.current) = Some(user_id.to_string());
        identity
    }
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for InMemoryIdentity {
    fn current_user(&self) -> Option<UserId> {
        lock(&self.current).clone()
    }

    fn login(&self, email: &str, password: &str) -> AuthResult<UserId> {
        let accounts = lock(&self.accounts);
        let account = accounts
            .get(email)
            .filter(|account| account.password == password)
            .ok_or(AuthError::InvalidCredentials)?;
        let user_id = account.user_id.clone();
        drop(accounts);
        *lock(&self.current) = Some(user_id.clone());
        Ok(user_id)
    }

    fn logout(&self) -> AuthResult<()> {
        // Logging out without a session is not an error.
        *lock(&self.current) = None;
        Ok(())
    }

    fn signup(&self, email: &str, password: &str, _name: &str) -> AuthResult<UserId> {
        let mut accounts = lock(&self.accounts);
        if accounts.contains_key(email) {
            return Err(AuthError::InvalidCredentials);
        }
        let user_id = Uuid::new_v4().to_string();
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user_id: user_id.clone(),
            },
        );
        drop(accounts);
        *lock(&self.current) = Some(user_id.clone());
        Ok(user_id)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn sample_event() -> NewEvent {
        NewEvent {
            name: "Standup".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            description: Some("Daily sync".to_string()),
        }
    }

    fn frozen_clock() -> Clock {
        Clock::fixed(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_repository_create_and_list() {
        let clock = frozen_clock();
        let repo = InMemoryRepository::new(clock.clone());
        let user = "alice".to_string();

        let event = repo.create(&user, sample_event()).unwrap();
        assert_eq!(event.name, "Standup");
        assert_eq!(event.created_at, clock.now());
        assert!(!event.completed);

        let listed = repo.list(&user).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, event.id);

        // Other users see nothing.
        assert!(repo.list(&"bob".to_string()).unwrap().is_empty());
    }

    #[test]
    fn test_repository_delete() {
        let repo = InMemoryRepository::new(frozen_clock());
        let user = "alice".to_string();
        let event = repo.create(&user, sample_event()).unwrap();

        repo.delete(event.id).unwrap();
        assert!(repo.is_empty());

        let err = repo.delete(event.id).unwrap_err();
        assert_eq!(err, PersistenceError::NotFound { id: event.id });
    }

    #[test]
    fn test_repository_failure_injection() {
        let repo = InMemoryRepository::new(frozen_clock());
        let user = "alice".to_string();

        repo.inject_failure(PersistenceError::Network("timeout".to_string()));
        let err = repo.create(&user, sample_event()).unwrap_err();
        assert!(matches!(err, PersistenceError::Network(_)));
        assert!(repo.is_empty());

        // Failure is one-shot.
        assert!(repo.create(&user, sample_event()).is_ok());
    }

    #[test]
    fn test_identity_signup_login_logout() {
        let identity = InMemoryIdentity::new();
        assert!(identity.current_user().is_none());

        let user = identity.signup("a@example.com", "secret", "Alice").unwrap();
        assert_eq!(identity.current_user(), Some(user.clone()));

        identity.logout().unwrap();
        assert!(identity.current_user().is_none());

        let again = identity.login("a@example.com", "secret").unwrap();
        assert_eq!(again, user);
    }

    #[test]
    fn test_identity_rejects_bad_credentials() {
        let identity = InMemoryIdentity::new();
        identity.signup("a@example.com", "secret", "Alice").unwrap();
        identity.logout().unwrap();

        let err = identity.login("a@example.com", "wrong").unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert!(identity.current_user().is_none());

        let err = identity.signup("a@example.com", "other", "Alice").unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }
}
