//! duebell
//!
//! Event-reminder countdown engine: users create named events with a
//! target date/time; the engine tracks them, surfaces live countdowns,
//! and emits escalating alerts (UI toast + OS notification + audible
//! tone) as events approach, plus a bounded-lifetime repeating alarm when
//! an event arrives. The library is embedded in an interactive client;
//! persistence and identity sit behind narrow collaborator traits.

pub mod alarm;
pub mod backend;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod logging;
pub mod notifier;
pub mod notify;
pub mod sound;
pub mod store;
pub mod ui;

pub use backend::{EventRepository, IdentityProvider, UserId};
pub use clock::Clock;
pub use config::AppConfig;
pub use engine::{EngineHandle, ReminderEngine, StoreSnapshot};
pub use error::{AuthError, DuebellError, PersistenceError, StoreError, ValidationError};
pub use event::{time_until, Event, EventId, NewEvent, TimeRemaining};
pub use notifier::Urgency;
pub use ui::{alert_channel, UiAlert};
