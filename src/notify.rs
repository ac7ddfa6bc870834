//! Desktop notification side channel
//!
//! OS-level notifications over notify-rust. Best-effort and fire-and-
//! forget: dispatch requires the permission flag in config, and any
//! failure is logged and ignored. It never affects the state machines.

use notify_rust::{Notification, Timeout};

use crate::config::NotificationConfig;
use crate::event::Event;
use crate::notifier::Urgency;

/// Dispatches OS notifications for threshold alerts and live alarms.
pub struct DesktopNotifier {
    config: NotificationConfig,
}

impl DesktopNotifier {
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    /// Notification for a threshold alert. Persistent only for critical;
    /// others auto-close after the configured timeout.
    pub fn notify_threshold(&self, event: &Event, urgency: Urgency, time_text: &str) {
        if !self.config.enabled {
            return;
        }

        let body = match &event.description {
            Some(description) => format!("{} {}\n{}", event.name, time_text, description),
            None => format!("{} {}", event.name, time_text),
        };
        let timeout = if urgency == Urgency::Critical {
            Timeout::Never
        } else {
            Timeout::Milliseconds((self.config.timeout_seconds * 1000) as u32)
        };

        let result = Notification::new()
            .summary(&format!("{} {}", urgency.emoji(), urgency.headline()))
            .body(&body)
            .timeout(timeout)
            .show();

        if let Err(e) = result {
            tracing::warn!("Failed to show threshold notification: {e}");
        }
    }

    /// Persistent notification for a live alarm; stays up until the user
    /// interacts with it.
    pub fn notify_alarm(&self, event: &Event) {
        if !self.config.enabled {
            return;
        }

        let body = event
            .description
            .clone()
            .unwrap_or_else(|| "Your event is happening now!".to_string());

        let result = Notification::new()
            .summary(&format!("🚨 EVENT NOW: {}", event.name))
            .body(&body)
            .timeout(Timeout::Never)
            .show();

        if let Err(e) = result {
            tracing::warn!("Failed to show alarm notification: {e}");
        }
    }
}
