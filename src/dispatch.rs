//! Alert dispatch
//!
//! Fans a fired alert out to its side channels: UI toast/banner over the
//! alert channel, OS notification, and audible tone. Every channel is
//! best-effort; failures are logged and never propagate back into the
//! notifier or alarm state machines.

use std::time::Duration;

use crate::config::AppConfig;
use crate::event::Event;
use crate::notifier::{ThresholdAlert, Urgency};
use crate::notify::DesktopNotifier;
use crate::sound::{urgency_tone, TonePlayer};
use crate::ui::{UiAlert, UiAlertSender};

/// Critical alerts repeat the tone at these offsets.
const CRITICAL_TONE_OFFSETS: [Duration; 3] = [
    Duration::ZERO,
    Duration::from_millis(600),
    Duration::from_millis(1200),
];

/// Owns the side channels and performs alert side effects.
pub struct AlertDispatcher {
    desktop: DesktopNotifier,
    tones: TonePlayer,
    ui_tx: UiAlertSender,
}

impl AlertDispatcher {
    pub fn new(config: &AppConfig, ui_tx: UiAlertSender) -> Self {
        Self {
            desktop: DesktopNotifier::new(config.notifications.clone()),
            tones: TonePlayer::new(&config.sound),
            ui_tx,
        }
    }

    /// A cloneable tone handle for the alarm manager's repeat timer.
    pub fn tone_handle(&self) -> crate::sound::ToneHandle {
        self.tones.handle()
    }

    /// Toast + OS notification + tone for one threshold alert.
    pub fn dispatch_threshold(&self, alert: &ThresholdAlert) {
        let time_text = alert.remaining.humanize();
        let message = match &alert.event.description {
            Some(description) => format!(
                "{} {}\n{} {}\n{}",
                alert.urgency.emoji(),
                alert.urgency.headline(),
                alert.event.name,
                time_text,
                description
            ),
            None => format!(
                "{} {}\n{} {}",
                alert.urgency.emoji(),
                alert.urgency.headline(),
                alert.event.name,
                time_text
            ),
        };

        self.send_ui(UiAlert::Toast {
            event_id: alert.event.id,
            message,
            urgency: alert.urgency,
            duration: alert.urgency.toast_duration(),
        });

        self.desktop
            .notify_threshold(&alert.event, alert.urgency, &time_text);

        let tone = urgency_tone(alert.urgency);
        if alert.urgency == Urgency::Critical {
            self.tones.handle().play_times(tone, &CRITICAL_TONE_OFFSETS);
        } else {
            self.tones.handle().play(tone);
        }
    }

    /// Banner + persistent OS notification for a freshly armed alarm.
    /// The initial and repeating tones are driven by the alarm manager's
    /// repeat timer.
    pub fn dispatch_alarm_armed(&self, event: &Event) {
        self.send_ui(UiAlert::Banner {
            event_id: event.id,
            title: format!("🚨 EVENT NOW: {}", event.name),
            body: event
                .description
                .clone()
                .unwrap_or_else(|| "Your event is happening now!".to_string()),
        });
        self.desktop.notify_alarm(event);
    }

    /// Tear down the banner for a stopped or expired alarm.
    pub fn dismiss_banner(&self, event_id: crate::event::EventId) {
        self.send_ui(UiAlert::BannerDismiss { event_id });
    }

    fn send_ui(&self, alert: UiAlert) {
        if self.ui_tx.send(alert).is_err() {
            tracing::warn!("UI alert channel closed, dropping alert");
        }
    }
}
