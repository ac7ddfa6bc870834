//! UI alert surface
//!
//! The core is a library embedded in an interactive client; toasts and
//! alarm banners are delivered to that client as [`UiAlert`] values over
//! an unbounded channel. The client owns rendering; the engine owns
//! when alerts appear and when banners are dismissed.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::event::EventId;
use crate::notifier::Urgency;

/// An alert for the embedding client to render.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAlert {
    /// Transient toast; auto-dismisses after `duration`.
    Toast {
        event_id: EventId,
        message: String,
        urgency: Urgency,
        duration: Duration,
    },
    /// Persistent alarm banner with a stop control. Stays up until the
    /// client sends `StopAlarm` or a `BannerDismiss` arrives.
    Banner {
        event_id: EventId,
        title: String,
        body: String,
    },
    /// Tear down the banner for an event (alarm stopped or expired).
    BannerDismiss { event_id: EventId },
}

/// Sending half handed to the engine.
pub type UiAlertSender = mpsc::UnboundedSender<UiAlert>;

/// Receiving half kept by the embedding client.
pub type UiAlertReceiver = mpsc::UnboundedReceiver<UiAlert>;

/// Create the alert channel connecting the engine to the client.
pub fn alert_channel() -> (UiAlertSender, UiAlertReceiver) {
    mpsc::unbounded_channel()
}
