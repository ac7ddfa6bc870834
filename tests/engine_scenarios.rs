//! End-to-end engine scenarios against a frozen clock and paused tokio
//! time. The clock drives event classification; tokio time drives the
//! tick loop and the alarm repeat/expiry timers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use duebell::backend::{InMemoryIdentity, InMemoryRepository};
use duebell::engine::ReminderEngine;
use duebell::ui::{UiAlert, UiAlertReceiver};
use duebell::{alert_channel, AppConfig, Clock, EngineHandle, NewEvent, Urgency};

fn base_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn new_event_at(name: &str, target: DateTime<Utc>) -> NewEvent {
    NewEvent {
        name: name.to_string(),
        date: target.date_naive(),
        time: target.time(),
        description: None,
    }
}

fn muted_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.notifications.enabled = false;
    config.sound.enabled = false;
    config
}

/// Engine wired to in-memory collaborators, running on the test runtime.
/// The engine owns a rodio output stream and is not `Send`, so it is
/// spawned locally; callers must run inside [`run_local`].
fn start_engine() -> (Clock, EngineHandle, UiAlertReceiver) {
    let clock = Clock::fixed(base_now());
    let repository = Arc::new(InMemoryRepository::new(clock.clone()));
    let identity = Arc::new(InMemoryIdentity::logged_in("alice"));
    let (ui_tx, ui_rx) = alert_channel();
    let (engine, handle) =
        ReminderEngine::new(&muted_config(), clock.clone(), repository, identity, ui_tx);
    tokio::task::spawn_local(engine.run());
    (clock, handle, ui_rx)
}

/// Drive a scenario inside a `LocalSet` so `spawn_local` has a context.
async fn run_local<T>(scenario: impl std::future::Future<Output = T>) -> T {
    tokio::task::LocalSet::new().run_until(scenario).await
}

/// Advance both time sources by whole seconds, letting each engine tick
/// observe a consistent clock.
async fn run_ticks(clock: &Clock, seconds: u64) {
    for _ in 0..seconds {
        clock.advance(ChronoDuration::seconds(1));
        tokio::time::advance(Duration::from_secs(1)).await;
        // `advance` yields to the scheduler only once; yield again so
        // expiry messages hop from the timer task through the engine to
        // the UI channel within the same simulated second.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }
}

fn drain(rx: &mut UiAlertReceiver) -> Vec<UiAlert> {
    let mut alerts = Vec::new();
    while let Ok(alert) = rx.try_recv() {
        alerts.push(alert);
    }
    alerts
}

#[tokio::test(start_paused = true)]
async fn near_term_event_auto_completes() {
    run_local(async {
        let (clock, handle, _ui_rx) = start_engine();
        let created = handle
            .add_event(new_event_at("Standup", clock.now() + ChronoDuration::seconds(2)))
            .await
            .unwrap()
            .unwrap();
        let target = clock.now() + ChronoDuration::seconds(2);

        run_ticks(&clock, 3).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.upcoming.is_empty());
        assert_eq!(snapshot.completed.len(), 1);
        let completed = &snapshot.completed[0];
        assert_eq!(completed.id, created.id);
        assert_eq!(completed.name, "Standup");
        // completedAt stamps on the sweep tick at or just after the target.
        let completed_at = completed.completed_at.unwrap();
        assert!(completed_at >= target);
        assert!(completed_at <= target + ChronoDuration::seconds(1));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn thirty_minute_event_fires_one_alert() {
    run_local(async {
        let (clock, handle, mut ui_rx) = start_engine();
        handle
            .add_event(new_event_at("Review", clock.now() + ChronoDuration::minutes(30)))
            .await
            .unwrap()
            .unwrap();

        // First tick: 30 minutes remaining, inside the 30-minute band.
        run_ticks(&clock, 1).await;
        let alerts = drain(&mut ui_rx);
        let toasts: Vec<&UiAlert> = alerts
            .iter()
            .filter(|a| matches!(a, UiAlert::Toast { .. }))
            .collect();
        assert_eq!(toasts.len(), 1);
        match toasts[0] {
            UiAlert::Toast { urgency, message, .. } => {
                assert_eq!(*urgency, Urgency::High);
                assert!(message.contains("Review"));
            }
            _ => unreachable!(),
        }

        // Draining through 29m30s and beyond: same hour bucket, no repeats.
        run_ticks(&clock, 60).await;
        assert!(drain(&mut ui_rx).is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn alarm_arms_once_and_auto_expires() {
    run_local(async {
        let (clock, handle, mut ui_rx) = start_engine();
        let event = handle
            .add_event(new_event_at("Launch", clock.now() + ChronoDuration::seconds(1)))
            .await
            .unwrap()
            .unwrap();

        // Crossing the due instant arms exactly one alarm.
        run_ticks(&clock, 2).await;
        let alerts = drain(&mut ui_rx);
        let banners: Vec<&UiAlert> = alerts
            .iter()
            .filter(|a| matches!(a, UiAlert::Banner { .. }))
            .collect();
        assert_eq!(banners.len(), 1);
        match banners[0] {
            UiAlert::Banner { event_id, title, .. } => {
                assert_eq!(*event_id, event.id);
                assert!(title.contains("Launch"));
            }
            _ => unreachable!(),
        }
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.armed_alarms, vec![event.id]);

        // The alarm self-expires within 120 seconds; the banner comes down
        // and no timers remain.
        run_ticks(&clock, 121).await;
        let alerts = drain(&mut ui_rx);
        assert!(alerts.contains(&UiAlert::BannerDismiss { event_id: event.id }));
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.armed_alarms.is_empty());

        // Long after expiry: no re-arm, no further alerts.
        run_ticks(&clock, 60).await;
        assert!(drain(&mut ui_rx).is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn empty_name_is_rejected() {
    run_local(async {
        let (clock, handle, _ui_rx) = start_engine();
        let result = handle
            .add_event(new_event_at("", clock.now() + ChronoDuration::hours(1)))
            .await
            .unwrap();
        assert!(matches!(
            result,
            Err(duebell::StoreError::Validation(
                duebell::ValidationError::EmptyName
            ))
        ));

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.upcoming.is_empty());
        assert!(snapshot.completed.is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn deleting_an_armed_event_clears_its_alarm() {
    run_local(async {
        let (clock, handle, mut ui_rx) = start_engine();
        let event = handle
            .add_event(new_event_at("Call", clock.now() + ChronoDuration::seconds(1)))
            .await
            .unwrap()
            .unwrap();

        run_ticks(&clock, 2).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.armed_alarms, vec![event.id]);
        drain(&mut ui_rx);

        handle.delete_event(event.id).await.unwrap().unwrap();
        let alerts = drain(&mut ui_rx);
        assert!(alerts.contains(&UiAlert::BannerDismiss { event_id: event.id }));

        // Expiry would have fired at +120s; the cancelled timer stays silent
        // and nothing references the removed event.
        run_ticks(&clock, 150).await;
        assert!(drain(&mut ui_rx).is_empty());
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.armed_alarms.is_empty());
        assert!(snapshot.completed.is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn stopping_an_alarm_dismisses_the_banner() {
    run_local(async {
        let (clock, handle, mut ui_rx) = start_engine();
        let event = handle
            .add_event(new_event_at("Demo", clock.now() + ChronoDuration::seconds(1)))
            .await
            .unwrap()
            .unwrap();

        run_ticks(&clock, 2).await;
        drain(&mut ui_rx);

        handle.stop_alarm(event.id).unwrap();
        // Let the engine process the command.
        run_ticks(&clock, 1).await;
        let alerts = drain(&mut ui_rx);
        assert!(alerts.contains(&UiAlert::BannerDismiss { event_id: event.id }));

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.armed_alarms.is_empty());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn completed_event_stays_out_of_upcoming_until_restored() {
    run_local(async {
        let (clock, handle, _ui_rx) = start_engine();
        let event = handle
            .add_event(new_event_at("Prep", clock.now() + ChronoDuration::hours(2)))
            .await
            .unwrap()
            .unwrap();

        handle.mark_completed(event.id).await.unwrap().unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.upcoming.is_empty());
        assert_eq!(snapshot.completed.len(), 1);

        // Manually completed before its due instant: it never arms.
        run_ticks(&clock, 5).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.armed_alarms.is_empty());

        handle.restore_event(event.id).await.unwrap().unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.upcoming.len(), 1);
        assert!(snapshot.completed.is_empty());
    })
    .await;
}
