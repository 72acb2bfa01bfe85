//! Cross-module tests through the public API

use priceroom_ws_sdk::{
    Currency, EventKind, GamePhase, Notification, NotificationKind, ObserverSet, ParticipantId,
    Reconciler, RoomEvent, RoomObserver, SdkError, WireMessage,
};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Observer recording everything it is told
#[derive(Default)]
struct RecordingObserver {
    notifications: Mutex<Vec<Notification>>,
    phases: Mutex<Vec<GamePhase>>,
    results: Mutex<Vec<String>>,
    errors: AtomicU64,
}

impl RoomObserver for RecordingObserver {
    fn on_notification(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn on_phase_change(&self, phase: GamePhase) {
        self.phases.lock().unwrap().push(phase);
    }

    fn on_result(&self, message: &str) {
        self.results.lock().unwrap().push(message.to_string());
    }

    fn on_error(&self, _error: SdkError) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

fn wire(kind: &str, user: &str, message: &str) -> WireMessage {
    WireMessage {
        kind: kind.to_string(),
        user_id: user.to_string(),
        message: message.to_string(),
        price: None,
        currency: None,
        timestamp: None,
    }
}

fn price_wire(user: &str, amount: &str) -> WireMessage {
    WireMessage {
        price: Some(amount.parse().unwrap()),
        currency: Some(Currency::Czk),
        ..wire("set_price", user, &format!("User {} set a price.", user))
    }
}

fn reconciler_with(observer: Arc<RecordingObserver>) -> Reconciler {
    let observers = Arc::new(ObserverSet::new());
    observers.register(observer);
    Reconciler::new(
        ParticipantId::new("u1"),
        Duration::from_millis(1000),
        observers,
    )
}

#[test]
fn test_join_and_leave_notifications() {
    let observer = Arc::new(RecordingObserver::default());
    let mut r = reconciler_with(observer.clone());

    r.handle_wire(wire("join", "u2", "User u2 joined the room."));
    r.handle_wire(wire("leave", "u2", "User u2 left the room."));

    let notifications = observer.notifications.lock().unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].kind, NotificationKind::UserJoined);
    assert_eq!(notifications[0].message, "User u2 joined the room.");
    assert_eq!(notifications[1].kind, NotificationKind::UserLeft);
}

#[test]
fn test_phase_changes_are_announced_once_per_transition() {
    let observer = Arc::new(RecordingObserver::default());
    let mut r = reconciler_with(observer.clone());

    r.handle_wire(wire("join", "u1", "User u1 joined the room."));
    r.handle_wire(wire("join", "u2", "User u2 joined the room."));
    r.handle_wire(wire("game_start", "u1", "Game started."));
    r.handle_wire(price_wire("u1", "100"));
    r.handle_wire(price_wire("u2", "50"));

    let phases = observer.phases.lock().unwrap();
    // Idle -> Started on the explicit start, Started -> PricesSet when
    // the second price lands; the first price changes nothing
    assert_eq!(*phases, vec![GamePhase::Started, GamePhase::PricesSet]);
}

#[test]
fn test_result_is_announced_with_the_message() {
    let observer = Arc::new(RecordingObserver::default());
    let mut r = reconciler_with(observer.clone());

    r.handle_wire(wire("result", "u1", "u2 loses"));

    assert_eq!(*observer.results.lock().unwrap(), vec!["u2 loses".to_string()]);
    // The result event also reaches the log
    assert_eq!(r.log().len(), 1);
    assert_eq!(r.log().latest().unwrap().kind, EventKind::Result);
}

#[test]
fn test_duplicate_suppression_spares_observers() {
    let observer = Arc::new(RecordingObserver::default());
    let mut r = reconciler_with(observer.clone());

    r.handle_wire(wire("join", "u2", "User u2 joined the room."));
    r.handle_wire(wire("join", "u2", "User u2 joined the room."));

    // One toast, not two
    assert_eq!(observer.notifications.lock().unwrap().len(), 1);
}

#[test]
fn test_event_log_survives_result_reset() {
    let observer = Arc::new(RecordingObserver::default());
    let mut r = reconciler_with(observer);

    r.handle_wire(wire("join", "u1", "User u1 joined the room."));
    r.handle_wire(wire("join", "u2", "User u2 joined the room."));
    r.handle_wire(wire("game_start", "u1", "Game started."));
    r.handle_wire(price_wire("u1", "100"));
    r.handle_wire(price_wire("u2", "50"));
    r.handle_wire(wire("result", "u1", "u1 loses"));

    assert_eq!(r.log().len(), 6);
    assert!(r.game().prices().is_empty());
    assert_eq!(r.game().roster().len(), 2);
}

#[test]
fn test_log_entries_expose_payload() {
    let observer = Arc::new(RecordingObserver::default());
    let mut r = reconciler_with(observer);

    r.handle_wire(price_wire("u2", "149.90"));

    let event: &RoomEvent = r.log().latest().unwrap();
    assert_eq!(event.kind, EventKind::SetPrice);
    assert_eq!(event.actor, ParticipantId::new("u2"));
    assert_eq!(event.price, Some(dec!(149.90)));
    assert_eq!(event.currency, Some(Currency::Czk));
}

#[test]
fn test_stats_count_duplicates() {
    let observer = Arc::new(RecordingObserver::default());
    let mut r = reconciler_with(observer);

    r.handle_wire(wire("join", "u1", "User u1 joined the room."));
    r.handle_wire(wire("join", "u1", "User u1 joined the room."));
    r.handle_wire(wire("join", "u2", "User u2 joined the room."));

    let stats = r.log().stats();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.duplicates_dropped, 1);
}
