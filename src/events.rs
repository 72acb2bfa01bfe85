//! Observer callbacks and dispatch
//!
//! The presentation layer registers observers to receive transient
//! notifications (join/leave/start/end toasts), phase changes, results
//! and errors. A panicking observer is isolated and reported; it never
//! takes the reconciler down with it.

use crate::data::GamePhase;
use crate::error::SdkError;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Kind of a transient user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    UserJoined,
    UserLeft,
    GameStarted,
    GameEnded,
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::UserJoined => "User Joined",
            NotificationKind::UserLeft => "User Left",
            NotificationKind::GameStarted => "Game started",
            NotificationKind::GameEnded => "Game ended",
        }
    }
}

/// A transient user-facing notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// The event's free-text message, used as the notification body
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.title(), self.message)
    }
}

/// Trait for room observers
///
/// All methods have empty defaults; implement only what the surface
/// needs.
pub trait RoomObserver: Send + Sync {
    fn on_notification(&self, _notification: Notification) {}
    fn on_phase_change(&self, _phase: GamePhase) {}
    fn on_result(&self, _message: &str) {}
    fn on_error(&self, _error: SdkError) {}
}

/// Observer registry and dispatch point
pub struct ObserverSet {
    observers: Mutex<Vec<Arc<dyn RoomObserver>>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, observer: Arc<dyn RoomObserver>) {
        let mut observers = self.observers.lock().unwrap();
        observers.push(observer);
        tracing::debug!("Registered observer ({} total)", observers.len());
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    pub fn dispatch_notification(&self, notification: Notification) {
        self.for_each("notification", |observer| {
            observer.on_notification(notification.clone())
        });
    }

    pub fn dispatch_phase_change(&self, phase: GamePhase) {
        self.for_each("phase change", |observer| observer.on_phase_change(phase));
    }

    pub fn dispatch_result(&self, message: &str) {
        self.for_each("result", |observer| observer.on_result(message));
    }

    pub fn dispatch_error(&self, error: SdkError) {
        self.for_each("error", |observer| observer.on_error(error.clone()));
    }

    fn for_each<F>(&self, what: &str, f: F)
    where
        F: Fn(&Arc<dyn RoomObserver>),
    {
        if let Ok(observers) = self.observers.lock() {
            for (index, observer) in observers.iter().enumerate() {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    f(observer);
                }));
                if outcome.is_err() {
                    tracing::error!("Observer {} panicked while processing {}", index, what);
                }
            }
        }
    }
}

impl Default for ObserverSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        notifications: AtomicU64,
        phase_changes: AtomicU64,
        results: AtomicU64,
    }

    impl RoomObserver for CountingObserver {
        fn on_notification(&self, _notification: Notification) {
            self.notifications.fetch_add(1, Ordering::Relaxed);
        }

        fn on_phase_change(&self, _phase: GamePhase) {
            self.phase_changes.fetch_add(1, Ordering::Relaxed);
        }

        fn on_result(&self, _message: &str) {
            self.results.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct PanickingObserver;

    impl RoomObserver for PanickingObserver {
        fn on_notification(&self, _notification: Notification) {
            panic!("observer bug");
        }
    }

    #[test]
    fn test_dispatch_reaches_all_observers() {
        let set = ObserverSet::new();
        let a = Arc::new(CountingObserver::default());
        let b = Arc::new(CountingObserver::default());
        set.register(a.clone());
        set.register(b.clone());

        set.dispatch_notification(Notification::new(
            NotificationKind::UserJoined,
            "User u1 joined the room.",
        ));
        set.dispatch_phase_change(GamePhase::Started);

        assert_eq!(a.notifications.load(Ordering::Relaxed), 1);
        assert_eq!(b.notifications.load(Ordering::Relaxed), 1);
        assert_eq!(a.phase_changes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_panicking_observer_does_not_poison_dispatch() {
        let set = ObserverSet::new();
        let counting = Arc::new(CountingObserver::default());
        set.register(Arc::new(PanickingObserver));
        set.register(counting.clone());

        set.dispatch_notification(Notification::new(
            NotificationKind::GameStarted,
            "Game started.",
        ));

        // The panic was contained and the second observer still ran
        assert_eq!(counting.notifications.load(Ordering::Relaxed), 1);
    }
}
