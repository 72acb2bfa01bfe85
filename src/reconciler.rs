//! Room event reconciliation
//!
//! The single dispatch point both producers funnel into: the one-shot
//! historical replay (with recorded timestamps) and the live channel
//! (with the receive time substituted). Incoming events are parsed,
//! deduplicated against the event log, appended, and routed to their
//! kind-specific effect on the game state.
//!
//! No error is allowed past this boundary: every branch degrades to a
//! no-op plus a log line.

use crate::data::{BetSubmission, EventKind, ParticipantId, PriceSubmission, RoomEvent};
use crate::error::ErrorReporter;
use crate::event_log::EventLog;
use crate::events::{Notification, NotificationKind, ObserverSet};
use crate::game::GameState;
use crate::protocol::{parse_message, WireMessage};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Hook invoked when a Result event schedules a history re-fetch
pub type HistoryRefetchHook = Arc<dyn Fn() + Send + Sync>;

/// Normalizes, deduplicates and applies room events
pub struct Reconciler {
    local: ParticipantId,
    log: EventLog,
    game: GameState,
    observers: Arc<ObserverSet>,
    history_refetch: Option<HistoryRefetchHook>,
}

impl Reconciler {
    pub fn new(local: ParticipantId, dedup_window: Duration, observers: Arc<ObserverSet>) -> Self {
        Self {
            local,
            log: EventLog::new(dedup_window),
            game: GameState::new(),
            observers,
            history_refetch: None,
        }
    }

    /// Install the hook run when a Result event lands
    pub fn set_history_refetch_hook(&mut self, hook: HistoryRefetchHook) {
        self.history_refetch = Some(hook);
    }

    /// Handle one raw live frame
    ///
    /// Malformed payloads are reported and dropped; nothing escapes.
    pub fn handle_raw(&mut self, raw: &str) {
        match parse_message(raw) {
            Ok(message) => self.handle_wire(message),
            Err(e) => {
                ErrorReporter::report_error(&e.into(), "live frame parse");
            }
        }
    }

    /// Replay fetched historical actions in collaborator order
    ///
    /// Each action carries its own recorded timestamp; replaying the same
    /// list twice is a no-op thanks to the log's dedup rule.
    pub fn replay(&mut self, actions: Vec<WireMessage>) {
        tracing::debug!("Replaying {} historical actions", actions.len());
        for action in actions {
            self.handle_wire(action);
        }
    }

    /// Normalize, deduplicate and apply a single wire message
    pub fn handle_wire(&mut self, message: WireMessage) {
        let event = message.into_event(Utc::now());

        let phase_before = self.game.phase();
        // The log is the dedup gate: a duplicate delivery mutates nothing
        if !self.log.record(event.clone()) {
            return;
        }
        self.apply(event);

        let phase_after = self.game.phase();
        if phase_before != phase_after {
            self.observers.dispatch_phase_change(phase_after);
        }
    }

    /// Kind-specific effects
    fn apply(&mut self, event: RoomEvent) {
        match event.kind {
            EventKind::Join => {
                self.game.add_participant(event.actor);
                self.observers.dispatch_notification(Notification::new(
                    NotificationKind::UserJoined,
                    event.message,
                ));
            }
            EventKind::Leave => {
                self.game.remove_participant(&event.actor);
                // Keep the local participant's own submission visible
                // until the server confirms the removal.
                if event.actor != self.local {
                    self.game.purge_prices(&event.actor);
                }
                self.observers.dispatch_notification(Notification::new(
                    NotificationKind::UserLeft,
                    event.message,
                ));
            }
            EventKind::GameStart => {
                self.game.start();
                self.observers.dispatch_notification(Notification::new(
                    NotificationKind::GameStarted,
                    event.message,
                ));
            }
            EventKind::GameEnd => {
                self.game.end();
                self.observers.dispatch_notification(Notification::new(
                    NotificationKind::GameEnded,
                    event.message,
                ));
            }
            EventKind::SetPrice => {
                if event.actor == self.local {
                    // Echo of our own submission, possibly from a
                    // previous mount of this room
                    self.game.mark_price_set();
                }
                match (event.price, event.currency) {
                    (Some(price), Some(currency)) => {
                        self.game.record_price(PriceSubmission {
                            actor: event.actor,
                            price,
                            currency,
                        });
                    }
                    _ => {
                        tracing::warn!(
                            "set_price from {} missing price or currency, ignored",
                            event.actor
                        );
                    }
                }
            }
            EventKind::SetBet => {
                if event.actor == self.local {
                    self.game.mark_bet_set();
                }
                self.game.record_bet(BetSubmission { actor: event.actor });
            }
            EventKind::Evaluate => {
                // Server-side trigger; nothing to do locally
                tracing::debug!("Evaluate requested by {}", event.actor);
            }
            EventKind::Result => {
                self.game.reset_round();
                self.game.set_result(event.message.clone());
                self.observers.dispatch_result(&event.message);
                if let Some(hook) = &self.history_refetch {
                    hook();
                }
            }
            EventKind::Unknown => {
                tracing::warn!("Unknown event kind from {}: {}", event.actor, event.message);
            }
        }
    }

    // ========== Snapshot accessors ==========

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    pub fn local(&self) -> &ParticipantId {
        &self.local
    }
}
