//! Deterministic game round state machine
//!
//! The phase is a pure function of the accumulated evidence (roster
//! size and distinct submission counts) plus the explicit start/end
//! signals. No timers, no retries; every transition is triggered by an
//! accepted event.
//!
//! ## Phase diagram
//!
//! ```text
//!            GameStart
//!   IDLE ───────────────▶ STARTED
//!    ▲                       │ distinct prices == roster, roster > 1
//!    │                       ▼
//!    │                  PRICES_SET
//!    │                       │ distinct bets == roster, roster > 1
//!    │                       ▼
//!    └──GameEnd/Result── BETS_SET
//! ```
//!
//! A roster of exactly one never advances past STARTED by counts alone:
//! a solitary occupant whose single submission equals the roster size
//! must not trigger a false "complete".

use crate::data::{BetSubmission, GamePhase, ParticipantId, PriceSubmission};
use std::collections::HashSet;

/// Round-scoped game state for one mounted room
#[derive(Debug, Default)]
pub struct GameState {
    /// Currently-joined participants, newest-joined first for display
    roster: Vec<ParticipantId>,
    /// Full append list of price submissions, newest first
    prices: Vec<PriceSubmission>,
    /// Bet entries for the current round, newest first
    bets: Vec<BetSubmission>,
    phase: GamePhase,
    result: Option<String>,
    /// Local participant already submitted a price this round
    price_set: bool,
    /// Local participant already submitted a bet this round
    bet_set: bool,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Roster ==========

    /// Insert a participant at the front of the roster
    ///
    /// The roster is a set: a Join for an already-present participant is
    /// a no-op.
    pub fn add_participant(&mut self, actor: ParticipantId) {
        if !self.roster.contains(&actor) {
            self.roster.insert(0, actor);
            self.recompute_phase();
        }
    }

    pub fn remove_participant(&mut self, actor: &ParticipantId) {
        self.roster.retain(|p| p != actor);
        self.recompute_phase();
    }

    /// Drop a departed participant's price submissions
    pub fn purge_prices(&mut self, actor: &ParticipantId) {
        self.prices.retain(|p| &p.actor != actor);
        self.recompute_phase();
    }

    // ========== Submissions ==========

    pub fn record_price(&mut self, submission: PriceSubmission) {
        self.prices.insert(0, submission);
        self.recompute_phase();
    }

    pub fn record_bet(&mut self, submission: BetSubmission) {
        self.bets.insert(0, submission);
        self.recompute_phase();
    }

    pub fn mark_price_set(&mut self) {
        self.price_set = true;
    }

    pub fn mark_bet_set(&mut self) {
        self.bet_set = true;
    }

    // ========== Explicit signals ==========

    /// GameStart event: the only way out of IDLE
    pub fn start(&mut self) {
        self.phase = GamePhase::Started;
        // Submissions may have landed before the start signal; count them
        self.recompute_phase();
    }

    /// GameEnd event: back to IDLE, roster untouched
    pub fn end(&mut self) {
        self.phase = GamePhase::Idle;
    }

    /// Clear round-scoped state: submissions, flags, phase
    ///
    /// Roster survives; the event log is not this struct's to touch.
    pub fn reset_round(&mut self) {
        self.phase = GamePhase::Idle;
        self.price_set = false;
        self.bet_set = false;
        self.prices.clear();
        self.bets.clear();
    }

    pub fn set_result(&mut self, message: impl Into<String>) {
        self.result = Some(message.into());
    }

    /// Clears the stored result only
    pub fn clear_result(&mut self) {
        self.result = None;
    }

    // ========== Derived phase ==========

    /// Re-derive the phase from current counts
    ///
    /// Count-based advancement never applies while IDLE (starting takes
    /// an explicit signal) and counts distinct submitting actors, so a
    /// participant re-submitting cannot complete a round alone.
    fn recompute_phase(&mut self) {
        if self.phase == GamePhase::Idle {
            return;
        }

        let roster_size = self.roster.len();
        if roster_size <= 1 {
            return;
        }

        if self.distinct_bettors() == roster_size {
            self.set_phase(GamePhase::BetsSet);
        } else if self.distinct_pricers() == roster_size {
            self.set_phase(GamePhase::PricesSet);
        }
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            tracing::debug!("Phase transition: {} -> {}", self.phase, phase);
            self.phase = phase;
        }
    }

    fn distinct_pricers(&self) -> usize {
        self.prices
            .iter()
            .map(|p| &p.actor)
            .collect::<HashSet<_>>()
            .len()
    }

    fn distinct_bettors(&self) -> usize {
        self.bets
            .iter()
            .map(|b| &b.actor)
            .collect::<HashSet<_>>()
            .len()
    }

    // ========== Accessors ==========

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn roster(&self) -> &[ParticipantId] {
        &self.roster
    }

    pub fn prices(&self) -> &[PriceSubmission] {
        &self.prices
    }

    pub fn bets(&self) -> &[BetSubmission] {
        &self.bets
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn price_set(&self) -> bool {
        self.price_set
    }

    pub fn bet_set(&self) -> bool {
        self.bet_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Currency;
    use rust_decimal_macros::dec;

    fn price(actor: &str, amount: rust_decimal::Decimal, currency: Currency) -> PriceSubmission {
        PriceSubmission {
            actor: ParticipantId::new(actor),
            price: amount,
            currency,
        }
    }

    fn bet(actor: &str) -> BetSubmission {
        BetSubmission {
            actor: ParticipantId::new(actor),
        }
    }

    #[test]
    fn test_idle_until_explicit_start() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.add_participant(ParticipantId::new("u2"));
        game.record_price(price("u1", dec!(100), Currency::Czk));
        game.record_price(price("u2", dec!(50), Currency::Eur));

        // Complete evidence, but no GameStart yet
        assert_eq!(game.phase(), GamePhase::Idle);

        game.start();
        // The start recompute picks up the already-complete price set
        assert_eq!(game.phase(), GamePhase::PricesSet);
    }

    #[test]
    fn test_prices_then_bets_progression() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.add_participant(ParticipantId::new("u2"));
        game.start();
        assert_eq!(game.phase(), GamePhase::Started);

        game.record_price(price("u1", dec!(100), Currency::Czk));
        assert_eq!(game.phase(), GamePhase::Started);
        game.record_price(price("u2", dec!(50), Currency::Eur));
        assert_eq!(game.phase(), GamePhase::PricesSet);

        game.record_bet(bet("u1"));
        assert_eq!(game.phase(), GamePhase::PricesSet);
        game.record_bet(bet("u2"));
        assert_eq!(game.phase(), GamePhase::BetsSet);
    }

    #[test]
    fn test_single_occupant_never_advances_by_counts() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.start();

        game.record_price(price("u1", dec!(100), Currency::Czk));
        assert_eq!(game.phase(), GamePhase::Started);

        game.record_bet(bet("u1"));
        assert_eq!(game.phase(), GamePhase::Started);
    }

    #[test]
    fn test_resubmission_counts_once() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.add_participant(ParticipantId::new("u2"));
        game.start();

        game.record_price(price("u1", dec!(100), Currency::Czk));
        game.record_price(price("u1", dec!(120), Currency::Czk));
        // Two submissions, one distinct actor
        assert_eq!(game.phase(), GamePhase::Started);
        assert_eq!(game.prices().len(), 2);
    }

    #[test]
    fn test_submission_order_does_not_matter() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.start();
        // Second participant joins after the first price lands
        game.record_price(price("u1", dec!(100), Currency::Czk));
        game.add_participant(ParticipantId::new("u2"));
        game.record_price(price("u2", dec!(50), Currency::Usd));

        assert_eq!(game.phase(), GamePhase::PricesSet);
    }

    #[test]
    fn test_duplicate_join_is_a_noop() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.add_participant(ParticipantId::new("u1"));
        assert_eq!(game.roster().len(), 1);
    }

    #[test]
    fn test_reset_round_preserves_roster() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.add_participant(ParticipantId::new("u2"));
        game.start();
        game.record_price(price("u1", dec!(100), Currency::Czk));
        game.record_bet(bet("u1"));
        game.mark_price_set();
        game.mark_bet_set();

        game.reset_round();

        assert_eq!(game.phase(), GamePhase::Idle);
        assert!(game.prices().is_empty());
        assert!(game.bets().is_empty());
        assert!(!game.price_set());
        assert!(!game.bet_set());
        assert_eq!(game.roster().len(), 2);
    }

    #[test]
    fn test_end_keeps_roster_and_submissions() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.add_participant(ParticipantId::new("u2"));
        game.start();
        game.record_price(price("u1", dec!(100), Currency::Czk));

        game.end();
        assert_eq!(game.phase(), GamePhase::Idle);
        assert_eq!(game.roster().len(), 2);
        assert_eq!(game.prices().len(), 1);
    }

    #[test]
    fn test_clear_result() {
        let mut game = GameState::new();
        game.set_result("u2 loses");
        assert_eq!(game.result(), Some("u2 loses"));
        game.clear_result();
        assert_eq!(game.result(), None);
    }

    #[test]
    fn test_roster_is_newest_first() {
        let mut game = GameState::new();
        game.add_participant(ParticipantId::new("u1"));
        game.add_participant(ParticipantId::new("u2"));
        assert_eq!(game.roster()[0], ParticipantId::new("u2"));
        assert_eq!(game.roster()[1], ParticipantId::new("u1"));
    }
}
