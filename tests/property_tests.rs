//! Property-based tests using quickcheck

use priceroom_ws_sdk::{
    GamePhase, ObserverSet, ParticipantId, Reconciler, WireMessage,
};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use std::sync::Arc;
use std::time::Duration;

fn reconciler() -> Reconciler {
    Reconciler::new(
        ParticipantId::new("local"),
        Duration::from_millis(1000),
        Arc::new(ObserverSet::new()),
    )
}

fn join_message(user: &str, message: &str) -> WireMessage {
    WireMessage {
        kind: "join".to_string(),
        user_id: user.to_string(),
        message: message.to_string(),
        price: None,
        currency: None,
        timestamp: None,
    }
}

// Replaying the same action list twice never grows the log: every
// message appears exactly once no matter how often it is delivered.
#[quickcheck]
fn prop_replay_is_idempotent(messages: Vec<String>) -> bool {
    let mut r = reconciler();

    let actions: Vec<WireMessage> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| join_message(&format!("u{}", i), m))
        .collect();

    r.replay(actions.clone());
    let after_first = r.log().len();

    r.replay(actions);
    r.log().len() == after_first
}

// A duplicate delivery inside the tolerance window leaves all state
// untouched, including the roster.
#[quickcheck]
fn prop_duplicate_delivery_does_not_mutate_state(message: String) -> bool {
    let mut r = reconciler();
    r.handle_wire(join_message("u1", &message));
    let roster_after_first = r.game().roster().len();

    r.handle_wire(join_message("u1", &message));
    r.log().len() == 1 && r.game().roster().len() == roster_after_first
}

// A solitary occupant can never complete a round by submission counts,
// however many submissions pile up.
#[quickcheck]
fn prop_single_occupant_never_reaches_prices_set(submissions: u8) -> TestResult {
    if submissions == 0 {
        return TestResult::discard();
    }

    let mut r = reconciler();
    r.handle_wire(join_message("u1", "User u1 joined the room."));
    r.handle_wire(WireMessage {
        kind: "game_start".to_string(),
        user_id: "u1".to_string(),
        message: "Game started.".to_string(),
        price: None,
        currency: None,
        timestamp: None,
    });

    for i in 0..submissions {
        r.handle_wire(WireMessage {
            kind: "set_price".to_string(),
            user_id: "u1".to_string(),
            message: format!("User u1 set a price. (attempt {})", i),
            price: Some(rust_decimal::Decimal::from(i as u32 + 1)),
            currency: Some(priceroom_ws_sdk::Currency::Czk),
            timestamp: None,
        });
    }

    TestResult::from_bool(r.game().phase() == GamePhase::Started)
}

// With two participants, the round completes no matter which of the two
// submissions lands first.
#[quickcheck]
fn prop_two_participant_round_completes_in_any_order(u1_first: bool) -> bool {
    let mut r = reconciler();
    r.handle_wire(join_message("u1", "User u1 joined the room."));
    r.handle_wire(join_message("u2", "User u2 joined the room."));
    r.handle_wire(WireMessage {
        kind: "game_start".to_string(),
        user_id: "u1".to_string(),
        message: "Game started.".to_string(),
        price: None,
        currency: None,
        timestamp: None,
    });

    let price = |user: &str| WireMessage {
        kind: "set_price".to_string(),
        user_id: user.to_string(),
        message: format!("User {} set a price.", user),
        price: Some(rust_decimal::Decimal::from(100u32)),
        currency: Some(priceroom_ws_sdk::Currency::Czk),
        timestamp: None,
    };

    let (first, second) = if u1_first { ("u1", "u2") } else { ("u2", "u1") };
    r.handle_wire(price(first));
    let mid = r.game().phase();
    r.handle_wire(price(second));

    mid == GamePhase::Started && r.game().phase() == GamePhase::PricesSet
}
