//! Wire protocol for the room channel and action history
//!
//! Both the REST action history and the live channel deliver the same
//! message shape; the only difference is that historical records carry a
//! server timestamp and live frames do not.

use crate::data::{Currency, EventKind, ParticipantId, RoomEvent};
use crate::error::ParseError;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inbound message as it appears on the wire
///
/// `{ type, user_id, message, price?, currency?, timestamp? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub user_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    /// ISO-8601, present on historical records only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl WireMessage {
    /// Convert into a domain event
    ///
    /// Historical records use their own recorded timestamp; a frame with
    /// no (or unparseable) timestamp gets `fallback`, the receive time
    /// for live deliveries.
    pub fn into_event(self, fallback: DateTime<Utc>) -> RoomEvent {
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|raw| match parse_timestamp(raw) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    tracing::warn!("Unparseable timestamp '{}': {}", raw, e);
                    None
                }
            })
            .unwrap_or(fallback);

        RoomEvent {
            kind: EventKind::from_wire(&self.kind),
            actor: ParticipantId::new(self.user_id),
            message: self.message,
            timestamp,
            price: self.price,
            currency: self.currency,
        }
    }
}

/// Parse a raw inbound frame
pub fn parse_message(raw: &str) -> Result<WireMessage, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MalformedMessage("Empty message".to_string()));
    }

    serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson(format!("{}", e)))
}

/// Parse an upstream timestamp string
///
/// The collaborator emits ISO-8601; records written without an offset are
/// treated as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| ParseError::InvalidDataType(format!("Invalid timestamp format: {}", e)))
}

/// Outbound command sent through the live channel
///
/// `{ type, user_id, price?, currency?, bet? }`, fire-and-forget, no
/// acknowledgement envelope. The caller learns of success from the
/// eventual inbound echo of its own action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    #[serde(rename = "type")]
    kind: &'static str,
    user_id: ParticipantId,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bet: Option<u32>,
}

impl Command {
    fn bare(kind: &'static str, user: ParticipantId) -> Self {
        Self {
            kind,
            user_id: user,
            price: None,
            currency: None,
            bet: None,
        }
    }

    pub fn join(user: ParticipantId) -> Self {
        Self::bare("join", user)
    }

    pub fn leave(user: ParticipantId) -> Self {
        Self::bare("leave", user)
    }

    pub fn game_start(user: ParticipantId) -> Self {
        Self::bare("game_start", user)
    }

    pub fn game_end(user: ParticipantId) -> Self {
        Self::bare("game_end", user)
    }

    pub fn set_price(user: ParticipantId, price: Decimal, currency: Currency) -> Self {
        Self {
            price: Some(price),
            currency: Some(currency),
            ..Self::bare("set_price", user)
        }
    }

    pub fn set_bet(user: ParticipantId, bet: u32) -> Self {
        Self {
            bet: Some(bet),
            ..Self::bare("set_bet", user)
        }
    }

    pub fn evaluate(user: ParticipantId) -> Self {
        Self::bare("evaluate", user)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Serialize for transmission
    pub fn to_text(&self) -> Result<String, ParseError> {
        serde_json::to_string(self).map_err(|e| ParseError::InvalidJson(format!("{}", e)))
    }
}
