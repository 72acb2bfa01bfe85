//! Data models for room events and game state

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Opaque per-installation participant identifier
///
/// Issued once per installation and trusted as-is; the SDK never
/// authenticates it. Generated ids are v4 UUIDs, but any non-empty
/// string the host persisted earlier is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Generate a fresh id for a new installation
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Supported submission currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Czk,
    Eur,
    Usd,
}

impl Currency {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Currency::Czk => "czk",
            Currency::Eur => "eur",
            Currency::Usd => "usd",
        }
    }
}

impl FromStr for Currency {
    type Err = crate::error::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "czk" => Ok(Currency::Czk),
            "eur" => Ok(Currency::Eur),
            "usd" => Ok(Currency::Usd),
            other => Err(crate::error::ParseError::InvalidDataType(format!(
                "Invalid currency: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// Kinds of room events carried by both the action history and the live channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Join,
    Leave,
    GameStart,
    GameEnd,
    SetPrice,
    SetBet,
    Evaluate,
    Result,
    /// Anything the wire sends that this version does not recognize.
    /// Kept in the log for audit visibility, no state effect.
    Unknown,
}

impl EventKind {
    /// Map a wire `type` string to a kind; unrecognized values become `Unknown`
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "join" => EventKind::Join,
            "leave" => EventKind::Leave,
            "game_start" => EventKind::GameStart,
            "game_end" => EventKind::GameEnd,
            "set_price" => EventKind::SetPrice,
            "set_bet" => EventKind::SetBet,
            "evaluate" => EventKind::Evaluate,
            "result" => EventKind::Result,
            _ => EventKind::Unknown,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            EventKind::Join => "join",
            EventKind::Leave => "leave",
            EventKind::GameStart => "game_start",
            EventKind::GameEnd => "game_end",
            EventKind::SetPrice => "set_price",
            EventKind::SetBet => "set_bet",
            EventKind::Evaluate => "evaluate",
            EventKind::Result => "result",
            EventKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// A single room event, immutable once appended to the log
///
/// Ordering key is `timestamp`, ties broken by arrival order (the log
/// appends stably). Historical records carry their server timestamp;
/// live frames get the local receive time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub kind: EventKind,
    pub actor: ParticipantId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub price: Option<Decimal>,
    pub currency: Option<Currency>,
}

impl fmt::Display for RoomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event[{}]: {} by {} @ {}",
            self.kind, self.message, self.actor, self.timestamp
        )
    }
}

// EventKind is not serde-derived (Unknown swallows arbitrary wire values),
// so RoomEvent serializes it through its wire name.
impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventKind::from_wire(&s))
    }
}

/// A participant's price submission for the current round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSubmission {
    pub actor: ParticipantId,
    pub price: Decimal,
    pub currency: Currency,
}

impl fmt::Display for PriceSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.actor, self.price, self.currency)
    }
}

/// A participant's bet entry for the current round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetSubmission {
    pub actor: ParticipantId,
}

/// Derived stage of the current game round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GamePhase {
    #[default]
    Idle,
    Started,
    PricesSet,
    BetsSet,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::Idle => write!(f, "IDLE"),
            GamePhase::Started => write!(f, "STARTED"),
            GamePhase::PricesSet => write!(f, "PRICES_SET"),
            GamePhase::BetsSet => write!(f, "BETS_SET"),
        }
    }
}

/// Room listing entry from `GET /rooms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: String,
    pub name: String,
    pub created_by: ParticipantId,
    pub created_at: DateTime<Utc>,
}

/// One participant's converted price inside a completed-game record
///
/// Conversion is computed server-side; the client only carries the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedPrice {
    pub user_id: ParticipantId,
    pub price: Decimal,
    pub currency: Currency,
    pub conversion_rate: Option<Decimal>,
    pub price_in_czk: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Completed-game record from `GET /rooms/{id}/history`
///
/// Externally owned; the SDK only re-requests it after an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub room_id: String,
    pub loser: ParticipantId,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub prices: Vec<ConvertedPrice>,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST collaborator (room listing, actions, history)
    pub rest_endpoint: String,
    /// Base URL of the realtime channel
    pub ws_endpoint: String,
    /// Timeout applied to connection establishment and REST requests
    pub timeout: Duration,
    /// Tolerance window for treating two events with identical message
    /// text as the same logical event. Upstream provides no stable event
    /// id, so this window is the matching key.
    pub dedup_window: Duration,
    /// Freshness window for the action/history snapshot cache
    pub snapshot_ttl: Duration,
}

impl ClientConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.rest_endpoint.is_empty() {
            return Err("REST endpoint cannot be empty".to_string());
        }

        if !self.rest_endpoint.starts_with("http://") && !self.rest_endpoint.starts_with("https://")
        {
            return Err("REST endpoint must be a valid HTTP URL".to_string());
        }

        if !self.ws_endpoint.starts_with("ws://") && !self.ws_endpoint.starts_with("wss://") {
            return Err("WS endpoint must be a valid WebSocket URL".to_string());
        }

        if self.timeout.as_secs() == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.dedup_window.as_millis() == 0 {
            return Err("Dedup window must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Build a configuration from environment variables
    ///
    /// Reads `PRICEROOM_REST_URL` and `PRICEROOM_WS_URL` (falling back to
    /// the defaults), loading a `.env` file first when present.
    pub fn from_env() -> Result<Self, crate::error::SdkError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(rest) = std::env::var("PRICEROOM_REST_URL") {
            config.rest_endpoint = rest;
        }
        if let Ok(ws) = std::env::var("PRICEROOM_WS_URL") {
            config.ws_endpoint = ws;
        }

        config
            .validate()
            .map_err(crate::error::SdkError::Configuration)?;
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rest_endpoint: "http://127.0.0.1:8000".to_string(),
            ws_endpoint: "ws://127.0.0.1:8000".to_string(),
            timeout: Duration::from_secs(30),
            dedup_window: Duration::from_millis(1000),
            snapshot_ttl: Duration::from_secs(5),
        }
    }
}
