//! # Priceroom WebSocket SDK
//!
//! Client SDK for the pricing-game room service. A room session merges
//! two independent sources of truth, a point-in-time REST snapshot of
//! past room actions and a live push channel of new ones, into one
//! deduplicated event log, and derives the game phase purely from the
//! accumulated events and the current participant roster.
//!
//! ## Quick Start
//! ```rust,ignore
//! use priceroom_ws_sdk::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ClientConfig::default();
//! let api = Arc::new(RestRoomApi::new(&config)?);
//! let session = RoomSession::join(&config, api, "room-1", ParticipantId::generate()).await?;
//!
//! session.submit_price(rust_decimal_macros::dec!(149.90), Currency::Czk)?;
//! println!("phase: {}", session.phase());
//! ```

pub mod channel;
pub mod data;
pub mod error;
pub mod event_log;
pub mod events;
pub mod fetcher;
pub mod game;
pub mod protocol;
pub mod reconciler;
pub mod room;

pub use channel::LiveChannel;
pub use data::*;
pub use error::*;
pub use event_log::{EventLog, EventLogStats};
pub use events::{Notification, NotificationKind, ObserverSet, RoomObserver};
pub use fetcher::{RestRoomApi, RoomApi, RoomDataFetcher};
pub use protocol::{Command, WireMessage};
pub use reconciler::Reconciler;
pub use room::{ClientConfigBuilder, RoomSession};

/// Prelude - minimal public API surface
///
/// Import with: `use priceroom_ws_sdk::prelude::*;`
///
/// This provides the essential types for most use cases:
/// - `RoomSession` - one mounted room, the main entry point
/// - `RestRoomApi` - REST collaborator client
/// - `ClientConfig` - configuration
/// - Core data types (`RoomEvent`, `GamePhase`, submissions)
pub mod prelude {
    /// Main entry point
    pub use crate::room::{ClientConfigBuilder, RoomSession};

    /// Configuration
    pub use crate::data::ClientConfig;

    /// REST collaborator
    pub use crate::fetcher::{RestRoomApi, RoomApi};

    /// Core data types
    pub use crate::data::{
        BetSubmission, Currency, EventKind, GamePhase, GameRecord, ParticipantId,
        PriceSubmission, RoomEvent, RoomInfo,
    };

    /// Outbound commands
    pub use crate::protocol::Command;

    /// Observers
    pub use crate::events::{Notification, NotificationKind, RoomObserver};

    /// Errors
    pub use crate::error::SdkError;
}

/// Initialize logging for the SDK
pub fn init_logging() {
    tracing_subscriber::fmt::init();
}
