//! REST room data fetching
//!
//! `RoomApi` is the seam to the REST collaborator (room listing and
//! creation, action history, completed-game history); `RestRoomApi` is
//! its reqwest implementation. `RoomDataFetcher` adds the per-room
//! snapshot cache: results are reused within a bounded freshness window
//! so frequent re-reads do not hammer the collaborator, and a failed
//! retrieval degrades to an empty list plus an error flag instead of
//! blocking live events.

use crate::data::{ClientConfig, GameRecord, ParticipantId, RoomInfo};
use crate::error::{FetchError, SdkError};
use crate::protocol::WireMessage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// REST surface consumed by the SDK
#[async_trait]
pub trait RoomApi: Send + Sync {
    /// `GET /rooms`
    async fn list_rooms(&self) -> Result<Vec<RoomInfo>, FetchError>;

    /// `POST /rooms/`
    async fn create_room(&self, name: &str, user: &ParticipantId)
        -> Result<RoomInfo, FetchError>;

    /// `POST /rooms/{id}/join`
    async fn join_room(&self, room_id: &str, user: &ParticipantId) -> Result<(), FetchError>;

    /// `GET /rooms/{id}/actions`
    async fn fetch_actions(&self, room_id: &str) -> Result<Vec<WireMessage>, FetchError>;

    /// `GET /rooms/{id}/history`
    async fn fetch_history(&self, room_id: &str) -> Result<Vec<GameRecord>, FetchError>;
}

/// reqwest-backed implementation of [`RoomApi`]
pub struct RestRoomApi {
    base: String,
    http: reqwest::Client,
}

impl RestRoomApi {
    pub fn new(config: &ClientConfig) -> Result<Self, SdkError> {
        config
            .validate()
            .map_err(SdkError::Configuration)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SdkError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base: config.rest_endpoint.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("{}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(format!("{}", e)))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base, path);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("{}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(format!("{}", e)))
    }
}

#[async_trait]
impl RoomApi for RestRoomApi {
    async fn list_rooms(&self) -> Result<Vec<RoomInfo>, FetchError> {
        self.get_json("/rooms").await
    }

    async fn create_room(
        &self,
        name: &str,
        user: &ParticipantId,
    ) -> Result<RoomInfo, FetchError> {
        self.post_json(
            "/rooms/",
            serde_json::json!({ "name": name, "user_id": user.as_str() }),
        )
        .await
    }

    async fn join_room(&self, room_id: &str, user: &ParticipantId) -> Result<(), FetchError> {
        let path = format!("/rooms/{}/join", room_id);
        let url = format!("{}{}", self.base, path);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "user_id": user.as_str() }))
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("{}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                endpoint: path,
            });
        }

        Ok(())
    }

    async fn fetch_actions(&self, room_id: &str) -> Result<Vec<WireMessage>, FetchError> {
        self.get_json(&format!("/rooms/{}/actions", room_id)).await
    }

    async fn fetch_history(&self, room_id: &str) -> Result<Vec<GameRecord>, FetchError> {
        self.get_json(&format!("/rooms/{}/history", room_id)).await
    }
}

struct Snapshot<T> {
    fetched_at: Instant,
    data: T,
}

/// Per-room snapshot cache over a [`RoomApi`]
///
/// Retrievals within the freshness window reuse the cached snapshot;
/// `refetch_history` bypasses the window (used after an evaluation).
pub struct RoomDataFetcher {
    api: Arc<dyn RoomApi>,
    room_id: String,
    snapshot_ttl: Duration,
    actions: Mutex<Option<Snapshot<Vec<WireMessage>>>>,
    history: Mutex<Option<Snapshot<Vec<GameRecord>>>>,
    actions_failed: AtomicBool,
    history_failed: AtomicBool,
}

impl RoomDataFetcher {
    pub fn new(api: Arc<dyn RoomApi>, room_id: impl Into<String>, snapshot_ttl: Duration) -> Self {
        Self {
            api,
            room_id: room_id.into(),
            snapshot_ttl,
            actions: Mutex::new(None),
            history: Mutex::new(None),
            actions_failed: AtomicBool::new(false),
            history_failed: AtomicBool::new(false),
        }
    }

    /// Historical actions for the room
    ///
    /// A failed retrieval is reported as an empty list ("no history
    /// yet") with [`Self::actions_failed`] raised; it never blocks the
    /// live flow.
    pub async fn actions(&self) -> Vec<WireMessage> {
        if let Some(cached) = Self::fresh(&self.actions, self.snapshot_ttl) {
            return cached;
        }

        match self.api.fetch_actions(&self.room_id).await {
            Ok(actions) => {
                self.actions_failed.store(false, Ordering::SeqCst);
                Self::store(&self.actions, actions.clone());
                actions
            }
            Err(e) => {
                self.actions_failed.store(true, Ordering::SeqCst);
                crate::error::ErrorReporter::report_error(&e.into(), "fetch actions");
                Vec::new()
            }
        }
    }

    /// Completed-game history for the room
    pub async fn history(&self) -> Vec<GameRecord> {
        if let Some(cached) = Self::fresh(&self.history, self.snapshot_ttl) {
            return cached;
        }

        self.fetch_history_uncached().await
    }

    /// History retrieval that bypasses the freshness window
    ///
    /// Used after an evaluation, when the collaborator is known to have
    /// a newer record than any cached snapshot.
    pub async fn refetch_history(&self) -> Vec<GameRecord> {
        self.fetch_history_uncached().await
    }

    async fn fetch_history_uncached(&self) -> Vec<GameRecord> {
        match self.api.fetch_history(&self.room_id).await {
            Ok(history) => {
                self.history_failed.store(false, Ordering::SeqCst);
                Self::store(&self.history, history.clone());
                history
            }
            Err(e) => {
                self.history_failed.store(true, Ordering::SeqCst);
                crate::error::ErrorReporter::report_error(&e.into(), "fetch history");
                Vec::new()
            }
        }
    }

    /// Whether the most recent action retrieval failed
    pub fn actions_failed(&self) -> bool {
        self.actions_failed.load(Ordering::SeqCst)
    }

    /// Whether the most recent history retrieval failed
    pub fn history_failed(&self) -> bool {
        self.history_failed.load(Ordering::SeqCst)
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    fn fresh<T: Clone>(slot: &Mutex<Option<Snapshot<T>>>, ttl: Duration) -> Option<T> {
        let guard = slot.lock().unwrap();
        guard
            .as_ref()
            .filter(|snapshot| snapshot.fetched_at.elapsed() < ttl)
            .map(|snapshot| snapshot.data.clone())
    }

    fn store<T>(slot: &Mutex<Option<Snapshot<T>>>, data: T) {
        *slot.lock().unwrap() = Some(Snapshot {
            fetched_at: Instant::now(),
            data,
        });
    }
}
