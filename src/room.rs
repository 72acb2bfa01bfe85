//! Room session facade
//!
//! Composes the fetcher, the live channel, the reconciler and the game
//! state into the single contract the presentation layer consumes. Both
//! event producers, the one-shot historical replay and the live
//! channel, funnel into one queue drained by a single pump task, so
//! room state is only ever mutated from one place.
//!
//! A session owns all per-room state; nothing outlives it and nothing
//! is process-global. Tearing it down releases the socket and abandons
//! in-flight work.

use crate::channel::LiveChannel;
use crate::data::{
    BetSubmission, ClientConfig, Currency, GamePhase, GameRecord, ParticipantId, PriceSubmission,
    RoomEvent,
};
use crate::error::SdkError;
use crate::events::{ObserverSet, RoomObserver};
use crate::fetcher::{RoomApi, RoomDataFetcher};
use crate::protocol::Command;
use crate::reconciler::Reconciler;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One mounted room: the contract the presentation layer consumes
pub struct RoomSession {
    room_id: String,
    local: ParticipantId,
    core: Arc<Mutex<Reconciler>>,
    fetcher: Arc<RoomDataFetcher>,
    channel: LiveChannel,
    history: Arc<Mutex<Vec<GameRecord>>>,
    observers: Arc<ObserverSet>,
    pump: JoinHandle<()>,
}

impl RoomSession {
    /// Mount a room: connect the channel, replay history, go live
    pub async fn join(
        config: &ClientConfig,
        api: Arc<dyn RoomApi>,
        room_id: impl Into<String>,
        local: ParticipantId,
    ) -> Result<Self, SdkError> {
        Self::join_with_observer(config, api, room_id, local, None).await
    }

    /// Mount a room with an observer registered before any event flows
    ///
    /// Registering up-front means the observer also sees notifications
    /// produced by the historical replay.
    pub async fn join_with_observer(
        config: &ClientConfig,
        api: Arc<dyn RoomApi>,
        room_id: impl Into<String>,
        local: ParticipantId,
        observer: Option<Arc<dyn RoomObserver>>,
    ) -> Result<Self, SdkError> {
        config.validate().map_err(SdkError::Configuration)?;
        let room_id = room_id.into();

        let observers = Arc::new(ObserverSet::new());
        if let Some(observer) = observer {
            observers.register(observer);
        }

        let fetcher = Arc::new(RoomDataFetcher::new(
            Arc::clone(&api),
            room_id.clone(),
            config.snapshot_ttl,
        ));
        let history = Arc::new(Mutex::new(Vec::new()));

        let mut reconciler = Reconciler::new(
            local.clone(),
            config.dedup_window,
            Arc::clone(&observers),
        );

        // After an evaluation the collaborator holds a newer record than
        // any cached snapshot; the hook pulls it in the background.
        let hook_fetcher = Arc::clone(&fetcher);
        let hook_history = Arc::clone(&history);
        reconciler.set_history_refetch_hook(Arc::new(move || {
            let fetcher = Arc::clone(&hook_fetcher);
            let history = Arc::clone(&hook_history);
            tokio::spawn(async move {
                let records = fetcher.refetch_history().await;
                *history.lock().unwrap() = records;
            });
        }));

        let core = Arc::new(Mutex::new(reconciler));

        // Single consumer: both producers land on this queue
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<String>();
        let pump_core = Arc::clone(&core);
        let pump = tokio::spawn(async move {
            while let Some(raw) = inbound_rx.recv().await {
                pump_core.lock().unwrap().handle_raw(&raw);
            }
        });

        let channel = LiveChannel::connect(config, &room_id, &local, move |text| {
            // Session torn down: the queue is gone and the frame is dropped
            let _ = inbound_tx.send(text);
        })
        .await?;

        // The channel may already be delivering while this replay runs;
        // the dedup window absorbs the overlap.
        let actions = fetcher.actions().await;
        core.lock().unwrap().replay(actions);

        *history.lock().unwrap() = fetcher.history().await;

        tracing::info!("Room {} mounted for participant {}", room_id, local);

        Ok(Self {
            room_id,
            local,
            core,
            fetcher,
            channel,
            history,
            observers,
            pump,
        })
    }

    // ========== State snapshot ==========

    pub fn phase(&self) -> GamePhase {
        self.core.lock().unwrap().game().phase()
    }

    /// Accepted events, newest first
    pub fn events(&self) -> Vec<RoomEvent> {
        self.core.lock().unwrap().log().entries().to_vec()
    }

    /// Currently-joined participants, newest-joined first
    pub fn roster(&self) -> Vec<ParticipantId> {
        self.core.lock().unwrap().game().roster().to_vec()
    }

    pub fn prices(&self) -> Vec<PriceSubmission> {
        self.core.lock().unwrap().game().prices().to_vec()
    }

    pub fn bets(&self) -> Vec<BetSubmission> {
        self.core.lock().unwrap().game().bets().to_vec()
    }

    pub fn result(&self) -> Option<String> {
        self.core
            .lock()
            .unwrap()
            .game()
            .result()
            .map(str::to_string)
    }

    /// Whether the local participant already submitted a price this round
    pub fn price_set(&self) -> bool {
        self.core.lock().unwrap().game().price_set()
    }

    /// Whether the local participant already submitted a bet this round
    pub fn bet_set(&self) -> bool {
        self.core.lock().unwrap().game().bet_set()
    }

    /// Completed-game records, refreshed after each evaluation
    pub fn history(&self) -> Vec<GameRecord> {
        self.history.lock().unwrap().clone()
    }

    /// Sticky transport-failure flag (terminal; remount to recover)
    pub fn connection_failed(&self) -> bool {
        self.channel.connection_failed()
    }

    pub fn actions_fetch_failed(&self) -> bool {
        self.fetcher.actions_failed()
    }

    pub fn history_fetch_failed(&self) -> bool {
        self.fetcher.history_failed()
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.local
    }

    // ========== Outbound ==========

    /// Send a raw command upstream, fire-and-forget
    pub fn send(&self, command: &Command) -> Result<(), SdkError> {
        self.channel.send(command).map_err(SdkError::from)
    }

    pub fn start_game(&self) -> Result<(), SdkError> {
        self.send(&Command::game_start(self.local.clone()))
    }

    pub fn end_game(&self) -> Result<(), SdkError> {
        self.send(&Command::game_end(self.local.clone()))
    }

    pub fn submit_price(&self, price: Decimal, currency: Currency) -> Result<(), SdkError> {
        self.send(&Command::set_price(self.local.clone(), price, currency))
    }

    pub fn submit_bet(&self, bet: u32) -> Result<(), SdkError> {
        self.send(&Command::set_bet(self.local.clone(), bet))
    }

    pub fn evaluate(&self) -> Result<(), SdkError> {
        self.send(&Command::evaluate(self.local.clone()))
    }

    // ========== Round bookkeeping ==========

    /// Clear the stored result only
    pub fn clear_result(&self) {
        self.core.lock().unwrap().game_mut().clear_result();
    }

    /// Force a history retrieval that bypasses the freshness window
    pub async fn refetch_history(&self) -> Vec<GameRecord> {
        let records = self.fetcher.refetch_history().await;
        *self.history.lock().unwrap() = records.clone();
        records
    }

    pub fn register_observer(&self, observer: Arc<dyn RoomObserver>) {
        self.observers.register(observer);
    }

    /// Unmount the room: release the socket, stop processing
    pub fn leave(self) {
        tracing::info!("Room {} unmounted", self.room_id);
        // Drop handles teardown
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        self.pump.abort();
        self.channel.close();
    }
}

/// Builder pattern for client configuration
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn rest_endpoint(mut self, endpoint: &str) -> Self {
        self.config.rest_endpoint = endpoint.to_string();
        self
    }

    pub fn ws_endpoint(mut self, endpoint: &str) -> Self {
        self.config.ws_endpoint = endpoint.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn dedup_window(mut self, window: Duration) -> Self {
        self.config.dedup_window = window;
        self
    }

    pub fn snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.config.snapshot_ttl = ttl;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
