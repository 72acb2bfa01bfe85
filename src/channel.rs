//! Live room channel
//!
//! One WebSocket per (room, participant) pair. Inbound text frames are
//! handed to the message handler in delivery order; outbound commands
//! go through an mpsc queue into the writer half. Any transport-level
//! error raises a sticky failure flag; a failed connection is terminal
//! for the session, reconnection means remounting the room.

use crate::data::{ClientConfig, ParticipantId};
use crate::error::ConnectionError;
use crate::protocol::Command;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

/// Build the channel address for a (room, participant) pair
pub fn channel_url(
    config: &ClientConfig,
    room_id: &str,
    participant: &ParticipantId,
) -> Result<Url, ConnectionError> {
    let address = format!(
        "{}/ws/room/{}/{}",
        config.ws_endpoint.trim_end_matches('/'),
        room_id,
        participant
    );

    Url::parse(&address)
        .map_err(|e| ConnectionError::EstablishmentFailed(format!("Invalid URL: {}", e)))
}

/// Handle to one live room connection
pub struct LiveChannel {
    outbound: mpsc::UnboundedSender<String>,
    failed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl LiveChannel {
    /// Establish the connection and start the reader/writer tasks
    ///
    /// `on_message` is invoked once per inbound text frame, in delivery
    /// order, with the raw payload.
    pub async fn connect<F>(
        config: &ClientConfig,
        room_id: &str,
        participant: &ParticipantId,
        on_message: F,
    ) -> Result<Self, ConnectionError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let url = channel_url(config, room_id, participant)?;

        let ws_stream = tokio::select! {
            result = connect_async(url) => {
                match result {
                    Ok((ws_stream, _)) => {
                        tracing::info!("Room channel established for room {}", room_id);
                        ws_stream
                    }
                    Err(e) => {
                        return Err(ConnectionError::EstablishmentFailed(format!(
                            "Connection failed: {}",
                            e
                        )));
                    }
                }
            }
            _ = sleep(config.timeout) => {
                return Err(ConnectionError::Timeout("Connection timeout".to_string()));
            }
        };

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let failed = Arc::new(AtomicBool::new(false));

        let writer_failed = Arc::clone(&failed);
        let writer = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if let Err(e) = ws_sender.send(Message::Text(text)).await {
                    tracing::error!("Failed to send room command: {}", e);
                    writer_failed.store(true, Ordering::SeqCst);
                    break;
                }
            }
        });

        let reader_failed = Arc::clone(&failed);
        let reader = tokio::spawn(async move {
            while let Some(message) = ws_receiver.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        on_message(text);
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Room channel closed by server");
                        break;
                    }
                    Ok(_) => {
                        tracing::debug!("Ignoring non-text frame");
                    }
                    Err(e) => {
                        tracing::error!("Room channel error: {}", e);
                        reader_failed.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            outbound: tx,
            failed,
            reader,
            writer,
        })
    }

    /// Queue a command for transmission, fire-and-forget
    ///
    /// There is no delivery confirmation; success is observed through
    /// the eventual inbound echo of the action.
    pub fn send(&self, command: &Command) -> Result<(), ConnectionError> {
        if self.connection_failed() {
            return Err(ConnectionError::SendFailed(
                "Channel already failed".to_string(),
            ));
        }

        let text = command
            .to_text()
            .map_err(|e| ConnectionError::SendFailed(format!("{}", e)))?;

        self.outbound
            .send(text)
            .map_err(|_| ConnectionError::SendFailed("Writer task gone".to_string()))
    }

    /// Sticky transport-failure flag
    ///
    /// Set on any transport-level error and never cleared; recovery
    /// requires remounting the room.
    pub fn connection_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Drop the socket and stop both tasks
    pub fn close(&self) {
        self.reader.abort();
        self.writer.abort();
        tracing::info!("Room channel released");
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.close();
    }
}
