//! Realtime change-feed client
//!
//! Subscribes to record changes over a WebSocket speaking Phoenix-style
//! framing (join/heartbeat/reply). Connection state is observable for
//! display; reconnection with backoff and channel rejoin is handled here,
//! so a dropped feed never blocks the rest of the client.

mod channel;
mod message;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::Error;
pub(crate) use channel::Channel;
pub use channel::{ChannelBuilder, RecordChanges, Subscription};
pub use message::{ChangePayload, ChannelEvent, FeedMessage};

/// Connection state of the change feed, observable for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Options for the realtime client
#[derive(Debug, Clone)]
pub struct RealtimeClientOptions {
    pub auto_reconnect: bool,
    pub max_reconnect_attempts: Option<u32>,
    pub reconnect_interval: u64,
    pub reconnect_backoff_factor: f64,
    pub max_reconnect_interval: u64,
    pub heartbeat_interval: u64,
}

impl Default for RealtimeClientOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            max_reconnect_attempts: None,
            reconnect_interval: 1000,
            reconnect_backoff_factor: 1.5,
            max_reconnect_interval: 30_000,
            heartbeat_interval: 30_000,
        }
    }
}

/// Client for the realtime change feed
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) url: String,
    pub(crate) key: String,
    pub(crate) next_ref: Arc<AtomicU32>,
    // Active channels by topic, shared with the reader task
    pub(crate) channels: Arc<RwLock<HashMap<String, Arc<Channel>>>>,
    // Sender feeding the socket writer task
    pub(crate) socket: Arc<RwLock<Option<mpsc::Sender<Message>>>>,
    pub(crate) options: RealtimeClientOptions,
    state: Arc<RwLock<ConnectionState>>,
    is_manually_closed: Arc<AtomicBool>,
    state_change: broadcast::Sender<ConnectionState>,
    access_token: Arc<RwLock<Option<String>>>,
}

impl RealtimeClient {
    /// Create a new client with default options
    pub fn new(url: &str, key: &str) -> Self {
        Self::new_with_options(url, key, RealtimeClientOptions::default())
    }

    /// Create a new client with custom options
    pub fn new_with_options(url: &str, key: &str, options: RealtimeClientOptions) -> Self {
        let (state_change_tx, _) = broadcast::channel(16);
        Self {
            url: url.to_string(),
            key: key.to_string(),
            next_ref: Arc::new(AtomicU32::new(1)),
            channels: Arc::new(RwLock::new(HashMap::new())),
            socket: Arc::new(RwLock::new(None)),
            options,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            is_manually_closed: Arc::new(AtomicBool::new(false)),
            state_change: state_change_tx,
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Attach the signed-in principal's access token to the feed
    pub async fn set_auth(&self, token: Option<String>) {
        let mut current_token = self.access_token.write().await;
        *current_token = token;
    }

    /// Receiver for connection-state change notifications
    pub fn on_state_change(&self) -> broadcast::Receiver<ConnectionState> {
        self.state_change.subscribe()
    }

    /// The current connection state
    pub async fn connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Builder for a channel on the given topic
    pub fn channel(&self, topic: &str) -> ChannelBuilder {
        ChannelBuilder::new(self, topic)
    }

    async fn set_state(&self, state: ConnectionState) {
        let mut current_state = self.state.write().await;
        if *current_state != state {
            debug!(from = ?*current_state, to = ?state, "connection state change");
            *current_state = state;
            // No receivers is fine; nobody is watching the indicator
            let _ = self.state_change.send(state);
        }
    }

    async fn websocket_url(&self) -> Result<String, Error> {
        let base_url = Url::parse(&self.url)?;
        match base_url.scheme() {
            "http" | "ws" | "https" | "wss" => {}
            s => {
                return Err(Error::realtime(format!("unsupported URL scheme: {}", s)));
            }
        }

        let token_guard = self.access_token.read().await;
        let token_param = token_guard
            .as_ref()
            .map(|t| format!("&token={}", t))
            .unwrap_or_default();

        Ok(format!(
            "{}?vsn=2.0.0&apikey={}{}",
            base_url.join("/realtime/v1/websocket")?,
            self.key,
            token_param
        ))
    }

    /// Connect to the feed. The returned future resolves once the socket is
    /// established; the reader and writer run in background tasks from then
    /// on. The future owns its state so it can be spawned.
    pub fn connect(&self) -> impl std::future::Future<Output = Result<(), Error>> + Send + 'static {
        let client = self.clone();
        async move {
            client.is_manually_closed.store(false, Ordering::SeqCst);
            client.establish().await
        }
    }

    async fn establish(&self) -> Result<(), Error> {
        let ws_url = self.websocket_url().await?;
        info!(url = %self.url, "connecting to change feed");
        self.set_state(ConnectionState::Connecting).await;

        let ws_stream = match connect_async(&ws_url).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                error!(error = %e, "change feed connection failed");
                self.set_state(ConnectionState::Disconnected).await;
                return Err(Error::realtime(format!("connection failed: {}", e)));
            }
        };

        self.set_state(ConnectionState::Connected).await;

        let (mut write, mut read) = ws_stream.split();
        let (socket_tx, mut socket_rx) = mpsc::channel::<Message>(100);
        *self.socket.write().await = Some(socket_tx);

        // Writer task: drains the internal queue into the socket
        tokio::spawn(async move {
            while let Some(message) = socket_rx.recv().await {
                trace!("writer sending frame");
                if let Err(e) = write.send(message).await {
                    error!(error = %e, "socket send failed, writer exiting");
                    socket_rx.close();
                    break;
                }
            }
            trace!("writer task finished");
        });

        // Reader task: routes frames and keeps the heartbeat
        let client = self.clone();
        tokio::spawn(async move {
            let heartbeat_interval = Duration::from_millis(client.options.heartbeat_interval);
            loop {
                tokio::select! {
                    biased;

                    msg_result = read.next() => {
                        match msg_result {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<FeedMessage>(&text) {
                                    Ok(feed_msg) => client.route_message(feed_msg).await,
                                    Err(e) => {
                                        warn!(error = %e, raw = %text, "unparseable feed frame");
                                    }
                                }
                            }
                            Some(Ok(msg)) if msg.is_close() => {
                                debug!("close frame received");
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                error!(error = %e, "socket read error");
                                break;
                            }
                            None => {
                                debug!("feed stream closed by remote");
                                break;
                            }
                        }
                    }

                    _ = sleep(heartbeat_interval) => {
                        let heartbeat = json!({
                            "topic": "phoenix",
                            "event": ChannelEvent::Heartbeat,
                            "payload": {},
                            "ref": client.next_ref.fetch_add(1, Ordering::SeqCst).to_string(),
                        });
                        if client.send_message(heartbeat).await.is_err() {
                            error!("heartbeat send failed, assuming connection lost");
                            break;
                        }
                    }
                }
            }

            *client.socket.write().await = None;
            client.set_state(ConnectionState::Disconnected).await;

            if !client.is_manually_closed.load(Ordering::SeqCst) && client.options.auto_reconnect {
                client.spawn_reconnect();
            }
        });

        Ok(())
    }

    /// Route an incoming frame to its channel by topic
    async fn route_message(&self, message: FeedMessage) {
        if message.topic == "phoenix" {
            trace!("phoenix control frame");
            return;
        }

        let channel = {
            let channels = self.channels.read().await;
            channels.get(&message.topic).cloned()
        };
        match channel {
            Some(channel) => {
                tokio::spawn(async move {
                    channel.handle_message(message).await;
                });
            }
            None => {
                trace!(topic = %message.topic, "frame for unsubscribed topic");
            }
        }
    }

    /// Reconnect with backoff until the feed is back or attempts run out
    fn spawn_reconnect(&self) {
        let client = self.clone();
        tokio::spawn(async move {
            let mut attempts = 0u32;
            let mut interval = client.options.reconnect_interval;

            loop {
                if client.is_manually_closed.load(Ordering::SeqCst) {
                    debug!("manual disconnect, stopping reconnect attempts");
                    break;
                }
                if let Some(max) = client.options.max_reconnect_attempts {
                    if attempts >= max {
                        warn!(attempts, "reconnect attempts exhausted");
                        break;
                    }
                }

                attempts += 1;
                client.set_state(ConnectionState::Reconnecting).await;
                sleep(Duration::from_millis(interval)).await;
                info!(attempt = attempts, "reconnecting to change feed");

                match client.establish().await {
                    Ok(()) => {
                        client.rejoin_channels().await;
                        break;
                    }
                    Err(e) => {
                        warn!(attempt = attempts, error = %e, "reconnect attempt failed");
                        interval = ((interval as f64 * client.options.reconnect_backoff_factor)
                            as u64)
                            .min(client.options.max_reconnect_interval);
                    }
                }
            }
        });
    }

    /// Replay joins for every channel that still has listeners
    async fn rejoin_channels(&self) {
        let channels = self.channels.read().await;
        for channel in channels.values() {
            if channel.has_listeners().await {
                let join = channel.join_message().await;
                if let Err(e) = self.send_message(join).await {
                    warn!(error = %e, "channel rejoin failed");
                }
            }
        }
    }

    /// Close the feed and stop reconnecting
    pub async fn disconnect(&self) -> Result<(), Error> {
        self.is_manually_closed.store(true, Ordering::SeqCst);
        self.set_state(ConnectionState::Disconnected).await;

        let mut socket_guard = self.socket.write().await;
        if let Some(socket_tx) = socket_guard.take() {
            // Dropping the sender ends the writer task and closes the socket
            drop(socket_tx);
            info!("change feed closed");
        }

        Ok(())
    }

    /// Send a raw frame through the socket
    pub(crate) async fn send_message(&self, message: serde_json::Value) -> Result<(), Error> {
        let socket_guard = self.socket.read().await;
        match socket_guard.as_ref() {
            Some(socket_tx) => socket_tx
                .send(Message::Text(message.to_string()))
                .await
                .map_err(|e| Error::realtime(format!("socket send failed: {}", e))),
            None => Err(Error::realtime("socket unavailable")),
        }
    }
}
