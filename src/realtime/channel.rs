//! Channels and subscriptions on the realtime change feed

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::realtime::message::{ChangePayload, ChannelEvent, FeedMessage};
use crate::realtime::{ConnectionState, RealtimeClient};

/// How long `subscribe` waits for the connection to come up
const CONNECT_WAIT: Duration = Duration::from_secs(10);

/// Record-change subscription config: which table, which events, which rows
#[derive(Debug, Clone, Serialize)]
pub struct RecordChanges {
    schema: String,
    table: String,
    events: Vec<ChannelEvent>,
    filter: Option<String>,
}

impl RecordChanges {
    /// Watch changes on a table in the public schema
    pub fn new(table: &str) -> Self {
        Self {
            schema: "public".to_string(),
            table: table.to_string(),
            events: Vec::new(),
            filter: None,
        }
    }

    /// Override the schema
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    /// Add an event kind to watch
    pub fn event(mut self, event: ChannelEvent) -> Self {
        if !self.events.contains(&event) {
            self.events.push(event);
        }
        self
    }

    /// Restrict to rows where a column equals a value
    pub fn eq<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.filter = Some(format!("{}=eq.{}", column, value.to_string()));
        self
    }

    /// Convert the config to its join-payload form
    pub(crate) fn to_channel_config(&self) -> Value {
        let events: Vec<String> = self.events.iter().map(|e| e.to_string()).collect();

        let mut config = json!({
            "schema": self.schema,
            "table": self.table,
            "events": events,
        });
        if let Some(filter) = &self.filter {
            config["filter"] = json!(filter);
        }
        config
    }
}

type CallbackFn = Box<dyn Fn(ChangePayload) + Send + Sync>;

/// An active subscription. Dropping it releases the listener.
pub struct Subscription {
    id: String,
    channel: Arc<Channel>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let id = self.id.clone();
        let channel = self.channel.clone();
        tokio::spawn(async move {
            if let Err(e) = channel.unsubscribe(&id).await {
                warn!(error = %e, "failed to unsubscribe from channel");
            }
        });
    }
}

/// Internal channel state shared between the client reader task and
/// subscriptions
pub(crate) struct Channel {
    topic: String,
    socket: Arc<RwLock<Option<mpsc::Sender<Message>>>>,
    next_ref: Arc<AtomicU32>,
    callbacks: Arc<RwLock<HashMap<String, CallbackFn>>>,
    join_payload: RwLock<Value>,
}

impl Channel {
    fn new(
        topic: String,
        socket: Arc<RwLock<Option<mpsc::Sender<Message>>>>,
        next_ref: Arc<AtomicU32>,
    ) -> Self {
        Self {
            topic,
            socket,
            next_ref,
            callbacks: Arc::new(RwLock::new(HashMap::new())),
            join_payload: RwLock::new(json!({})),
        }
    }

    /// Whether any subscription is still listening on this channel
    pub(crate) async fn has_listeners(&self) -> bool {
        !self.callbacks.read().await.is_empty()
    }

    /// The join payload to replay when the connection is re-established
    pub(crate) async fn join_message(&self) -> Value {
        let payload = self.join_payload.read().await.clone();
        json!({
            "topic": self.topic,
            "event": ChannelEvent::PhoenixJoin,
            "payload": payload,
            "ref": self.next_ref.fetch_add(1, Ordering::SeqCst).to_string(),
        })
    }

    async fn send(&self, message: Value) -> Result<(), Error> {
        let socket_guard = self.socket.read().await;
        match socket_guard.as_ref() {
            Some(socket_tx) => socket_tx
                .send(Message::Text(message.to_string()))
                .await
                .map_err(|e| Error::realtime(format!("socket send failed: {}", e))),
            None => Err(Error::realtime("socket unavailable")),
        }
    }

    /// Remove one subscription; leave the channel when the last one goes
    async fn unsubscribe(&self, id: &str) -> Result<(), Error> {
        self.callbacks.write().await.remove(id);

        if !self.has_listeners().await {
            debug!(topic = %self.topic, "last subscription dropped, leaving channel");
            let leave = json!({
                "topic": self.topic,
                "event": ChannelEvent::PhoenixLeave,
                "payload": {},
                "ref": self.next_ref.fetch_add(1, Ordering::SeqCst).to_string(),
            });
            // A dead socket means there is nothing to leave
            if let Err(e) = self.send(leave).await {
                trace!(topic = %self.topic, error = %e, "leave not sent");
            }
        }
        Ok(())
    }

    /// Route one incoming frame to the registered callbacks
    pub(crate) async fn handle_message(&self, message: FeedMessage) {
        match message.event {
            ChannelEvent::PostgresChanges
            | ChannelEvent::Insert
            | ChannelEvent::Update
            | ChannelEvent::Delete => {
                let data = message
                    .payload
                    .get("data")
                    .cloned()
                    .unwrap_or(message.payload.clone());
                let payload = ChangePayload {
                    event_type: data.get("type").and_then(|v| v.as_str()).map(String::from),
                    timestamp: data
                        .get("commit_timestamp")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    data,
                };

                let callbacks = self.callbacks.read().await;
                trace!(
                    topic = %self.topic,
                    listeners = callbacks.len(),
                    "dispatching record change"
                );
                for callback in callbacks.values() {
                    (callback)(payload.clone());
                }
            }
            ChannelEvent::PhoenixReply => {
                trace!(topic = %self.topic, "join/leave acknowledged");
            }
            ChannelEvent::PhoenixError => {
                warn!(topic = %self.topic, payload = %message.payload, "channel error");
            }
            ChannelEvent::PhoenixClose => {
                debug!(topic = %self.topic, "channel closed by remote");
            }
            other => {
                trace!(topic = %self.topic, event = %other, "unhandled channel event");
            }
        }
    }
}

/// Builder registering record-change callbacks before joining a channel
pub struct ChannelBuilder<'a> {
    client: &'a RealtimeClient,
    topic: String,
    record_callbacks: Vec<(String, RecordChanges, CallbackFn)>,
}

impl<'a> ChannelBuilder<'a> {
    pub(crate) fn new(client: &'a RealtimeClient, topic: &str) -> Self {
        Self {
            client,
            topic: topic.to_string(),
            record_callbacks: Vec::new(),
        }
    }

    /// Register a callback for record changes matching `changes`
    pub fn on<F>(mut self, changes: RecordChanges, callback: F) -> Self
    where
        F: Fn(ChangePayload) + Send + Sync + 'static,
    {
        let id = uuid::Uuid::new_v4().to_string();
        self.record_callbacks
            .push((id, changes, Box::new(callback)));
        self
    }

    /// Join the channel and start receiving events.
    ///
    /// Connects the client first when it is not connected yet.
    pub async fn subscribe(self) -> Result<Vec<Subscription>, Error> {
        let mut rx = self.client.on_state_change();

        let initial_state = self.client.connection_state().await;
        if initial_state != ConnectionState::Connected {
            debug!(state = ?initial_state, "client not connected, connecting before join");
            let connect_future = self.client.connect();
            tokio::spawn(async move {
                if let Err(e) = connect_future.await {
                    warn!(error = %e, "background connect failed");
                }
            });

            let wait_result = timeout(CONNECT_WAIT, async {
                loop {
                    match rx.recv().await {
                        Ok(ConnectionState::Connected) => break Ok(()),
                        Ok(ConnectionState::Connecting)
                        | Ok(ConnectionState::Reconnecting) => continue,
                        Ok(other) => {
                            break Err(Error::realtime(format!(
                                "connection attempt ended in state {:?}",
                                other
                            )))
                        }
                        Err(_) => {
                            break Err(Error::realtime(
                                "state channel closed while waiting for connection",
                            ))
                        }
                    }
                }
            })
            .await;

            match wait_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    let state = self.client.connection_state().await;
                    return Err(Error::realtime(format!(
                        "timed out waiting for connection (state {:?})",
                        state
                    )));
                }
            }
        }

        // Get or create the shared channel for this topic
        let channel = {
            let mut channels = self.client.channels.write().await;
            channels
                .entry(self.topic.clone())
                .or_insert_with(|| {
                    Arc::new(Channel::new(
                        self.topic.clone(),
                        self.client.socket.clone(),
                        self.client.next_ref.clone(),
                    ))
                })
                .clone()
        };

        // Register callbacks and collect the join config
        let mut configs = Vec::new();
        let mut subscriptions = Vec::new();
        for (id, changes, callback) in self.record_callbacks {
            configs.push(changes.to_channel_config());
            channel.callbacks.write().await.insert(id.clone(), callback);
            subscriptions.push(Subscription {
                id,
                channel: channel.clone(),
            });
        }

        let payload = json!({ "postgres_changes": configs });
        *channel.join_payload.write().await = payload;

        let join = channel.join_message().await;
        channel.send(join).await?;
        debug!(topic = %channel.topic, "join sent");

        Ok(subscriptions)
    }
}
