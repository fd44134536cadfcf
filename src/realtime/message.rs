//! Wire messages for the realtime change feed

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// A full message received or sent over the change-feed socket.
///
/// The feed speaks Phoenix-style framing: topic, event, payload, ref.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedMessage {
    pub topic: String,
    pub event: ChannelEvent,
    pub payload: Value,
    #[serde(rename = "ref")]
    pub message_ref: Value,
}

/// Channel events, including the Phoenix control events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelEvent {
    /// Row inserted
    Insert,
    /// Row updated
    Update,
    /// Row deleted
    Delete,
    /// Wildcard for record changes
    #[serde(rename = "*")]
    All,
    /// Record-change envelope event
    PostgresChanges,

    #[serde(rename = "phx_join")]
    PhoenixJoin,
    #[serde(rename = "phx_leave")]
    PhoenixLeave,
    #[serde(rename = "phx_reply")]
    PhoenixReply,
    #[serde(rename = "phx_error")]
    PhoenixError,
    #[serde(rename = "phx_close")]
    PhoenixClose,

    Heartbeat,
}

impl std::fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::All => "*",
            Self::PostgresChanges => "postgres_changes",
            Self::PhoenixJoin => "phx_join",
            Self::PhoenixLeave => "phx_leave",
            Self::PhoenixReply => "phx_reply",
            Self::PhoenixError => "phx_error",
            Self::PhoenixClose => "phx_close",
            Self::Heartbeat => "heartbeat",
        };
        write!(f, "{}", s)
    }
}

/// One record-change notification as delivered to a subscription callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePayload {
    /// The raw change data: `record`, `old_record`, `type`, table metadata
    pub data: Value,
    /// The change kind as reported by the feed ("INSERT", "UPDATE", ...)
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// Commit timestamp, when the feed reports one
    pub timestamp: Option<String>,
}

impl ChangePayload {
    /// Decode the new row carried by this change
    pub fn record<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        let record = self
            .data
            .get("record")
            .cloned()
            .ok_or_else(|| Error::realtime("change payload carries no record"))?;
        Ok(serde_json::from_value(record)?)
    }

    /// Decode the previous row carried by this change, for updates/deletes
    pub fn old_record<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        let record = self
            .data
            .get("old_record")
            .cloned()
            .ok_or_else(|| Error::realtime("change payload carries no old record"))?;
        Ok(serde_json::from_value(record)?)
    }

    /// Whether this change is an insert
    pub fn is_insert(&self) -> bool {
        self.event_type.as_deref() == Some("INSERT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_change_feed_frame() {
        let raw = json!({
            "topic": "auction:42",
            "event": "postgres_changes",
            "payload": {
                "data": {
                    "type": "INSERT",
                    "table": "bids",
                    "record": {"id": 7, "bid_amount": 1100}
                }
            },
            "ref": null
        });

        let msg: FeedMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.topic, "auction:42");
        assert_eq!(msg.event, ChannelEvent::PostgresChanges);
    }

    #[test]
    fn phoenix_events_use_their_wire_names() {
        assert_eq!(
            serde_json::to_string(&ChannelEvent::PhoenixJoin).unwrap(),
            "\"phx_join\""
        );
        assert_eq!(
            serde_json::from_str::<ChannelEvent>("\"heartbeat\"").unwrap(),
            ChannelEvent::Heartbeat
        );
    }
}
