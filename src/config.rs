//! Configuration options for the Lotwise client

use std::time::Duration;

/// Configuration options for the Lotwise client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to automatically refresh the access token before it expires
    pub auto_refresh_token: bool,

    /// Whether to keep the session in memory across auth calls
    pub persist_session: bool,

    /// The request timeout applied to the shared HTTP client
    pub request_timeout: Option<Duration>,

    /// The database schema served by the relational data service
    pub db_schema: String,

    /// Heartbeat interval for the realtime connection, in milliseconds
    pub realtime_heartbeat_interval: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            realtime_heartbeat_interval: 30_000,
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the realtime heartbeat interval in milliseconds
    pub fn with_realtime_heartbeat_interval(mut self, value: u64) -> Self {
        self.realtime_heartbeat_interval = value;
        self
    }
}
