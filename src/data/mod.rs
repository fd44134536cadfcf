//! Typed access to the hosted relational data service
//!
//! Reads and writes go through table-scoped builders; server-side
//! constraints may still reject a write that passed local validation, and
//! such rejections surface as [`Error::Data`](crate::error::Error) without
//! touching any local state.

mod filter;
mod query;

use reqwest::Client;
use serde::Serialize;

pub use filter::*;
pub use query::*;

/// Client for operations on one table or view
pub struct TableClient {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// The table or view name
    table: String,

    /// Bearer token tagging requests with the acting principal
    auth: Option<String>,

    /// HTTP client
    client: Client,
}

impl TableClient {
    /// Create a new TableClient
    pub(crate) fn new(url: &str, key: &str, table: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            table: table.to_string(),
            auth: None,
            client,
        }
    }

    /// Attach a bearer token so requests act as the signed-in principal
    pub fn with_auth(mut self, token: &str) -> Self {
        self.auth = Some(token.to_string());
        self
    }

    /// Get the base URL for REST API requests
    fn get_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(
            self.get_url(),
            self.key.clone(),
            self.auth.clone(),
            columns,
            self.client.clone(),
        )
    }

    /// Insert data into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(
            self.get_url(),
            self.key.clone(),
            self.auth.clone(),
            values,
            self.client.clone(),
        )
    }

    /// Update data in the table
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(
            self.get_url(),
            self.key.clone(),
            self.auth.clone(),
            values,
            self.client.clone(),
        )
    }

    /// Upsert data in the table (insert or update if it exists)
    pub fn upsert<T: Serialize>(&self, values: T) -> UpsertBuilder<T> {
        UpsertBuilder::new(
            self.get_url(),
            self.key.clone(),
            self.auth.clone(),
            values,
            self.client.clone(),
        )
    }

    /// Delete data from the table
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(
            self.get_url(),
            self.key.clone(),
            self.auth.clone(),
            self.client.clone(),
        )
    }
}
