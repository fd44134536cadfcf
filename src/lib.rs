//! Lotwise Marketplace Client Library
//!
//! A Rust client for the Lotwise auction and declutter marketplace:
//! typed wrappers over the hosted backend services (auth, relational data,
//! realtime change feed, storage, functions) plus the bidding core that the
//! storefront runs on: bid rules, submission flow, realtime reconciliation,
//! and auction timing.

pub mod account;
pub mod auth;
pub mod bidding;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod fetch;
pub mod format;
pub mod functions;
pub mod model;
pub mod realtime;
pub mod seller;
pub mod storage;

use reqwest::Client;

use crate::account::AccountClient;
use crate::auth::Auth;
use crate::bidding::BidsTable;
use crate::cart::CheckoutClient;
use crate::catalog::CatalogClient;
use crate::config::ClientOptions;
use crate::data::TableClient;
use crate::error::Error;
use crate::functions::FunctionsClient;
use crate::realtime::RealtimeClient;
use crate::seller::SellerClient;
use crate::storage::StorageClient;

/// The main entry point for the Lotwise client
pub struct Lotwise {
    /// The base URL for the project
    pub url: String,
    /// The anonymous API key for the project
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Auth client for account management and authentication
    pub auth: Auth,
    /// Client options
    pub options: ClientOptions,
}

impl Lotwise {
    /// Create a new Lotwise client
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL for your Lotwise project
    /// * `key` - The anonymous API key for your Lotwise project
    ///
    /// # Example
    ///
    /// ```
    /// use lotwise_client::Lotwise;
    ///
    /// let marketplace = Lotwise::new("https://your-project-url.lotwise.app", "your-anon-key");
    /// ```
    pub fn new(url: &str, key: &str) -> Self {
        Self::new_with_options(url, key, ClientOptions::default())
    }

    /// Create a new Lotwise client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use lotwise_client::{config::ClientOptions, Lotwise};
    ///
    /// let options = ClientOptions::default().with_auto_refresh_token(true);
    /// let marketplace = Lotwise::new_with_options(
    ///     "https://your-project-url.lotwise.app",
    ///     "your-anon-key",
    ///     options,
    /// );
    /// ```
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_default();

        let auth = Auth::new(url, key, http_client.clone(), options.clone());

        Self {
            url: url.to_string(),
            key: key.to_string(),
            http_client,
            auth,
            options,
        }
    }

    /// Get a reference to the auth client for account management
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Create a new TableClient for operations on a table or view
    ///
    /// # Example
    ///
    /// ```
    /// use lotwise_client::Lotwise;
    ///
    /// let marketplace = Lotwise::new("https://your-project-url.lotwise.app", "your-anon-key");
    /// let bids = marketplace.from("bids");
    /// ```
    pub fn from(&self, table: &str) -> TableClient {
        TableClient::new(&self.url, &self.key, table, self.http_client.clone())
    }

    /// Get a storage client for listing photos
    pub fn storage(&self) -> StorageClient {
        StorageClient::new(&self.url, &self.key, self.http_client.clone())
    }

    /// Get a realtime client for change-feed subscriptions.
    ///
    /// Each call returns an independent client; keep it alive for as long
    /// as its subscriptions should live.
    pub fn realtime(&self) -> RealtimeClient {
        let realtime_options = realtime::RealtimeClientOptions {
            heartbeat_interval: self.options.realtime_heartbeat_interval,
            ..Default::default()
        };
        RealtimeClient::new_with_options(&self.url, &self.key, realtime_options)
    }

    /// Get a functions client for hosted function invocation
    pub fn functions(&self) -> FunctionsClient {
        FunctionsClient::new(&self.url, &self.key, self.http_client.clone())
    }

    /// Get a catalog client for storefront browsing
    pub fn catalog(&self) -> CatalogClient {
        CatalogClient::new(&self.url, &self.key, self.http_client.clone())
    }

    /// Get a checkout client for cart and buy-now orders
    pub fn checkout(&self) -> CheckoutClient {
        CheckoutClient::new(self.functions())
    }

    /// The bid store used by the submission flow.
    ///
    /// Requires a signed-in session; writes are tagged with the principal.
    pub fn bids(&self) -> Result<BidsTable, Error> {
        let token = self.auth.access_token()?;
        Ok(BidsTable::new(self.from("bids").with_auth(&token)))
    }

    /// Listing management for the signed-in seller
    pub fn seller(&self) -> Result<SellerClient, Error> {
        let principal = self.auth.principal().ok_or(Error::AuthRequired)?;
        let token = self.auth.access_token()?;
        Ok(SellerClient::new(
            &self.url,
            &self.key,
            self.http_client.clone(),
            principal,
            token,
        ))
    }

    /// Dashboard queries for the signed-in account
    pub fn account(&self) -> Result<AccountClient, Error> {
        let principal = self.auth.principal().ok_or(Error::AuthRequired)?;
        let token = self.auth.access_token()?;
        Ok(AccountClient::new(
            &self.url,
            &self.key,
            self.http_client.clone(),
            principal,
            token,
        ))
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::Principal;
    pub use crate::bidding::{AuctionPhase, BidFeed, BidSession};
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, ValidationError};
    pub use crate::model::{AuctionItem, Bid, DeclutterListing, Order};
    pub use crate::Lotwise;
}
