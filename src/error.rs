//! Error handling for the Lotwise client

use std::fmt;
use thiserror::Error;

/// Unified error type for the Lotwise client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Access-token decoding errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// No signed-in principal where one is required
    #[error("Authentication required")]
    AuthRequired,

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Local rule violations, rejected before any network call
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Relational data read or write errors
    #[error("Data error: {0}")]
    Data(String),

    /// Realtime subscription errors
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serverless function errors
    #[error("Function error: {0}")]
    Function(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new data error
    pub fn data<T: fmt::Display>(msg: T) -> Self {
        Error::Data(msg.to_string())
    }

    /// Create a new realtime error
    pub fn realtime<T: fmt::Display>(msg: T) -> Self {
        Error::Realtime(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new function error
    pub fn function<T: fmt::Display>(msg: T) -> Self {
        Error::Function(msg.to_string())
    }

    /// Whether the error was raised locally, before any network traffic
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::AuthRequired)
    }
}

/// Rule violations detected locally. These never reach the network; the
/// authoritative checks live server-side and this layer is defense in depth.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Offered amount is below the minimum next bid
    #[error("bid of {offered} is below the minimum of {minimum}")]
    BelowMinimum { offered: i64, minimum: i64 },

    /// The auction has not started yet
    #[error("the auction has not started")]
    AuctionNotStarted,

    /// The auction has already ended
    #[error("the auction has ended")]
    AuctionEnded,

    /// Sellers cannot bid on their own listings
    #[error("sellers cannot bid on their own listing")]
    SellerOwnListing,

    /// A submission for this auction is already outstanding
    #[error("a bid submission is already in flight")]
    SubmissionInFlight,

    /// Checkout attempted with an empty cart
    #[error("the cart is empty")]
    EmptyCart,

    /// Requested quantity exceeds what the listing has available
    #[error("requested {requested} but only {available} available")]
    QuantityUnavailable { requested: u32, available: i64 },

    /// A new listing violates a listing invariant
    #[error("invalid listing: {0}")]
    Listing(String),
}
