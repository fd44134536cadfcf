//! Marketplace records as read from and written to the data service
//!
//! Monetary amounts are integer minor units throughout. The current highest
//! bid is never stored on an item; it is derived from the bid list on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Effective bid increment when a listing does not set one
pub const DEFAULT_BID_INCREMENT: i64 = 1;

/// Stored lifecycle state of an auction listing.
///
/// `Draft` to `Active` happens when the seller publishes; the transition to
/// `Ended` is performed server-side and only observed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Draft,
    Active,
    Ended,
}

/// A single sellable listing accepting bids until its end date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionItem {
    pub id: i64,
    pub seller_id: String,
    pub title: String,
    pub description: String,
    pub starting_bid: i64,
    pub bid_increment: Option<i64>,
    /// Seller-set minimum acceptable winning bid, hidden from bidders
    pub reserve_price: Option<i64>,
    /// Fixed price allowing immediate purchase, bypassing bidding.
    /// Must exceed `starting_bid` when present.
    pub buy_now_price: Option<i64>,
    pub image_url: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
}

impl AuctionItem {
    /// Minimum amount by which a new bid must exceed the current highest bid
    pub fn effective_increment(&self) -> i64 {
        self.bid_increment.unwrap_or(DEFAULT_BID_INCREMENT)
    }
}

/// One bid event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub auction_item_id: i64,
    pub bidder_id: String,
    pub bid_amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new bid, tagged with the submitting principal
#[derive(Debug, Clone, Serialize)]
pub struct NewBid {
    pub auction_item_id: i64,
    pub bidder_id: String,
    pub bid_amount: i64,
}

/// Stored state of a declutter listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    SoldOut,
    Archived,
}

/// Fixed-price bulk-quantity listing, not auctioned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclutterListing {
    pub id: i64,
    pub seller_id: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub quantity_available: i64,
    pub image_url: Option<String>,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

/// One saved auction on an account's watchlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub user_id: String,
    pub auction_item_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

/// One line of a placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub listing_id: i64,
    pub quantity: u32,
    pub unit_price: i64,
}

/// An order as returned by the order-processing function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub buyer_id: String,
    pub total: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}
