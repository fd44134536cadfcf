//! Storefront browsing queries
//!
//! Read-only views over the public catalog: active auctions, bid histories,
//! declutter listings. Everything is fetched fresh; derived figures like the
//! current bid are recomputed from the rows, never cached.

use reqwest::Client;
use tracing::debug;

use crate::auth::Principal;
use crate::bidding::BidSession;
use crate::data::TableClient;
use crate::error::Error;
use crate::model::{AuctionItem, Bid, DeclutterListing};

/// Client for browsing the marketplace catalog
pub struct CatalogClient {
    url: String,
    key: String,
    client: Client,
}

impl CatalogClient {
    pub(crate) fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
        }
    }

    fn table(&self, name: &str) -> TableClient {
        TableClient::new(&self.url, &self.key, name, self.client.clone())
    }

    /// Active auctions, soonest-ending first
    pub async fn active_auctions(&self) -> Result<Vec<AuctionItem>, Error> {
        self.table("auction_items")
            .select("*")
            .eq("status", "active")
            .order("end_date", true)
            .execute()
            .await
    }

    /// One auction by id, if it exists
    pub async fn auction(&self, id: i64) -> Result<Option<AuctionItem>, Error> {
        self.table("auction_items")
            .select("*")
            .eq("id", id)
            .execute_one()
            .await
    }

    /// Bid history for an auction, newest first
    pub async fn bids_for(&self, auction_item_id: i64) -> Result<Vec<Bid>, Error> {
        self.table("bids")
            .select("*")
            .eq("auction_item_id", auction_item_id)
            .order("created_at", false)
            .execute()
            .await
    }

    /// Search active auctions by title
    pub async fn search_auctions(&self, term: &str) -> Result<Vec<AuctionItem>, Error> {
        self.table("auction_items")
            .select("*")
            .eq("status", "active")
            .ilike("title", &format!("%{}%", term))
            .order("end_date", true)
            .execute()
            .await
    }

    /// Active declutter listings, newest first
    pub async fn declutter_listings(&self) -> Result<Vec<DeclutterListing>, Error> {
        self.table("declutter_listings")
            .select("*")
            .eq("status", "active")
            .order("created_at", false)
            .execute()
            .await
    }

    /// Open the bidding view for an auction: fetch the item and its bid
    /// history and fold them into a ready [`BidSession`]
    pub async fn bid_session(
        &self,
        auction_item_id: i64,
        principal: Option<Principal>,
    ) -> Result<Option<BidSession>, Error> {
        let item = match self.auction(auction_item_id).await? {
            Some(item) => item,
            None => return Ok(None),
        };
        let bids = self.bids_for(auction_item_id).await?;
        debug!(auction_item_id, bids = bids.len(), "bidding view loaded");
        Ok(Some(BidSession::new(item, bids, principal)))
    }
}
