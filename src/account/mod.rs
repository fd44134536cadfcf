//! Account dashboard queries
//!
//! Thin typed reads for the signed-in account: bids placed, listings owned,
//! orders placed.

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::auth::Principal;
use crate::data::TableClient;
use crate::error::Error;
use crate::model::{AuctionItem, Bid, DeclutterListing, Order, WatchlistEntry};

#[derive(Serialize)]
struct WatchRow<'a> {
    user_id: &'a str,
    auction_item_id: i64,
}

/// Client for one account's dashboard views
pub struct AccountClient {
    url: String,
    key: String,
    client: Client,
    principal: Principal,
    access_token: String,
}

impl AccountClient {
    pub(crate) fn new(
        url: &str,
        key: &str,
        client: Client,
        principal: Principal,
        access_token: String,
    ) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            principal,
            access_token,
        }
    }

    fn table(&self, name: &str) -> TableClient {
        TableClient::new(&self.url, &self.key, name, self.client.clone())
            .with_auth(&self.access_token)
    }

    /// The account this dashboard belongs to
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Bids this account has placed, newest first
    pub async fn my_bids(&self) -> Result<Vec<Bid>, Error> {
        self.table("bids")
            .select("*")
            .eq("bidder_id", &self.principal.id)
            .order("created_at", false)
            .execute()
            .await
    }

    /// Auction listings this account sells, newest first
    pub async fn my_auctions(&self) -> Result<Vec<AuctionItem>, Error> {
        self.table("auction_items")
            .select("*")
            .eq("seller_id", &self.principal.id)
            .order("created_at", false)
            .execute()
            .await
    }

    /// Declutter listings this account sells, newest first
    pub async fn my_declutter_listings(&self) -> Result<Vec<DeclutterListing>, Error> {
        self.table("declutter_listings")
            .select("*")
            .eq("seller_id", &self.principal.id)
            .order("created_at", false)
            .execute()
            .await
    }

    /// Orders this account has placed, newest first
    pub async fn my_orders(&self) -> Result<Vec<Order>, Error> {
        self.table("orders")
            .select("*")
            .eq("buyer_id", &self.principal.id)
            .order("created_at", false)
            .execute()
            .await
    }

    /// Save an auction to the watchlist. Saving twice is a no-op.
    pub async fn watch(&self, auction_item_id: i64) -> Result<(), Error> {
        let row = WatchRow {
            user_id: &self.principal.id,
            auction_item_id,
        };
        let _rows: Vec<WatchlistEntry> = self
            .table("watchlist")
            .upsert(&row)
            .on_conflict("user_id,auction_item_id")
            .execute()
            .await?;
        debug!(auction_item_id, "auction watched");
        Ok(())
    }

    /// Remove an auction from the watchlist
    pub async fn unwatch(&self, auction_item_id: i64) -> Result<(), Error> {
        self.table("watchlist")
            .delete()
            .eq("user_id", &self.principal.id)
            .eq("auction_item_id", auction_item_id)
            .execute()
            .await
    }

    /// The watched auctions, resolved to their current item records
    pub async fn watched_auctions(&self) -> Result<Vec<AuctionItem>, Error> {
        let entries: Vec<WatchlistEntry> = self
            .table("watchlist")
            .select("*")
            .eq("user_id", &self.principal.id)
            .execute()
            .await?;

        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = entries.iter().map(|e| e.auction_item_id).collect();
        self.table("auction_items")
            .select("*")
            .in_list("id", &ids)
            .order("end_date", true)
            .execute()
            .await
    }
}
