//! Seller listing management
//!
//! Creating and publishing auction drafts, declutter listings, and listing
//! photos. Listing invariants are checked here before any write; the data
//! service enforces them again authoritatively.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::auth::Principal;
use crate::data::TableClient;
use crate::error::{Error, ValidationError};
use crate::model::{AuctionItem, AuctionStatus, DeclutterListing, ListingStatus};
use crate::storage::{FileOptions, StorageClient};

/// Bucket holding listing photos
const PHOTO_BUCKET: &str = "listing-photos";

/// A new auction listing as composed in the listing form
#[derive(Debug, Clone)]
pub struct NewAuctionDraft {
    pub title: String,
    pub description: String,
    pub starting_bid: i64,
    pub bid_increment: Option<i64>,
    pub reserve_price: Option<i64>,
    pub buy_now_price: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
}

impl NewAuctionDraft {
    /// Check the listing invariants locally
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Listing("title must not be empty".into()));
        }
        if self.starting_bid <= 0 {
            return Err(ValidationError::Listing(
                "starting bid must be positive".into(),
            ));
        }
        if let Some(increment) = self.bid_increment {
            if increment <= 0 {
                return Err(ValidationError::Listing(
                    "bid increment must be positive".into(),
                ));
            }
        }
        if let Some(buy_now) = self.buy_now_price {
            if buy_now <= self.starting_bid {
                return Err(ValidationError::Listing(
                    "buy-now price must exceed the starting bid".into(),
                ));
            }
        }
        if self.end_date <= now {
            return Err(ValidationError::Listing(
                "end date must lie in the future".into(),
            ));
        }
        Ok(())
    }
}

/// A new declutter listing as composed in the listing form
#[derive(Debug, Clone)]
pub struct NewDeclutterDraft {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub quantity_available: i64,
}

impl NewDeclutterDraft {
    /// Check the listing invariants locally
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Listing("title must not be empty".into()));
        }
        if self.price <= 0 {
            return Err(ValidationError::Listing("price must be positive".into()));
        }
        if self.quantity_available <= 0 {
            return Err(ValidationError::Listing(
                "quantity must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct InsertAuctionItem<'a> {
    seller_id: &'a str,
    title: &'a str,
    description: &'a str,
    starting_bid: i64,
    bid_increment: Option<i64>,
    reserve_price: Option<i64>,
    buy_now_price: Option<i64>,
    start_date: Option<DateTime<Utc>>,
    end_date: DateTime<Utc>,
    status: AuctionStatus,
}

#[derive(Serialize)]
struct InsertDeclutterListing<'a> {
    seller_id: &'a str,
    title: &'a str,
    description: &'a str,
    price: i64,
    quantity_available: i64,
    status: ListingStatus,
}

#[derive(Serialize)]
struct StatusPatch {
    status: AuctionStatus,
}

#[derive(Serialize)]
struct ListingStatusPatch {
    status: ListingStatus,
}

#[derive(Serialize)]
struct ImagePatch<'a> {
    image_url: &'a str,
}

/// Client for managing one seller's listings
pub struct SellerClient {
    url: String,
    key: String,
    client: Client,
    principal: Principal,
    access_token: String,
}

impl SellerClient {
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

    /// Create an auction listing in `Draft`
    pub async fn create_auction(
        &self,
        draft: &NewAuctionDraft,
        now: DateTime<Utc>,
    ) -> Result<AuctionItem, Error> {
        draft.validate(now)?;

        let row = InsertAuctionItem {
            seller_id: &self.principal.id,
            title: &draft.title,
            description: &draft.description,
            starting_bid: draft.starting_bid,
            bid_increment: draft.bid_increment,
            reserve_price: draft.reserve_price,
            buy_now_price: draft.buy_now_price,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: AuctionStatus::Draft,
        };

        let rows: Vec<AuctionItem> = self.table("auction_items").insert(&row).execute().await?;
        let item = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::data("auction insert returned no representation"))?;
        info!(auction_item_id = item.id, "auction draft created");
        Ok(item)
    }

    /// Publish a draft: `Draft` becomes `Active`. The `Ended` transition is
    /// server-side only.
    pub async fn publish(&self, auction_item_id: i64) -> Result<AuctionItem, Error> {
        let rows: Vec<AuctionItem> = self
            .table("auction_items")
            .update(&StatusPatch {
                status: AuctionStatus::Active,
            })
            .eq("id", auction_item_id)
            .eq("seller_id", &self.principal.id)
            .eq("status", "draft")
            .execute()
            .await?;

        let item = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::data("no draft listing to publish"))?;
        info!(auction_item_id, "auction published");
        Ok(item)
    }

    /// This seller's auction listings, newest first
    pub async fn my_auctions(&self) -> Result<Vec<AuctionItem>, Error> {
        self.table("auction_items")
            .select("*")
            .eq("seller_id", &self.principal.id)
            .order("created_at", false)
            .execute()
            .await
    }

    /// Create a declutter listing, active immediately
    pub async fn create_declutter(
        &self,
        draft: &NewDeclutterDraft,
    ) -> Result<DeclutterListing, Error> {
        draft.validate()?;

        let row = InsertDeclutterListing {
            seller_id: &self.principal.id,
            title: &draft.title,
            description: &draft.description,
            price: draft.price,
            quantity_available: draft.quantity_available,
            status: ListingStatus::Active,
        };

        let rows: Vec<DeclutterListing> = self
            .table("declutter_listings")
            .insert(&row)
            .execute()
            .await?;
        let listing = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::data("listing insert returned no representation"))?;
        info!(listing_id = listing.id, "declutter listing created");
        Ok(listing)
    }

    /// Archive a declutter listing
    pub async fn archive_declutter(&self, listing_id: i64) -> Result<DeclutterListing, Error> {
        let rows: Vec<DeclutterListing> = self
            .table("declutter_listings")
            .update(&ListingStatusPatch {
                status: ListingStatus::Archived,
            })
            .eq("id", listing_id)
            .eq("seller_id", &self.principal.id)
            .execute()
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| Error::data("no listing to archive"))
    }

    /// This seller's declutter listings, newest first
    pub async fn my_declutter_listings(&self) -> Result<Vec<DeclutterListing>, Error> {
        self.table("declutter_listings")
            .select("*")
            .eq("seller_id", &self.principal.id)
            .order("created_at", false)
            .execute()
            .await
    }

    /// Upload a listing photo and record its public URL on the auction
    pub async fn attach_photo(
        &self,
        auction_item_id: i64,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        let extension = match content_type {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        };
        let path = format!(
            "auctions/{}/{}.{}",
            auction_item_id,
            uuid::Uuid::new_v4(),
            extension
        );

        let storage = StorageClient::new(&self.url, &self.key, self.client.clone());
        let bucket = storage.from(PHOTO_BUCKET);
        bucket
            .upload(
                &path,
                data,
                FileOptions::new().with_content_type(content_type),
            )
            .await?;
        let public_url = bucket.get_public_url(&path);

        let _rows: Vec<AuctionItem> = self
            .table("auction_items")
            .update(&ImagePatch {
                image_url: &public_url,
            })
            .eq("id", auction_item_id)
            .eq("seller_id", &self.principal.id)
            .execute()
            .await?;

        info!(auction_item_id, url = %public_url, "listing photo attached");
        Ok(public_url)
    }
}
