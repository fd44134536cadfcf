//! Cart state and checkout
//!
//! The cart is plain local state owned by the view that displays it. Stock
//! movement and payment happen in the hosted `process-order` function;
//! checkout only calls it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::auth::Principal;
use crate::bidding::rules;
use crate::error::{Error, ValidationError};
use crate::functions::{FunctionInvokeOptions, FunctionsClient};
use crate::model::{AuctionItem, DeclutterListing, Order};

/// Name of the hosted order/stock-processing function
const PROCESS_ORDER_FN: &str = "process-order";

/// One cart line for a declutter listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub listing_id: i64,
    pub title: String,
    pub unit_price: i64,
    pub quantity: u32,
}

/// The cart for the current browsing session
#[derive(Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quantity of a listing, merging with an existing line.
    ///
    /// The combined quantity must not exceed what the listing has available.
    pub fn add(&mut self, listing: &DeclutterListing, quantity: u32) -> Result<(), ValidationError> {
        let existing = self
            .lines
            .iter()
            .find(|l| l.listing_id == listing.id)
            .map(|l| l.quantity)
            .unwrap_or(0);
        let requested = existing + quantity;

        if quantity == 0 || i64::from(requested) > listing.quantity_available {
            return Err(ValidationError::QuantityUnavailable {
                requested,
                available: listing.quantity_available,
            });
        }

        match self.lines.iter_mut().find(|l| l.listing_id == listing.id) {
            Some(line) => line.quantity = requested,
            None => self.lines.push(CartLine {
                listing_id: listing.id,
                title: listing.title.clone(),
                unit_price: listing.price,
                quantity,
            }),
        }
        Ok(())
    }

    /// Set the quantity of a line, removing it at zero
    pub fn set_quantity(&mut self, listing_id: i64, quantity: u32) {
        if quantity == 0 {
            self.remove(listing_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.listing_id == listing_id) {
            line.quantity = quantity;
        }
    }

    /// Remove a line
    pub fn remove(&mut self, listing_id: i64) {
        self.lines.retain(|l| l.listing_id != listing_id);
    }

    /// Drop every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// The lines, in insertion order
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total quantity across all lines
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Subtotal in minor units
    pub fn subtotal(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| l.unit_price * i64::from(l.quantity))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Serialize)]
struct OrderLineRequest {
    listing_id: i64,
    quantity: u32,
}

#[derive(Serialize)]
struct OrderRequest {
    buyer_id: String,
    lines: Vec<OrderLineRequest>,
}

#[derive(Serialize)]
struct BuyNowRequest {
    auction_item_id: i64,
    buyer_id: String,
}

/// Client placing orders through the hosted order-processing function
pub struct CheckoutClient {
    functions: FunctionsClient,
}

impl CheckoutClient {
    pub(crate) fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }

    /// Check out the cart. An empty cart is rejected before any network
    /// call; on failure the cart is left untouched for retry.
    pub async fn place_order(
        &self,
        cart: &Cart,
        principal: &Principal,
        access_token: &str,
    ) -> Result<Order, Error> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let request = OrderRequest {
            buyer_id: principal.id.clone(),
            lines: cart
                .lines()
                .iter()
                .map(|l| OrderLineRequest {
                    listing_id: l.listing_id,
                    quantity: l.quantity,
                })
                .collect(),
        };

        let response = self
            .functions
            .invoke::<OrderRequest, Order>(
                PROCESS_ORDER_FN,
                &FunctionInvokeOptions::new()
                    .with_body(request)
                    .with_auth(access_token),
            )
            .await?;

        info!(order_id = response.data.id, "order placed");
        Ok(response.data)
    }

    /// Buy an auction item outright at its buy-now price. Eligibility is
    /// checked locally first; the function settles the auction server-side.
    pub async fn buy_now(
        &self,
        item: &AuctionItem,
        principal: &Principal,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, Error> {
        if principal.id == item.seller_id {
            return Err(ValidationError::SellerOwnListing.into());
        }
        if !rules::can_buy_now_at(Some(principal), item, now) {
            return Err(ValidationError::AuctionEnded.into());
        }

        let request = BuyNowRequest {
            auction_item_id: item.id,
            buyer_id: principal.id.clone(),
        };

        let response = self
            .functions
            .invoke::<BuyNowRequest, Order>(
                PROCESS_ORDER_FN,
                &FunctionInvokeOptions::new()
                    .with_body(request)
                    .with_auth(access_token),
            )
            .await?;

        info!(
            order_id = response.data.id,
            auction_item_id = item.id,
            "buy-now order placed"
        );
        Ok(response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListingStatus;
    use chrono::TimeZone;

    fn listing(id: i64, price: i64, quantity: i64) -> DeclutterListing {
        DeclutterListing {
            id,
            seller_id: "seller-1".to_string(),
            title: format!("Listing {}", id),
            description: String::new(),
            price,
            quantity_available: quantity,
            image_url: None,
            status: ListingStatus::Active,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn adding_merges_lines_and_sums_subtotal() {
        let mut cart = Cart::new();
        cart.add(&listing(1, 500, 10), 2).unwrap();
        cart.add(&listing(2, 1200, 3), 1).unwrap();
        cart.add(&listing(1, 500, 10), 3).unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 6);
        assert_eq!(cart.subtotal(), 5 * 500 + 1200);
    }

    #[test]
    fn quantity_is_capped_by_availability() {
        let mut cart = Cart::new();
        let l = listing(1, 500, 3);
        cart.add(&l, 2).unwrap();

        let err = cart.add(&l, 2).unwrap_err();
        assert_eq!(
            err,
            ValidationError::QuantityUnavailable {
                requested: 4,
                available: 3
            }
        );
        // Failed add leaves the cart as it was
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let mut cart = Cart::new();
        cart.add(&listing(1, 500, 10), 2).unwrap();
        cart.set_quantity(1, 0);
        assert!(cart.is_empty());
    }
}
