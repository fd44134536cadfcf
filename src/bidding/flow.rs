//! Bid submission flow
//!
//! Validates locally, writes exactly once through a [`BidStore`], and keeps
//! the ledger optimistic: the accepted bid is merged immediately and the
//! feed's echo of it deduplicates by id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::auth::Principal;
use crate::bidding::ledger::BidLedger;
use crate::bidding::rules;
use crate::bidding::timer::AuctionPhase;
use crate::data::TableClient;
use crate::error::{Error, ValidationError};
use crate::model::{AuctionItem, AuctionStatus, Bid, NewBid};

/// Write/read seam for the bid table, so the flow can be exercised against
/// a test double
#[async_trait]
pub trait BidStore: Send + Sync {
    /// Insert one bid and return the stored row
    async fn insert_bid(&self, bid: &NewBid) -> Result<Bid, Error>;
}

/// The bid table of the relational data service
pub struct BidsTable {
    table: TableClient,
}

impl BidsTable {
    pub(crate) fn new(table: TableClient) -> Self {
        Self { table }
    }
}

#[async_trait]
impl BidStore for BidsTable {
    async fn insert_bid(&self, bid: &NewBid) -> Result<Bid, Error> {
        let rows: Vec<Bid> = self.table.insert(bid).execute().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::data("bid insert returned no representation"))
    }
}

/// Bidding state for one viewed auction: the item, its bid list, and the
/// acting principal
pub struct BidSession {
    item: AuctionItem,
    ledger: BidLedger,
    principal: Option<Principal>,
    in_flight: bool,
}

impl BidSession {
    /// Build a session from a fetched item and its bid history
    pub fn new(item: AuctionItem, bids: Vec<Bid>, principal: Option<Principal>) -> Self {
        Self {
            item,
            ledger: BidLedger::from_bids(bids),
            principal,
            in_flight: false,
        }
    }

    pub fn item(&self) -> &AuctionItem {
        &self.item
    }

    pub fn ledger(&self) -> &BidLedger {
        &self.ledger
    }

    /// The current bid to display
    pub fn current_bid(&self) -> i64 {
        rules::current_bid(&self.item, &self.ledger)
    }

    /// The minimum acceptable next bid; pre-fills the bid input
    pub fn minimum_bid(&self) -> i64 {
        rules::minimum_bid(&self.item, &self.ledger)
    }

    /// Whether a submission is outstanding (the submit control disables)
    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// Whether the acting principal may bid at this instant
    pub fn can_bid_at(&self, now: DateTime<Utc>) -> bool {
        rules::can_bid_at(self.principal.as_ref(), &self.item, now)
    }

    /// Whether the acting principal holds the highest bid
    pub fn is_highest_bidder(&self) -> bool {
        match &self.principal {
            Some(p) => rules::is_highest_bidder(p, &self.ledger),
            None => false,
        }
    }

    /// Check an amount against every local rule without submitting.
    ///
    /// Violations never reach the network; the server re-checks everything
    /// anyway.
    pub fn validate_at(&self, amount: i64, now: DateTime<Utc>) -> Result<&Principal, Error> {
        let principal = self.principal.as_ref().ok_or(Error::AuthRequired)?;

        if principal.id == self.item.seller_id {
            return Err(ValidationError::SellerOwnListing.into());
        }

        let phase = AuctionPhase::of(&self.item, now);
        if self.item.status == AuctionStatus::Draft || phase == AuctionPhase::Upcoming {
            return Err(ValidationError::AuctionNotStarted.into());
        }
        if self.item.status == AuctionStatus::Ended || phase.is_ended() {
            return Err(ValidationError::AuctionEnded.into());
        }

        let minimum = self.minimum_bid();
        if amount < minimum {
            return Err(ValidationError::BelowMinimum {
                offered: amount,
                minimum,
            }
            .into());
        }

        Ok(principal)
    }

    /// Submit a bid: validate, write once, merge optimistically.
    ///
    /// On any failure the ledger is left exactly as it was.
    pub async fn submit_at(
        &mut self,
        amount: i64,
        store: &impl BidStore,
        now: DateTime<Utc>,
    ) -> Result<Bid, Error> {
        if self.in_flight {
            return Err(ValidationError::SubmissionInFlight.into());
        }

        let principal = self.validate_at(amount, now)?;
        let new_bid = NewBid {
            auction_item_id: self.item.id,
            bidder_id: principal.id.clone(),
            bid_amount: amount,
        };

        self.in_flight = true;
        let result = store.insert_bid(&new_bid).await;
        self.in_flight = false;

        match result {
            Ok(bid) => {
                info!(
                    auction_item_id = self.item.id,
                    bid_amount = amount,
                    "bid accepted"
                );
                self.ledger.merge(bid.clone());
                Ok(bid)
            }
            Err(e) => {
                warn!(auction_item_id = self.item.id, error = %e, "bid rejected");
                Err(e)
            }
        }
    }

    /// Merge a bid arriving from the change feed. Duplicates (including the
    /// echo of an optimistic insert) are no-ops.
    pub fn merge_remote(&mut self, bid: Bid) -> bool {
        self.ledger.merge(bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Spy store counting writes, so tests can assert that rejected bids
    /// never reach the network
    #[derive(Default)]
    struct SpyStore {
        writes: AtomicUsize,
        response: Mutex<Option<Result<Bid, Error>>>,
    }

    impl SpyStore {
        fn accepting(bid: Bid) -> Self {
            Self {
                writes: AtomicUsize::new(0),
                response: Mutex::new(Some(Ok(bid))),
            }
        }

        fn rejecting(msg: &str) -> Self {
            Self {
                writes: AtomicUsize::new(0),
                response: Mutex::new(Some(Err(Error::data(msg)))),
            }
        }

        fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BidStore for SpyStore {
        async fn insert_bid(&self, _bid: &NewBid) -> Result<Bid, Error> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.response
                .lock()
                .unwrap()
                .take()
                .expect("spy store called more than once")
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
    }

    fn item() -> AuctionItem {
        AuctionItem {
            id: 42,
            seller_id: "seller-1".to_string(),
            title: "Turntable".to_string(),
            description: String::new(),
            starting_bid: 1000,
            bid_increment: Some(100),
            reserve_price: None,
            buy_now_price: None,
            image_url: None,
            start_date: None,
            end_date: now() + Duration::days(2),
            status: AuctionStatus::Active,
            created_at: now(),
        }
    }

    fn principal(id: &str) -> Principal {
        Principal {
            id: id.to_string(),
            email: None,
        }
    }

    fn stored_bid(id: i64, bidder: &str, amount: i64) -> Bid {
        Bid {
            id,
            auction_item_id: 42,
            bidder_id: bidder.to_string(),
            bid_amount: amount,
            created_at: now() + Duration::seconds(id),
        }
    }

    #[tokio::test]
    async fn below_minimum_never_reaches_the_store() {
        let store = SpyStore::default();
        let mut session = BidSession::new(item(), vec![], Some(principal("bidder-a")));

        let err = session.submit_at(900, &store, now()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::BelowMinimum {
                offered: 900,
                minimum: 1000
            })
        ));
        assert_eq!(store.write_count(), 0);
        assert!(session.ledger().is_empty());
    }

    #[tokio::test]
    async fn ended_auction_rejects_even_authenticated_non_sellers() {
        let mut ended = item();
        ended.end_date = now() - Duration::hours(1);
        let store = SpyStore::default();
        let mut session = BidSession::new(ended, vec![], Some(principal("bidder-a")));

        assert!(!session.can_bid_at(now()));
        let err = session.submit_at(2000, &store, now()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::AuctionEnded)
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn seller_and_signed_out_rejections_stay_local() {
        let store = SpyStore::default();

        let mut as_seller = BidSession::new(item(), vec![], Some(principal("seller-1")));
        let err = as_seller.submit_at(1000, &store, now()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::SellerOwnListing)
        ));

        let mut signed_out = BidSession::new(item(), vec![], None);
        let err = signed_out.submit_at(1000, &store, now()).await.unwrap_err();
        assert!(matches!(err, Error::AuthRequired));

        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn draft_auction_is_not_biddable() {
        let mut draft = item();
        draft.status = AuctionStatus::Draft;
        let store = SpyStore::default();
        let mut session = BidSession::new(draft, vec![], Some(principal("bidder-a")));

        let err = session.submit_at(1000, &store, now()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::AuctionNotStarted)
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn accepted_bid_is_merged_and_minimum_moves() {
        let store = SpyStore::accepting(stored_bid(7, "bidder-a", 1000));
        let mut session = BidSession::new(item(), vec![], Some(principal("bidder-a")));
        assert_eq!(session.minimum_bid(), 1000);

        let bid = session.submit_at(1000, &store, now()).await.unwrap();
        assert_eq!(bid.id, 7);
        assert_eq!(store.write_count(), 1);
        assert_eq!(session.current_bid(), 1000);
        assert_eq!(session.minimum_bid(), 1100);
        assert!(session.is_highest_bidder());
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn feed_echo_of_own_bid_does_not_duplicate() {
        let store = SpyStore::accepting(stored_bid(7, "bidder-a", 1000));
        let mut session = BidSession::new(item(), vec![], Some(principal("bidder-a")));

        session.submit_at(1000, &store, now()).await.unwrap();
        assert!(!session.merge_remote(stored_bid(7, "bidder-a", 1000)));
        assert_eq!(session.ledger().len(), 1);
    }

    #[tokio::test]
    async fn server_rejection_leaves_the_ledger_unchanged() {
        let store = SpyStore::rejecting("stale minimum");
        let existing = stored_bid(1, "bidder-b", 1000);
        let mut session =
            BidSession::new(item(), vec![existing.clone()], Some(principal("bidder-a")));

        let err = session.submit_at(1100, &store, now()).await.unwrap_err();
        assert!(matches!(err, Error::Data(_)));
        assert_eq!(store.write_count(), 1);
        assert_eq!(session.ledger().bids(), &[existing]);
        assert!(!session.is_submitting());
    }
}
