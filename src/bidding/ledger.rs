//! In-memory bid list for one auction
//!
//! Newest first, which is also the display order. The most recent bid is
//! treated as highest; the feed's ordering is authoritative and nothing here
//! reorders causally.

use crate::model::Bid;

/// Ordered bid list with idempotent merge keyed by bid id
#[derive(Debug, Default)]
pub struct BidLedger {
    bids: Vec<Bid>,
}

impl BidLedger {
    /// An empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from a fetched bid history
    pub fn from_bids(mut bids: Vec<Bid>) -> Self {
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { bids }
    }

    /// Merge one bid event.
    ///
    /// A bid whose id is already present is a no-op and returns false, so
    /// replaying the same event any number of times leaves the ledger as
    /// merging it once did.
    pub fn merge(&mut self, bid: Bid) -> bool {
        if self.bids.iter().any(|b| b.id == bid.id) {
            return false;
        }
        let pos = self
            .bids
            .iter()
            .position(|b| b.created_at <= bid.created_at)
            .unwrap_or(self.bids.len());
        self.bids.insert(pos, bid);
        true
    }

    /// The highest (most recent) bid, if any
    pub fn highest(&self) -> Option<&Bid> {
        self.bids.first()
    }

    /// All bids, newest first
    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }
}
