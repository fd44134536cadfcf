//! Bid eligibility and pricing rules
//!
//! Pure functions of the item record and the bid list, recomputed on every
//! read. Authoritative acceptance lives server-side; these rules only stop
//! requests that could never succeed.

use chrono::{DateTime, Utc};

use crate::auth::Principal;
use crate::bidding::ledger::BidLedger;
use crate::model::AuctionItem;

/// The current bid to display: highest recorded bid, or the starting bid
/// when nobody has bid yet
pub fn current_bid(item: &AuctionItem, ledger: &BidLedger) -> i64 {
    ledger
        .highest()
        .map(|b| b.bid_amount)
        .unwrap_or(item.starting_bid)
}

/// The minimum acceptable next bid.
///
/// The first bid meets the starting price; later bids must clear the
/// current bid by the item's increment.
pub fn minimum_bid(item: &AuctionItem, ledger: &BidLedger) -> i64 {
    match ledger.highest() {
        Some(highest) => highest.bid_amount + item.effective_increment(),
        None => item.starting_bid,
    }
}

/// Whether this principal may bid on this item at the given instant:
/// signed in, not the seller, and the auction has not ended.
pub fn can_bid_at(
    principal: Option<&Principal>,
    item: &AuctionItem,
    now: DateTime<Utc>,
) -> bool {
    match principal {
        Some(p) => p.id != item.seller_id && now < item.end_date,
        None => false,
    }
}

/// Whether this principal may buy the item outright at the given instant
pub fn can_buy_now_at(
    principal: Option<&Principal>,
    item: &AuctionItem,
    now: DateTime<Utc>,
) -> bool {
    item.buy_now_price.is_some() && can_bid_at(principal, item, now)
}

/// Whether the principal holds the current highest bid
pub fn is_highest_bidder(principal: &Principal, ledger: &BidLedger) -> bool {
    ledger
        .highest()
        .map(|b| b.bidder_id == principal.id)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AuctionStatus;
    use chrono::{Duration, TimeZone};

    fn item(starting_bid: i64, bid_increment: Option<i64>) -> AuctionItem {
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        AuctionItem {
            id: 1,
            seller_id: "seller-1".to_string(),
            title: "Walnut desk".to_string(),
            description: String::new(),
            starting_bid,
            bid_increment,
            reserve_price: None,
            buy_now_price: None,
            image_url: None,
            start_date: None,
            end_date: now + Duration::days(3),
            status: AuctionStatus::Active,
            created_at: now,
        }
    }

    fn bid(id: i64, bidder: &str, amount: i64) -> crate::model::Bid {
        crate::model::Bid {
            id,
            auction_item_id: 1,
            bidder_id: bidder.to_string(),
            bid_amount: amount,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, id as u32).unwrap(),
        }
    }

    fn principal(id: &str) -> Principal {
        Principal {
            id: id.to_string(),
            email: None,
        }
    }

    #[test]
    fn minimum_equals_starting_bid_with_no_bids() {
        let item = item(1000, Some(100));
        let ledger = BidLedger::new();
        assert_eq!(minimum_bid(&item, &ledger), 1000);
        assert_eq!(current_bid(&item, &ledger), 1000);
    }

    #[test]
    fn minimum_steps_by_increment_after_first_bid() {
        // starting_bid=1000, increment=100: the opening bid of 1000 is
        // accepted at par, then the floor moves to 1100
        let item = item(1000, Some(100));
        let mut ledger = BidLedger::new();
        assert_eq!(minimum_bid(&item, &ledger), 1000);

        ledger.merge(bid(1, "bidder-a", 1000));
        assert_eq!(current_bid(&item, &ledger), 1000);
        assert_eq!(minimum_bid(&item, &ledger), 1100);
    }

    #[test]
    fn increment_defaults_to_one_when_unset() {
        let item = item(500, None);
        let ledger = BidLedger::from_bids(vec![bid(1, "bidder-a", 500)]);
        assert_eq!(minimum_bid(&item, &ledger), 501);
    }

    #[test]
    fn can_bid_requires_a_principal() {
        let item = item(1000, Some(100));
        let now = item.created_at;
        assert!(!can_bid_at(None, &item, now));
        assert!(can_bid_at(Some(&principal("bidder-a")), &item, now));
    }

    #[test]
    fn seller_cannot_bid_on_own_listing() {
        let item = item(1000, Some(100));
        let now = item.created_at;
        assert!(!can_bid_at(Some(&principal("seller-1")), &item, now));
    }

    #[test]
    fn bidding_closes_at_the_end_date() {
        let item = item(1000, Some(100));
        let p = principal("bidder-a");
        assert!(can_bid_at(Some(&p), &item, item.end_date - Duration::seconds(1)));
        assert!(!can_bid_at(Some(&p), &item, item.end_date));
        assert!(!can_bid_at(Some(&p), &item, item.end_date + Duration::hours(1)));
    }

    #[test]
    fn highest_bidder_tracks_the_most_recent_bid() {
        let ledger =
            BidLedger::from_bids(vec![bid(1, "bidder-a", 1000), bid(2, "bidder-b", 1100)]);
        assert!(is_highest_bidder(&principal("bidder-b"), &ledger));
        assert!(!is_highest_bidder(&principal("bidder-a"), &ledger));
        assert!(!is_highest_bidder(&principal("bidder-a"), &BidLedger::new()));
    }

    #[test]
    fn buy_now_needs_a_price_and_an_open_auction() {
        let mut item = item(1000, Some(100));
        let p = principal("bidder-a");
        let now = item.created_at;

        assert!(!can_buy_now_at(Some(&p), &item, now));
        item.buy_now_price = Some(5000);
        assert!(can_buy_now_at(Some(&p), &item, now));
        assert!(!can_buy_now_at(Some(&p), &item, item.end_date));
        assert!(!can_buy_now_at(None, &item, now));
    }
}
