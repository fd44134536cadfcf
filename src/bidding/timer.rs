//! Auction timing derived from wall-clock time
//!
//! Nothing is persisted and no timers are scheduled: the phase is a pure
//! function of the stored timestamps and the current instant, recomputed on
//! every call. A reload lands in the same phase.

use chrono::{DateTime, Duration, Utc};

use crate::model::AuctionItem;

/// Window before the end date in which an auction counts as ending soon
const ENDING_SOON_WINDOW_MINUTES: i64 = 60;

/// Wall-clock phase of an auction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionPhase {
    /// Start date lies in the future
    Upcoming,
    /// Between start and end
    Active,
    /// Terminal: bidding and buy-now are disabled
    Ended,
}

impl AuctionPhase {
    /// The phase of `item` at instant `now`
    pub fn of(item: &AuctionItem, now: DateTime<Utc>) -> Self {
        if now >= item.end_date {
            return AuctionPhase::Ended;
        }
        if let Some(start) = item.start_date {
            if now < start {
                return AuctionPhase::Upcoming;
            }
        }
        AuctionPhase::Active
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, AuctionPhase::Ended)
    }
}

/// Time left until the end date; None once the auction has ended
pub fn time_remaining(item: &AuctionItem, now: DateTime<Utc>) -> Option<Duration> {
    if now >= item.end_date {
        return None;
    }
    Some(item.end_date - now)
}

/// Whether an active auction closes within the ending-soon window
pub fn ending_soon(item: &AuctionItem, now: DateTime<Utc>) -> bool {
    match AuctionPhase::of(item, now) {
        AuctionPhase::Active => {
            item.end_date - now <= Duration::minutes(ENDING_SOON_WINDOW_MINUTES)
        }
        _ => false,
    }
}
