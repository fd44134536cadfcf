//! Bidding core: rules, ledger, timing, submission, and reconciliation

mod feed;
mod flow;
mod ledger;
pub mod rules;
mod timer;

pub use feed::BidFeed;
pub use flow::{BidSession, BidStore, BidsTable};
pub use ledger::BidLedger;
pub use timer::{ending_soon, time_remaining, AuctionPhase};
