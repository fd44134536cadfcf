//! Realtime reconciliation of the bid list
//!
//! Subscribes to bid inserts for one auction and merges each event into the
//! shared session. The merge is idempotent by bid id, so replays and the
//! echo of the session's own optimistic insert collapse to nothing.

use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::bidding::flow::BidSession;
use crate::error::Error;
use crate::model::Bid;
use crate::realtime::{ChannelEvent, RealtimeClient, RecordChanges, Subscription};

/// A live bid feed for one auction. Dropping it releases the subscription.
pub struct BidFeed {
    session: Arc<Mutex<BidSession>>,
    _subscriptions: Vec<Subscription>,
}

impl BidFeed {
    /// Subscribe to bid inserts for the session's auction.
    ///
    /// Connection state stays observable on `realtime` for the disconnected
    /// indicator; a dropped feed never blocks bidding itself.
    pub async fn attach(
        realtime: &RealtimeClient,
        session: Arc<Mutex<BidSession>>,
    ) -> Result<Self, Error> {
        let item_id = {
            let session = session.lock().unwrap();
            session.item().id
        };

        let handler_session = Arc::clone(&session);
        let subscriptions = realtime
            .channel(&format!("auction:{}", item_id))
            .on(
                RecordChanges::new("bids")
                    .event(ChannelEvent::Insert)
                    .eq("auction_item_id", item_id),
                move |change| match change.record::<Bid>() {
                    Ok(bid) => {
                        let mut session = handler_session.lock().unwrap();
                        if session.merge_remote(bid) {
                            debug!(auction_item_id = item_id, "bid event merged");
                        } else {
                            debug!(auction_item_id = item_id, "duplicate bid event ignored");
                        }
                    }
                    Err(e) => {
                        warn!(auction_item_id = item_id, error = %e, "undecodable bid event");
                    }
                },
            )
            .subscribe()
            .await?;

        Ok(Self {
            session,
            _subscriptions: subscriptions,
        })
    }

    /// The shared session this feed reconciles into
    pub fn session(&self) -> Arc<Mutex<BidSession>> {
        Arc::clone(&self.session)
    }
}
