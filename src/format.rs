//! Display formatting for prices and auction countdowns

use chrono::{DateTime, Duration, Utc};

use crate::bidding::{time_remaining, AuctionPhase};
use crate::model::AuctionItem;

/// Format an amount of minor units as a currency display string
pub fn format_price(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    let whole = abs / 100;
    let cents = abs % 100;

    let mut grouped = String::new();
    let digits = whole.to_string();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}${}.{:02}", sign, grouped, cents)
}

/// Format a remaining duration as a short countdown
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// The countdown label for an auction at the given instant
pub fn countdown_label(item: &AuctionItem, now: DateTime<Utc>) -> String {
    match AuctionPhase::of(item, now) {
        AuctionPhase::Ended => "Ended".to_string(),
        AuctionPhase::Upcoming => match item.start_date {
            Some(start) => format!("Starts in {}", format_countdown(start - now)),
            None => "Starts soon".to_string(),
        },
        AuctionPhase::Active => match time_remaining(item, now) {
            Some(remaining) => format!("{} left", format_countdown(remaining)),
            None => "Ended".to_string(),
        },
    }
}
