//! Dashboard quote of the day.

use chrono::{Datelike, NaiveDate};

pub const QUOTES: &[&str] = &[
    "The best way to predict the future is to create it.",
    "Small progress is still progress.",
    "Focus on the journey, not the destination.",
    "Success is the sum of small efforts repeated day in and day out.",
];

/// Quote for a calendar day. Stable for the whole day.
pub fn quote_for(date: NaiveDate) -> &'static str {
    let index = date.num_days_from_ce().rem_euclid(QUOTES.len() as i32) as usize;
    QUOTES[index]
}
