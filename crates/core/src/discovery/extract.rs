//! Text mining helpers for ticket content.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// UPS tracking numbers: `1Z` followed by 16 letters or digits.
///
/// Unanchored, so numbers glued to neighbouring text ("TakipNo1Z...") are
/// still found.
static TRACKING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)1Z[0-9A-Z]{16}").expect("tracking pattern is valid"));

/// All tracking numbers in `text`, in order of appearance, uppercased.
pub fn find_tracking_numbers(text: &str) -> Vec<String> {
    TRACKING_NUMBER
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_uppercase())
        .collect()
}

/// The last tracking number in `text`.
///
/// Later mentions supersede earlier ones (a corrected number posted as a
/// follow-up comment wins).
pub fn last_tracking_number(text: &str) -> Option<String> {
    TRACKING_NUMBER
        .find_iter(text)
        .last()
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// First whitespace-delimited token of a requester cell.
pub fn requester_id(requester: &str) -> Option<&str> {
    requester.split_whitespace().next()
}

/// Whether a ticket subject carries the discovery marker.
pub fn subject_has_marker(subject: &str, marker: &str) -> bool {
    !marker.is_empty() && subject.trim_start().starts_with(marker)
}
