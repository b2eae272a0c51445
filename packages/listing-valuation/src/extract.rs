//! Text heuristics for pulling a plate or a price out of a page fragment.
//!
//! Both functions are pure and return `None` when nothing usable is found;
//! a missing plate or price is an expected coverage gap, not an error.

use regex::Regex;
use std::sync::OnceLock;

/// Listed prices are cut to this many digits.
const MAX_PRICE_DIGITS: usize = 6;

fn plate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[a-zA-Z]{3}\d{3}").expect("plate pattern is valid"))
}

/// First Swedish-style registration number (`ABC123`) in the text.
pub fn plate_from_text(text: &str) -> Option<String> {
    plate_pattern()
        .find(text)
        .map(|m| m.as_str().to_string())
}

/// Digits of a price fragment such as `"185 000 kr"`, truncated to six digits.
pub fn price_from_text(text: &str) -> Option<String> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_PRICE_DIGITS)
        .collect();

    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}
