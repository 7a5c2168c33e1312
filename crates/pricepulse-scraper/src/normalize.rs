//! Field normalization shared by every platform profile.
//!
//! All functions here are pure and total: malformed input degrades to the
//! sentinel rather than an error, so one bad card never aborts a listing.

use pricepulse_core::{DiscountPolicy, MissingOriginal, NoDiscount, UnitPolicy, SENTINEL};

/// Reduces a raw price string to its decimal digits.
///
/// `"₹1,299"` becomes `"1299"`. Empty input, the sentinel itself, and input
/// without any digit all yield the sentinel. Applying it twice is a no-op.
#[must_use]
pub fn clean_price(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        SENTINEL.to_string()
    } else {
        digits
    }
}

/// Derives a discount label from a current and an original price.
///
/// Returns `"{pct}{suffix}"` with the percentage rounded half away from zero.
/// When either value is not a finite number, the original is not positive, or the
/// current price is not below the original, the policy's no-discount sentinel
/// is returned instead.
#[must_use]
pub fn calculate_discount(current: &str, original: &str, policy: &DiscountPolicy) -> String {
    let (Some(current), Some(original)) = (parse_amount(current), parse_amount(original)) else {
        return no_discount(policy);
    };
    if original <= 0.0 || current >= original {
        return no_discount(policy);
    }
    let pct = ((original - current) / original * 100.0).round();
    format!("{pct:.0}{}", policy.suffix)
}

/// Chooses between a discount label scraped from the card and one derived
/// from the prices.
#[must_use]
pub fn resolve_discount(
    source_label: Option<&str>,
    current: &str,
    original: &str,
    policy: &DiscountPolicy,
) -> String {
    if policy.prefer_source_label {
        if let Some(label) = source_label.map(str::trim).filter(|l| !l.is_empty()) {
            return label.to_string();
        }
    }
    calculate_discount(current, original, policy)
}

/// The sentinel label used when a product carries no markdown.
#[must_use]
pub fn no_discount(policy: &DiscountPolicy) -> String {
    match policy.no_discount {
        NoDiscount::Na => SENTINEL.to_string(),
        NoDiscount::ZeroPercent => format!("0{}", policy.suffix),
    }
}

/// Cleans the original price, or substitutes for it when the card has none.
#[must_use]
pub fn resolve_original(raw: Option<&str>, cleaned_current: &str, policy: MissingOriginal) -> String {
    match raw.map(clean_price) {
        Some(original) if original != SENTINEL => original,
        _ => match policy {
            MissingOriginal::UseCurrent => cleaned_current.to_string(),
            MissingOriginal::Sentinel => SENTINEL.to_string(),
        },
    }
}

/// Accepts a unit label only when it contains a lexicon token.
///
/// An empty lexicon accepts any non-empty text. Matching is
/// case-insensitive; rejected or absent text yields the policy default.
#[must_use]
pub fn accept_unit(text: Option<&str>, policy: &UnitPolicy) -> String {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return policy.default.clone();
    };
    let lowered = text.to_lowercase();
    let accepted = policy.lexicon.is_empty()
        || policy
            .lexicon
            .iter()
            .any(|token| lowered.contains(&token.to_lowercase()));
    if accepted {
        text.to_string()
    } else {
        policy.default.clone()
    }
}

/// Case-insensitive brand prefix match used for free-text search listings.
#[must_use]
pub fn matches_brand(name: &str, token: &str) -> bool {
    name.trim_start()
        .to_lowercase()
        .starts_with(&token.trim().to_lowercase())
}

fn parse_amount(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
