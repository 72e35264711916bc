//! Numeric normalization for prices, discounts and ratings.
//!
//! Storefront markup renders numbers for humans: `1 299 ₴`, `1299.00`,
//! `width: calc(84% - 2px)`. Everything here turns that text into plain
//! integers (whole hryvnias) or a small float. Text that does not parse is
//! treated as absent and never reported as an error.

/// Strip every non-digit character and parse what is left.
///
/// `"1 299 ₴"` → `Some(1299)`, `"—"` → `None`.
pub fn digits_only(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// First run of consecutive ASCII digits in `text`.
///
/// `"(12 відгуків)"` → `Some(12)`.
pub fn first_digit_run(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Drop all whitespace (including NBSP used as a thousands separator), then
/// take the first digit run.
///
/// `"1\u{a0}299 ₴"` → `Some(1299)`.
pub fn compact_first_number(text: &str) -> Option<u64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    first_digit_run(&compact)
}

/// Parse a decimal amount such as `"1299.00"` and truncate it to whole units.
pub fn whole_units(text: &str) -> Option<u64> {
    let normalized = text.trim().replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.trunc() as u64)
}

/// Whether `text` looks like a plain decimal number (`"150"`, `"150.5"`).
pub fn is_decimal_text(text: &str) -> bool {
    let stripped: String = text.chars().filter(|c| *c != '.' && *c != ',').collect();
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

/// Convert an amount in minor units (kopecks) into whole display units.
pub fn minor_to_major(minor: u64, factor: u64) -> u64 {
    if factor == 0 {
        return minor;
    }
    minor / factor
}

/// Absolute savings; only positive values count.
pub fn derive_discount_amount(price: u64, old_price: u64) -> Option<u64> {
    old_price.checked_sub(price).filter(|diff| *diff > 0)
}

/// `round((old - price) / old * 100)`, only when `old > price`.
///
/// Integer arithmetic, halves round up.
pub fn derive_discount_percent(price: u64, old_price: u64) -> Option<u8> {
    if old_price <= price {
        return None;
    }
    let diff = (old_price - price) as u128;
    let old = old_price as u128;
    let percent = (diff * 100 + old / 2) / old;
    u8::try_from(percent.min(100)).ok()
}

/// Convert a 0–100 fill percentage of a star bar into a 0–5 rating with one
/// decimal place.
pub fn rating_from_percent(percent: f64) -> f64 {
    (percent / 20.0 * 10.0).round() / 10.0
}
