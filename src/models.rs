use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pricing::{derive_discount_amount, derive_discount_percent};

/// Column order shared by every serializer.
pub const FIELD_ORDER: [&str; 12] = [
    "title",
    "url",
    "image",
    "price",
    "old_price",
    "discount_amount",
    "rating",
    "reviews_count",
    "availability",
    "badges",
    "brand",
    "discount_percent",
];

/// Stock status of a listing, as shown on the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "В наявності")]
    InStock,
    #[serde(rename = "Немає в наявності")]
    OutOfStock,
    /// Listed as available but with zero stock (backorder).
    #[serde(rename = "Очікується")]
    Expected,
    #[default]
    #[serde(rename = "Невідомо")]
    Unknown,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "В наявності",
            Availability::OutOfStock => "Немає в наявності",
            Availability::Expected => "Очікується",
            Availability::Unknown => "Невідомо",
        }
    }

    /// Classify a free-text stock label such as Rozetka's sell-status tile.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.is_empty() {
            Availability::Unknown
        } else if lower.contains("немає") || lower.contains("закінчився") || lower.contains("не в наявності") {
            Availability::OutOfStock
        } else if lower.contains("очікується") || lower.contains("під замовлення") {
            Availability::Expected
        } else if lower.contains("наявності")
            || lower.contains("готовий до відправлення")
            || lower.contains("закінчується")
        {
            Availability::InStock
        } else {
            Availability::Unknown
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One product listing recovered from a catalog page.
///
/// Only built through [`RecordDraft::finish`], which enforces:
/// - `title` is non-empty and `price` is positive
/// - `old_price`, when present, is strictly greater than `price`
/// - derived discount fields are consistent with the two prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub url: String,
    pub image: String,
    /// Whole currency units
    pub price: u64,
    pub old_price: Option<u64>,
    pub discount_amount: Option<u64>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub availability: Availability,
    pub badges: Vec<String>,
    pub brand: String,
    pub discount_percent: Option<u8>,
}

impl ProductRecord {
    pub fn has_discount(&self) -> bool {
        self.old_price.is_some() || self.discount_amount.is_some()
    }

    pub fn badges_joined(&self) -> String {
        self.badges.join(", ")
    }
}

/// Loosely-typed record under construction.
///
/// Extractors fill in whatever the source offers; `finish` validates and
/// derives the rest.
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub title: Option<String>,
    pub url: String,
    pub image: String,
    pub price: Option<u64>,
    pub old_price: Option<u64>,
    pub discount_amount: Option<u64>,
    pub discount_percent: Option<u8>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub availability: Availability,
    pub badges: Vec<String>,
    pub brand: String,
}

impl RecordDraft {
    pub fn finish(self) -> Result<ProductRecord, SkipReason> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SkipReason::MissingTitle)?;
        let price = self
            .price
            .filter(|p| *p > 0)
            .ok_or(SkipReason::MissingPrice)?;

        let old_price = self.old_price.filter(|old| *old > price);

        let discount_amount = self
            .discount_amount
            .filter(|amount| *amount > 0)
            .or_else(|| old_price.and_then(|old| derive_discount_amount(price, old)));
        let discount_percent = self
            .discount_percent
            .filter(|pct| *pct <= 100)
            .or_else(|| old_price.and_then(|old| derive_discount_percent(price, old)));

        let badges = self
            .badges
            .into_iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();

        Ok(ProductRecord {
            title,
            url: self.url,
            image: self.image,
            price,
            old_price,
            discount_amount,
            rating: self.rating.filter(|r| r.is_finite()),
            reviews_count: self.reviews_count,
            availability: self.availability,
            badges,
            brand: self.brand.trim().to_string(),
            discount_percent,
        })
    }
}

/// Why a single candidate (structured object or markup card) was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("missing title")]
    MissingTitle,

    #[error("missing or zero price")]
    MissingPrice,

    #[error("missing element: {0}")]
    MissingElement(&'static str),

    #[error("candidate is not a JSON object")]
    NotAnObject,

    #[error("malformed field {field}: {detail}")]
    Malformed { field: &'static str, detail: String },
}

impl SkipReason {
    /// Stable short key used for tallies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::MissingTitle => "missing_title",
            SkipReason::MissingPrice => "missing_price",
            SkipReason::MissingElement(_) => "missing_element",
            SkipReason::NotAnObject => "not_an_object",
            SkipReason::Malformed { .. } => "malformed",
        }
    }
}

/// Count of skipped candidates per [`SkipReason::kind`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipTally {
    counts: BTreeMap<&'static str, usize>,
}

impl SkipTally {
    pub fn record(&mut self, reason: &SkipReason) {
        *self.counts.entry(reason.kind()).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &SkipTally) {
        for (kind, count) in &other.counts {
            *self.counts.entry(*kind).or_insert(0) += *count;
        }
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn get(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}

impl std::fmt::Display for SkipTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(" "))
    }
}
