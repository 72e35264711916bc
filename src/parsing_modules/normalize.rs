//! Embedded product objects → [`ProductRecord`].
//!
//! The hydration state uses the storefront's internal shape:
//!
//! ```json
//! {
//!   "title": "Ariel гель 1.95 л",
//!   "slug": "ariel-gel-1-95-l",
//!   "main_photo_sized_urls": {"lg": "...", "md": "..."},
//!   "offer": {"price": 31900, "old_price": 39900, "discount_amount": 8000,
//!             "discount_percentage": 20, "available": true, "stock": 14},
//!   "rating": 4.8, "reviews_count": 12,
//!   "badges": ["Хіт"], "brand": {"name": "Ariel", "slug": "ariel"}
//! }
//! ```
//!
//! Money is in minor units. Zero counts as "not set" for every numeric field.

use serde_json::Value;
use tracing::debug;

use crate::config::ExtractOptions;
use crate::json_utils::{as_f64_loose, as_i64_loose, as_u64_loose, is_truthy, scalar_to_string, str_field};
use crate::markup::first_word;
use crate::models::{Availability, ProductRecord, RecordDraft, SkipReason, SkipTally};
use crate::pricing::minor_to_major;
use crate::site_profiles::SiteProfile;

const IMAGE_SIZES: [&str; 3] = ["lg", "md", "xl"];
const BADGE_LABEL_KEYS: [&str; 3] = ["title", "name", "label"];

static NO_OFFER: Value = Value::Null;

/// Records built from a page's embedded objects.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<ProductRecord>,
    pub skipped: SkipTally,
}

/// Normalize every object, skipping (and tallying) the ones that fail.
pub fn normalize_all(objects: &[Value], profile: &dyn SiteProfile, options: &ExtractOptions) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (index, object) in objects.iter().enumerate() {
        match normalize_product(object, profile, options) {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                debug!(site = %profile.site(), object = index, reason = %reason, "skipping embedded product");
                batch.skipped.record(&reason);
            }
        }
    }
    batch
}

/// Map one embedded object to a record.
pub fn normalize_product(
    object: &Value,
    profile: &dyn SiteProfile,
    options: &ExtractOptions,
) -> Result<ProductRecord, SkipReason> {
    if !object.is_object() {
        return Err(SkipReason::NotAnObject);
    }
    let factor = options.minor_units_per_major;

    let title = match object.get("title") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(SkipReason::Malformed {
                field: "title",
                detail: format!("expected string, got {}", other),
            })
        }
    };

    let url = str_field(object, "slug")
        .map(|slug| profile.product_url(slug))
        .unwrap_or_default();

    let image = object
        .get("main_photo_sized_urls")
        .and_then(|sizes| IMAGE_SIZES.iter().find_map(|size| str_field(sizes, size)))
        .unwrap_or_default()
        .to_string();

    let offer = match object.get("offer") {
        None | Some(Value::Null) => &NO_OFFER,
        Some(offer @ Value::Object(_)) => offer,
        Some(_) => {
            return Err(SkipReason::Malformed {
                field: "offer",
                detail: "expected object".to_string(),
            })
        }
    };

    let price_minor = minor_amount(offer, "price")?;
    let old_minor = minor_amount(offer, "old_price")?;
    let discount_minor = minor_amount(offer, "discount_amount")?;

    let price = price_minor.map(|minor| minor_to_major(minor, factor));
    let discount_amount = discount_minor.map(|minor| minor_to_major(minor, factor));
    let old_price = match (price_minor, old_minor, discount_minor) {
        (Some(price), Some(old), _) if old > price => Some(minor_to_major(old, factor)),
        (Some(price), _, Some(discount)) => Some(minor_to_major(price.saturating_add(discount), factor)),
        _ => None,
    };

    let discount_percent = truthy_field(offer, "discount_percentage")
        .and_then(as_u64_loose)
        .and_then(|pct| u8::try_from(pct).ok());
    let rating = truthy_field(object, "rating").and_then(as_f64_loose);
    let reviews_count = truthy_field(object, "reviews_count")
        .and_then(as_u64_loose)
        .and_then(|n| u32::try_from(n).ok());

    let availability = availability_of(offer);
    let badges = object.get("badges").map(badge_labels).unwrap_or_default();

    let mut brand = object.get("brand").map(brand_of).unwrap_or_default();
    if brand.is_empty() && options.structured_brand_from_title {
        brand = title.as_deref().map(first_word).unwrap_or_default();
    }

    RecordDraft {
        title,
        url,
        image,
        price,
        old_price,
        discount_amount,
        discount_percent,
        rating,
        reviews_count,
        availability,
        badges,
        brand,
    }
    .finish()
}

fn truthy_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| is_truthy(v))
}

/// Positive minor-unit amount; absent or zero is `None`, non-numeric is an error.
fn minor_amount(offer: &Value, key: &'static str) -> Result<Option<u64>, SkipReason> {
    let Some(raw) = truthy_field(offer, key) else {
        return Ok(None);
    };
    match raw {
        Value::Number(_) | Value::String(_) => {}
        other => {
            return Err(SkipReason::Malformed {
                field: key,
                detail: format!("expected number, got {}", other),
            })
        }
    }
    match as_i64_loose(raw) {
        Some(n) if n <= 0 => Ok(None),
        Some(_) => Ok(as_u64_loose(raw)),
        None => {
            debug!(field = key, value = %raw, "unparseable amount treated as absent");
            Ok(None)
        }
    }
}

fn availability_of(offer: &Value) -> Availability {
    let available = offer.get("available").map(is_truthy).unwrap_or(false);
    if !available {
        return Availability::OutOfStock;
    }
    let stock = offer.get("stock").and_then(as_i64_loose).unwrap_or(0);
    match stock {
        s if s > 0 => Availability::InStock,
        0 => Availability::Expected,
        _ => Availability::OutOfStock,
    }
}

fn badge_labels(raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter(|item| is_truthy(item))
            .filter_map(|item| match item {
                Value::Object(_) => BADGE_LABEL_KEYS
                    .iter()
                    .find_map(|key| str_field(item, key))
                    .map(str::to_string),
                other => scalar_to_string(other),
            })
            .collect(),
        other if is_truthy(other) => scalar_to_string(other).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn brand_of(raw: &Value) -> String {
    match raw {
        Value::Object(_) => str_field(raw, "name")
            .or_else(|| str_field(raw, "slug"))
            .unwrap_or_default()
            .to_string(),
        other if is_truthy(other) => scalar_to_string(other).unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site_profiles::MaudauProfile;
    use serde_json::json;

    fn normalize(value: Value) -> Result<ProductRecord, SkipReason> {
        normalize_product(&value, &MaudauProfile::default(), &ExtractOptions::default())
    }

    #[test]
    fn test_full_object() {
        let record = normalize(json!({
            "title": "Ariel гель 1.95 л",
            "slug": "ariel-gel-1-95-l",
            "main_photo_sized_urls": {"lg": "", "md": "https://cdn.maudau.com.ua/md.jpg", "xl": "https://cdn.maudau.com.ua/xl.jpg"},
            "offer": {"price": 31950, "old_price": 39900, "discount_amount": 7950,
                      "discount_percentage": 20, "available": true, "stock": 14},
            "rating": 4.8,
            "reviews_count": 12,
            "badges": ["Хіт", "", null, {"title": "Акція"}],
            "brand": {"name": "Ariel", "slug": "ariel"}
        }))
        .unwrap();

        assert_eq!(record.title, "Ariel гель 1.95 л");
        assert_eq!(record.url, "https://maudau.com.ua/product/ariel-gel-1-95-l");
        assert_eq!(record.image, "https://cdn.maudau.com.ua/md.jpg");
        assert_eq!(record.price, 319);
        assert_eq!(record.old_price, Some(399));
        assert_eq!(record.discount_amount, Some(79));
        assert_eq!(record.discount_percent, Some(20));
        assert_eq!(record.rating, Some(4.8));
        assert_eq!(record.reviews_count, Some(12));
        assert_eq!(record.availability, Availability::InStock);
        assert_eq!(record.badges, vec!["Хіт", "Акція"]);
        assert_eq!(record.brand, "Ariel");
    }

    #[test]
    fn test_old_price_from_discount_amount() {
        let record = normalize(json!({
            "title": "Fairy 500 мл",
            "offer": {"price": 5990, "old_price": 0, "discount_amount": 1000}
        }))
        .unwrap();
        assert_eq!(record.price, 59);
        assert_eq!(record.old_price, Some(69));
        assert_eq!(record.discount_amount, Some(10));
        assert_eq!(record.discount_percent, Some(14));
        assert_eq!(record.url, "");
    }

    #[test]
    fn test_old_price_not_above_price_is_dropped() {
        let record = normalize(json!({
            "title": "Мило",
            "offer": {"price": 4500, "old_price": 4500}
        }))
        .unwrap();
        assert_eq!(record.old_price, None);
        assert_eq!(record.discount_amount, None);
        assert_eq!(record.discount_percent, None);
    }

    #[test]
    fn test_availability_rules() {
        let with = |offer: Value| normalize(json!({"title": "x", "offer": offer})).unwrap().availability;
        assert_eq!(with(json!({"price": 100, "available": true, "stock": 3})), Availability::InStock);
        assert_eq!(with(json!({"price": 100, "available": true, "stock": 0})), Availability::Expected);
        assert_eq!(with(json!({"price": 100, "available": true})), Availability::Expected);
        assert_eq!(with(json!({"price": 100, "available": true, "stock": -1})), Availability::OutOfStock);
        assert_eq!(with(json!({"price": 100, "available": false, "stock": 9})), Availability::OutOfStock);
    }

    #[test]
    fn test_missing_title_and_price() {
        assert_eq!(normalize(json!({"offer": {"price": 100}})), Err(SkipReason::MissingTitle));
        assert_eq!(normalize(json!({"title": "x", "offer": {"price": 0}})), Err(SkipReason::MissingPrice));
        // 99 kopecks floor to zero hryvnias
        assert_eq!(normalize(json!({"title": "x", "offer": {"price": 99}})), Err(SkipReason::MissingPrice));
    }

    #[test]
    fn test_malformed_fields() {
        assert_eq!(normalize(json!([1, 2])), Err(SkipReason::NotAnObject));
        assert!(matches!(
            normalize(json!({"title": "x", "offer": "soon"})),
            Err(SkipReason::Malformed { field: "offer", .. })
        ));
        assert!(matches!(
            normalize(json!({"title": "x", "offer": {"price": {"amount": 1}}})),
            Err(SkipReason::Malformed { field: "price", .. })
        ));
    }

    #[test]
    fn test_unparseable_amount_text_is_absent() {
        let record = normalize(json!({"title": "Мило", "offer": {"price": 10000, "old_price": "n/a"}})).unwrap();
        assert_eq!(record.price, 100);
        assert_eq!(record.old_price, None);

        let record = normalize(json!({"title": "Мило", "offer": {"price": 10000, "discount_amount": "—"}})).unwrap();
        assert_eq!(record.discount_amount, None);
        assert_eq!(record.old_price, None);

        assert!(normalize(json!({"title": "Мило", "offer": {"price": "ціна"}})).is_err());
    }

    #[test]
    fn test_numeric_strings_and_floats() {
        let record = normalize(json!({"title": "x", "offer": {"price": "12999", "old_price": 15000.7}})).unwrap();
        assert_eq!(record.price, 129);
        assert_eq!(record.old_price, Some(150));
    }

    #[test]
    fn test_brand_forms() {
        let brand = |b: Value| normalize(json!({"title": "Gala порошок", "offer": {"price": 100}, "brand": b})).unwrap().brand;
        assert_eq!(brand(json!({"slug": "gala"})), "gala");
        assert_eq!(brand(json!("Gala")), "Gala");
        assert_eq!(brand(json!(null)), "");
        assert_eq!(brand(json!({})), "");
    }

    #[test]
    fn test_brand_from_title_when_enabled() {
        let options = ExtractOptions {
            structured_brand_from_title: true,
            ..Default::default()
        };
        let object = json!({"title": "Gala порошок", "offer": {"price": 100}});
        let record = normalize_product(&object, &MaudauProfile::default(), &options).unwrap();
        assert_eq!(record.brand, "Gala");
    }

    #[test]
    fn test_scalar_badge_and_zero_rating() {
        let record = normalize(json!({"title": "x", "offer": {"price": 100}, "badges": "Новинка", "rating": 0, "reviews_count": 0})).unwrap();
        assert_eq!(record.badges, vec!["Новинка"]);
        assert_eq!(record.rating, None);
        assert_eq!(record.reviews_count, None);
    }

    #[test]
    fn test_normalize_all_tallies_skips() {
        let objects = vec![
            json!({"title": "a", "offer": {"price": 100}}),
            json!({"offer": {"price": 100}}),
            json!("oops"),
        ];
        let batch = normalize_all(&objects, &MaudauProfile::default(), &ExtractOptions::default());
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.skipped.get("missing_title"), 1);
        assert_eq!(batch.skipped.get("not_an_object"), 1);
    }
}
