//! Epicentr K catalog cards.
//!
//! Cards are `<li data-test-small-card="{id}">` with schema.org microdata for
//! the link and image. Prices are machine-readable `<data>` elements inside
//! `data-product-price-*` wrappers, so no text cleanup is needed. The card
//! never shows a rating or review count.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::{Site, SiteProfile};
use crate::config::Config;
use crate::markup::{attr, attr_or_text, first_word, select_first, text_of};
use crate::models::{Availability, RecordDraft, SkipReason};
use crate::pricing::{is_decimal_text, whole_units};
use crate::url_utils::resolve_link;

const BRAND_LABEL: &str = "Бренд";
const OUT_OF_STOCK_PHRASE: &str = "Немає в наявності";

lazy_static! {
    static ref CARD: Selector = Selector::parse("li[data-test-small-card]").expect("valid selector");
    static ref LINK: Selector = Selector::parse(r#"a[itemprop="url"]"#).expect("valid selector");
    static ref IMAGE: Selector = Selector::parse(r#"img[itemprop="image"]"#).expect("valid selector");
    static ref MAIN_PRICE: Selector =
        Selector::parse("div[data-product-price-main] data[value]").expect("valid selector");
    static ref OLD_PRICE: Selector =
        Selector::parse("s[data-product-price-old] data[content]").expect("valid selector");
    static ref PRICE_BADGE: Selector =
        Selector::parse("small[data-product-price-badge] data[value]").expect("valid selector");
    static ref TERM: Selector = Selector::parse("dt").expect("valid selector");
    static ref SPAN: Selector = Selector::parse("span").expect("valid selector");
    static ref STICKER: Selector = Selector::parse("div[data-sticker-title]").expect("valid selector");
}

#[derive(Debug, Clone)]
pub struct EpicentrkProfile {
    base_url: String,
}

impl EpicentrkProfile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for EpicentrkProfile {
    fn default() -> Self {
        Self::new(Config::EPICENTRK_BASE_URL)
    }
}

/// `<dd>` that follows the `<dt>Бренд</dt>` term of the card's characteristics list.
fn brand_from_spec_list(card: ElementRef<'_>) -> Option<String> {
    let term = card
        .select(&TERM)
        .find(|dt| text_of(*dt) == BRAND_LABEL)?;
    term.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")
        .map(text_of)
        .filter(|brand| !brand.is_empty())
}

impl SiteProfile for EpicentrkProfile {
    fn site(&self) -> Site {
        Site::Epicentrk
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn find_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document
            .select(&CARD)
            .filter(|li| {
                attr(*li, "data-test-small-card")
                    .map(|id| id.chars().any(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn parse_card(&self, card: ElementRef<'_>) -> Result<RecordDraft, SkipReason> {
        let link = select_first(card, &LINK).ok_or(SkipReason::MissingElement("product link"))?;
        let url = attr(link, "href")
            .map(|href| resolve_link(href, &self.base_url))
            .unwrap_or_default();
        let title = attr_or_text(link, "title").ok_or(SkipReason::MissingTitle)?;

        let image = select_first(card, &IMAGE)
            .and_then(|img| attr(img, "src").or_else(|| attr(img, "data-src")))
            .unwrap_or_default()
            .to_string();

        let price = select_first(card, &MAIN_PRICE)
            .and_then(|data| attr(data, "value"))
            .and_then(whole_units);
        let old_price = select_first(card, &OLD_PRICE)
            .and_then(|data| attr(data, "content"))
            .and_then(whole_units);

        // The badge holds both the amount and a currency code in separate <data> tags.
        let discount_amount = card
            .select(&PRICE_BADGE)
            .filter_map(|data| attr(data, "value"))
            .find(|value| is_decimal_text(value))
            .and_then(whole_units);

        let brand = brand_from_spec_list(card).unwrap_or_else(|| first_word(&title));

        let out_of_stock = card
            .select(&SPAN)
            .any(|span| text_of(span).contains(OUT_OF_STOCK_PHRASE));
        let availability = if out_of_stock {
            Availability::OutOfStock
        } else {
            Availability::InStock
        };

        let badges = select_first(card, &STICKER)
            .and_then(|sticker| attr(sticker, "data-sticker-title"))
            .map(|label| vec![label.to_string()])
            .unwrap_or_default();

        Ok(RecordDraft {
            title: Some(title),
            url,
            image,
            price,
            old_price,
            discount_amount,
            discount_percent: None,
            rating: None,
            reviews_count: None,
            availability,
            badges,
            brand,
        })
    }

    fn page_url(&self, category_url: &str, page: u32) -> String {
        if page <= 1 {
            return category_url.to_string();
        }
        let separator = if category_url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", category_url, separator, page)
    }
}
