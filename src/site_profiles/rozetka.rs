//! Rozetka catalog cards.
//!
//! Rozetka renders with Angular, so cards are `rz-*` components around an
//! `<article>` tile. Older layouts only keep the component wrapper, hence the
//! fallback selector.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{Site, SiteProfile};
use crate::config::Config;
use crate::markup::{attr, first_word, select_first, text_of};
use crate::models::{Availability, RecordDraft, SkipReason};
use crate::pricing::{compact_first_number, first_digit_run, rating_from_percent};
use crate::url_utils::resolve_link;

lazy_static! {
    static ref CARD: Selector = Selector::parse(r#"article[class*="tile"]"#).expect("valid selector");
    static ref CARD_FALLBACK: Selector = Selector::parse("rz-product-tile article").expect("valid selector");
    static ref TITLE_LINK: Selector = Selector::parse("a.tile-title").expect("valid selector");
    static ref IMAGE: Selector = Selector::parse("img.tile-image").expect("valid selector");
    static ref PRICE: Selector = Selector::parse("div.price").expect("valid selector");
    static ref OLD_PRICE: Selector = Selector::parse("div.old-price").expect("valid selector");
    static ref STARS: Selector = Selector::parse("div.stars__rating").expect("valid selector");
    static ref REVIEWS: Selector = Selector::parse("span.rating-block-content").expect("valid selector");
    static ref SELL_STATUS: Selector = Selector::parse("rz-tile-sell-status").expect("valid selector");
    static ref PROMO_LABEL: Selector = Selector::parse("rz-promo-label").expect("valid selector");

    // Star fill width, e.g. `width: calc(90% - 2px)`
    static ref STAR_FILL: Regex = Regex::new(r"calc\((\d+(?:\.\d+)?)%").expect("valid regex");
}

#[derive(Debug, Clone)]
pub struct RozetkaProfile {
    base_url: String,
}

impl RozetkaProfile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for RozetkaProfile {
    fn default() -> Self {
        Self::new(Config::ROZETKA_BASE_URL)
    }
}

fn star_rating(style: &str) -> Option<f64> {
    let caps = STAR_FILL.captures(style)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(rating_from_percent(percent))
}

impl SiteProfile for RozetkaProfile {
    fn site(&self) -> Site {
        Site::Rozetka
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn find_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let cards: Vec<_> = document.select(&CARD).collect();
        if !cards.is_empty() {
            return cards;
        }
        document.select(&CARD_FALLBACK).collect()
    }

    fn parse_card(&self, card: ElementRef<'_>) -> Result<RecordDraft, SkipReason> {
        let link = select_first(card, &TITLE_LINK);
        let title = link.map(text_of).filter(|t| !t.is_empty());
        let url = link
            .and_then(|a| attr(a, "href"))
            .map(|href| resolve_link(href, &self.base_url))
            .unwrap_or_default();

        let image = select_first(card, &IMAGE)
            .and_then(|img| attr(img, "src"))
            .unwrap_or_default()
            .to_string();

        let price = select_first(card, &PRICE).and_then(|p| compact_first_number(&text_of(p)));
        let old_price = select_first(card, &OLD_PRICE).and_then(|p| compact_first_number(&text_of(p)));

        let rating = select_first(card, &STARS)
            .and_then(|stars| attr(stars, "style"))
            .and_then(star_rating);
        let reviews_count = select_first(card, &REVIEWS)
            .and_then(|span| first_digit_run(&text_of(span)))
            .and_then(|n| u32::try_from(n).ok());

        let availability = select_first(card, &SELL_STATUS)
            .map(|status| Availability::from_label(&text_of(status)))
            .unwrap_or(Availability::Unknown);

        let badges = card
            .select(&PROMO_LABEL)
            .map(text_of)
            .filter(|label| !label.is_empty())
            .collect();

        let brand = title.as_deref().map(first_word).unwrap_or_default();

        Ok(RecordDraft {
            title,
            url,
            image,
            price,
            old_price,
            discount_amount: None,
            discount_percent: None,
            rating,
            reviews_count,
            availability,
            badges,
            brand,
        })
    }
}
