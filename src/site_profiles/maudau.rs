//! Maudau catalog cards.
//!
//! Every field on a Maudau card carries a `data-testid`, which survives the
//! frequent class-name churn of their build:
//!
//! ```html
//! <div data-testid="productItem">
//!   <a href="/product/ariel-gel"><img data-testid="productImage" src="..."></a>
//!   <span data-testid="productName" title="Ariel гель 1.95 л">Ariel гель…</span>
//!   <p data-testid="productFullPrice">399 ₴</p>
//!   <p data-testid="finalPrice">319 ₴</p>
//!   <span data-testid="productDiscount">-20%</span>
//!   <svg data-testid="reviewStar"/>…
//!   <a href="/product/ariel-gel#reviews"><p>12 відгуків</p></a>
//! </div>
//! ```

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::{Site, SiteProfile};
use crate::config::Config;
use crate::markup::{attr, attr_or_text, first_word, select_first, text_of};
use crate::models::{Availability, RecordDraft, SkipReason};
use crate::pricing::{digits_only, first_digit_run};
use crate::url_utils::resolve_link;

lazy_static! {
    static ref CARD: Selector = Selector::parse(r#"div[data-testid="productItem"]"#).expect("valid selector");
    static ref NAME: Selector = Selector::parse(r#"span[data-testid="productName"]"#).expect("valid selector");
    static ref LINK: Selector = Selector::parse("a[href]").expect("valid selector");
    static ref IMAGE: Selector = Selector::parse(r#"img[data-testid="productImage"]"#).expect("valid selector");
    static ref FINAL_PRICE: Selector = Selector::parse(r#"p[data-testid="finalPrice"]"#).expect("valid selector");
    static ref FULL_PRICE: Selector = Selector::parse(r#"p[data-testid="productFullPrice"]"#).expect("valid selector");
    static ref DISCOUNT: Selector = Selector::parse(r#"span[data-testid="productDiscount"]"#).expect("valid selector");
    static ref STAR: Selector = Selector::parse(r#"svg[data-testid="reviewStar"]"#).expect("valid selector");
    static ref REVIEWS: Selector = Selector::parse(r##"a[href*="#reviews"] p"##).expect("valid selector");
}

#[derive(Debug, Clone)]
pub struct MaudauProfile {
    base_url: String,
}

impl MaudauProfile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for MaudauProfile {
    fn default() -> Self {
        Self::new(Config::MAUDAU_BASE_URL)
    }
}

impl SiteProfile for MaudauProfile {
    fn site(&self) -> Site {
        Site::Maudau
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn find_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&CARD).collect()
    }

    fn parse_card(&self, card: ElementRef<'_>) -> Result<RecordDraft, SkipReason> {
        let title = select_first(card, &NAME).and_then(|name| attr_or_text(name, "title"));

        let url = select_first(card, &LINK)
            .and_then(|link| attr(link, "href"))
            .map(|href| resolve_link(href, &self.base_url))
            .unwrap_or_default();

        let image = select_first(card, &IMAGE)
            .and_then(|img| attr(img, "src"))
            .unwrap_or_default()
            .to_string();

        let price = select_first(card, &FINAL_PRICE).and_then(|p| digits_only(&text_of(p)));
        let old_price = select_first(card, &FULL_PRICE).and_then(|p| digits_only(&text_of(p)));
        let discount_percent = select_first(card, &DISCOUNT)
            .and_then(|d| digits_only(&text_of(d)))
            .and_then(|pct| u8::try_from(pct).ok());

        let stars = card.select(&STAR).count();
        let rating = (stars > 0).then_some(stars as f64);

        let reviews_count = select_first(card, &REVIEWS)
            .and_then(|p| first_digit_run(&text_of(p)))
            .and_then(|n| u32::try_from(n).ok());

        let brand = title.as_deref().map(first_word).unwrap_or_default();

        Ok(RecordDraft {
            title,
            url,
            image,
            price,
            old_price,
            discount_amount: None,
            discount_percent,
            rating,
            reviews_count,
            availability: Availability::InStock,
            badges: Vec::new(),
            brand,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::scan_html;

    const CARD_HTML: &str = r##"
        <div data-testid="productItem">
          <a href="/product/ariel-gel-1-95-l"><img data-testid="productImage" src="https://cdn.maudau.com.ua/ariel.jpg"></a>
          <span data-testid="productName" title="Ariel Гель для прання Color 1.95 л">Ariel Гель для…</span>
          <p data-testid="productFullPrice">399 ₴</p>
          <p data-testid="finalPrice">319 ₴</p>
          <span data-testid="productDiscount">-20%</span>
          <svg data-testid="reviewStar"></svg><svg data-testid="reviewStar"></svg>
          <svg data-testid="reviewStar"></svg><svg data-testid="reviewStar"></svg>
          <a href="/product/ariel-gel-1-95-l#reviews"><p>12 відгуків</p></a>
        </div>
    "##;

    #[test]
    fn test_parse_full_card() {
        let profile = MaudauProfile::default();
        let scan = scan_html(CARD_HTML, &profile);
        assert_eq!(scan.records.len(), 1);

        let record = &scan.records[0];
        assert_eq!(record.title, "Ariel Гель для прання Color 1.95 л");
        assert_eq!(record.url, "https://maudau.com.ua/product/ariel-gel-1-95-l");
        assert_eq!(record.image, "https://cdn.maudau.com.ua/ariel.jpg");
        assert_eq!(record.price, 319);
        assert_eq!(record.old_price, Some(399));
        assert_eq!(record.discount_amount, Some(80));
        assert_eq!(record.discount_percent, Some(20));
        assert_eq!(record.rating, Some(4.0));
        assert_eq!(record.reviews_count, Some(12));
        assert_eq!(record.availability, Availability::InStock);
        assert_eq!(record.brand, "Ariel");
    }

    #[test]
    fn test_name_text_used_without_title_attribute() {
        let html = r#"<div data-testid="productItem">
            <span data-testid="productName">Persil капсули</span>
            <p data-testid="finalPrice">1 249 ₴</p>
        </div>"#;
        let scan = scan_html(html, &MaudauProfile::default());
        assert_eq!(scan.records[0].title, "Persil капсули");
        assert_eq!(scan.records[0].price, 1249);
        assert_eq!(scan.records[0].old_price, None);
        assert_eq!(scan.records[0].rating, None);
        assert_eq!(scan.records[0].url, "");
    }

    #[test]
    fn test_card_without_price_is_skipped() {
        let html = r#"
            <div data-testid="productItem"><span data-testid="productName">Без ціни</span></div>
            <div data-testid="productItem"><span data-testid="productName">З ціною</span><p data-testid="finalPrice">10 ₴</p></div>
        "#;
        let scan = scan_html(html, &MaudauProfile::default());
        assert_eq!(scan.cards, 2);
        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.records[0].title, "З ціною");
        assert_eq!(scan.skipped.get("missing_price"), 1);
    }
}
