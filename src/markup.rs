//! Markup-path extraction: product cards located in the rendered DOM.
//!
//! The driver here is site-agnostic. It asks the [`SiteProfile`] for the card
//! containers and for a draft per card, then applies the record invariants.
//! A card that fails is tallied and skipped; the rest of the page is still
//! scanned.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{ProductRecord, RecordDraft, SkipTally};
use crate::site_profiles::SiteProfile;

/// Records recovered from one page's markup.
#[derive(Debug, Clone, Default)]
pub struct MarkupScan {
    pub records: Vec<ProductRecord>,
    /// Card containers found on the page
    pub cards: usize,
    pub skipped: SkipTally,
}

/// Run the markup path over an already parsed document.
pub fn scan(document: &Html, profile: &dyn SiteProfile) -> MarkupScan {
    let cards = profile.find_cards(document);
    let mut result = MarkupScan {
        cards: cards.len(),
        ..Default::default()
    };

    for (index, card) in cards.into_iter().enumerate() {
        match profile.parse_card(card).and_then(RecordDraft::finish) {
            Ok(record) => result.records.push(record),
            Err(reason) => {
                debug!(site = %profile.site(), card = index, reason = %reason, "skipping product card");
                result.skipped.record(&reason);
            }
        }
    }

    debug!(
        site = %profile.site(),
        cards = result.cards,
        records = result.records.len(),
        skipped = result.skipped.total(),
        "markup scan finished"
    );
    result
}

/// Parse `html` and run the markup path.
pub fn scan_html(html: &str, profile: &dyn SiteProfile) -> MarkupScan {
    let document = Html::parse_document(html);
    scan(&document, profile)
}

/// Element text with runs of whitespace collapsed and the ends trimmed.
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First descendant matching `selector`.
pub fn select_first<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

/// Attribute value, trimmed; empty values count as absent.
pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Prefer an attribute, fall back to the element text.
pub fn attr_or_text(element: ElementRef<'_>, name: &str) -> Option<String> {
    attr(element, name)
        .map(str::to_string)
        .or_else(|| Some(text_of(element)))
        .filter(|s| !s.is_empty())
}

/// First whitespace-separated word of a title, used as a brand fallback.
pub fn first_word(title: &str) -> String {
    title.split_whitespace().next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_div(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    #[test]
    fn test_text_of_collapses_whitespace() {
        let doc = first_div("<div> Гель\n  для <b>прання</b>  </div>");
        let sel = Selector::parse("div").unwrap();
        let div = doc.select(&sel).next().unwrap();
        assert_eq!(text_of(div), "Гель для прання");
    }

    #[test]
    fn test_attr_or_text_prefers_attribute() {
        let doc = first_div(r#"<span title="Повна назва">Коротка</span><i title=" ">Текст</i>"#);
        let span = doc.select(&Selector::parse("span").unwrap()).next().unwrap();
        let i = doc.select(&Selector::parse("i").unwrap()).next().unwrap();
        assert_eq!(attr_or_text(span, "title"), Some("Повна назва".to_string()));
        assert_eq!(attr_or_text(i, "title"), Some("Текст".to_string()));
    }

    #[test]
    fn test_first_word() {
        assert_eq!(first_word("Ariel Гель для прання 1.95 л"), "Ariel");
        assert_eq!(first_word("   "), "");
    }
}
