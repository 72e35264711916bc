//! Per-page reconciliation of the structured and markup paths.
//!
//! The structured path runs first. A page that yields at least
//! `structured_threshold` records from it is done; otherwise the markup path
//! runs and wins only if it finds strictly more. The winning list is adopted
//! whole; the two are never merged.

use scraper::Html;
use tracing::{debug, info};

use crate::config::ExtractOptions;
use crate::markup;
use crate::models::{ProductRecord, SkipTally};
use crate::parsing_modules::{embedded_data, normalize};
use crate::site_profiles::SiteProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    Structured,
    Markup,
}

impl ExtractionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionPath::Structured => "structured",
            ExtractionPath::Markup => "markup",
        }
    }
}

impl std::fmt::Display for ExtractionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one page.
#[derive(Debug, Clone)]
pub struct PageReport {
    pub path: ExtractionPath,
    pub records: Vec<ProductRecord>,
    /// Records the structured path produced
    pub structured_count: usize,
    /// Records the markup path produced; `None` when it was not consulted
    pub markup_count: Option<usize>,
    /// Embedded fragments that failed to decode
    pub fragment_failures: usize,
    /// Skips from both paths that ran
    pub skipped: SkipTally,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("no products found (structured: {structured}, markup cards: {markup_cards})")]
    NoProducts { structured: usize, markup_cards: usize },
}

/// Extracts records from single pages of one site.
pub struct PageExtractor {
    profile: Box<dyn SiteProfile>,
    options: ExtractOptions,
}

impl PageExtractor {
    pub fn new(profile: Box<dyn SiteProfile>, options: ExtractOptions) -> Self {
        Self { profile, options }
    }

    pub fn profile(&self) -> &dyn SiteProfile {
        self.profile.as_ref()
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn extract(&self, html: &str) -> Result<PageReport, PageError> {
        extract_page(html, self.profile.as_ref(), &self.options)
    }
}

/// Run both paths as needed and pick the page's records.
pub fn extract_page(
    html: &str,
    profile: &dyn SiteProfile,
    options: &ExtractOptions,
) -> Result<PageReport, PageError> {
    let embedded = embedded_data::scan(html);
    let structured = normalize::normalize_all(&embedded.objects, profile, options);
    let structured_count = structured.records.len();

    let mut skipped = structured.skipped;

    if structured_count >= options.structured_threshold && structured_count > 0 {
        debug!(site = %profile.site(), records = structured_count, "structured path met threshold");
        return Ok(PageReport {
            path: ExtractionPath::Structured,
            records: structured.records,
            structured_count,
            markup_count: None,
            fragment_failures: embedded.fragment_failures,
            skipped,
        });
    }

    let document = Html::parse_document(html);
    let markup = markup::scan(&document, profile);
    let markup_count = markup.records.len();
    skipped.merge(&markup.skipped);

    let (path, records) = if markup_count > structured_count {
        (ExtractionPath::Markup, markup.records)
    } else {
        (ExtractionPath::Structured, structured.records)
    };

    if records.is_empty() {
        return Err(PageError::NoProducts {
            structured: structured_count,
            markup_cards: markup.cards,
        });
    }

    info!(
        site = %profile.site(),
        path = %path,
        structured = structured_count,
        markup = markup_count,
        "reconciled page"
    );

    Ok(PageReport {
        path,
        records,
        structured_count,
        markup_count: Some(markup_count),
        fragment_failures: embedded.fragment_failures,
        skipped,
    })
}
