//! Per-site extraction profiles.
//!
//! Each retailer renders its catalog differently, but the extraction steps
//! are the same. A profile supplies only what differs:
//!
//! - the base URL links are resolved against
//! - how product card containers are located
//! - how one card maps to a [`RecordDraft`]
//! - how product slugs and catalog page numbers become URLs
//!
//! # Sites
//!
//! - **Maudau**: `data-testid` attributes on every field, plus embedded
//!   product state in the page source
//! - **Epicentr K**: `itemprop` microdata and `data-product-price-*` markers
//! - **Rozetka**: Angular components (`rz-*` tags) with structural classes

pub mod epicentrk;
pub mod maudau;
pub mod rozetka;

use scraper::{ElementRef, Html};

use crate::config::Config;
use crate::models::{RecordDraft, SkipReason};

pub use epicentrk::EpicentrkProfile;
pub use maudau::MaudauProfile;
pub use rozetka::RozetkaProfile;

/// Extraction rules for one retailer.
pub trait SiteProfile: Send + Sync {
    fn site(&self) -> Site;

    fn base_url(&self) -> &str;

    /// Product card containers, in document order.
    fn find_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;

    /// Map one card to a draft. Errors skip only this card.
    fn parse_card(&self, card: ElementRef<'_>) -> Result<RecordDraft, SkipReason>;

    /// Product page URL for an embedded-data slug.
    fn product_url(&self, slug: &str) -> String {
        let slug = slug.trim().trim_start_matches('/');
        if slug.is_empty() {
            return String::new();
        }
        format!("{}/product/{}", self.base_url().trim_end_matches('/'), slug)
    }

    /// URL of catalog page `page` (1-based) for a category URL.
    fn page_url(&self, category_url: &str, page: u32) -> String {
        if page <= 1 {
            return category_url.to_string();
        }
        let base = if category_url.ends_with('/') {
            category_url.to_string()
        } else {
            format!("{}/", category_url)
        };
        format!("{}page={}/", base, page)
    }
}

/// Supported retailers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Site {
    Maudau,
    Epicentrk,
    Rozetka,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Maudau => "maudau",
            Site::Epicentrk => "epicentrk",
            Site::Rozetka => "rozetka",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Site::Maudau => Config::MAUDAU_BASE_URL,
            Site::Epicentrk => Config::EPICENTRK_BASE_URL,
            Site::Rozetka => Config::ROZETKA_BASE_URL,
        }
    }

    /// Profile with the site's default base URL.
    pub fn profile(&self) -> Box<dyn SiteProfile> {
        match self {
            Site::Maudau => Box::new(MaudauProfile::default()),
            Site::Epicentrk => Box::new(EpicentrkProfile::default()),
            Site::Rozetka => Box::new(RozetkaProfile::default()),
        }
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
