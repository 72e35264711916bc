pub mod cli;
pub mod config;
pub mod dedup;
pub mod export;
pub mod json_utils;
pub mod logging;
pub mod markup;
pub mod models;
pub mod network;
pub mod parsing_modules;
pub mod pipeline;
pub mod pricing;
pub mod reconcile;
pub mod site_profiles;
pub mod source;
pub mod url_utils;

// Re-export main types for library usage
pub use config::{Config, ExtractOptions};
pub use dedup::dedup_by_url;
pub use export::{ExportError, OutputFormat};
pub use models::{Availability, ProductRecord, RecordDraft, SkipReason, SkipTally};
pub use network::{FetchError, FetchResult, HttpClient};
pub use pipeline::{Batch, BatchLimits, BatchSummary, ProductCollection, StopReason, StopSignal};
pub use reconcile::{extract_page, ExtractionPath, PageError, PageExtractor, PageReport};
pub use site_profiles::{EpicentrkProfile, MaudauProfile, RozetkaProfile, Site, SiteProfile};
