// Global configuration constants - single source of truth

pub struct Config;

impl Config {
    // Site base URLs
    pub const MAUDAU_BASE_URL: &'static str = "https://maudau.com.ua";
    pub const EPICENTRK_BASE_URL: &'static str = "https://epicentrk.ua";
    pub const ROZETKA_BASE_URL: &'static str = "https://rozetka.com.ua";

    // Extraction
    pub const STRUCTURED_THRESHOLD: usize = 5;
    pub const MINOR_UNITS_PER_MAJOR: u64 = 100;

    // HTTP/Network config
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;
    pub const MAX_CONTENT_SIZE: usize = 10 * 1024 * 1024; // 10MB
    pub const MAX_RETRIES: u32 = 2;
    pub const RETRY_BACKOFF_MS: u64 = 500;
    pub const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    // Pause between consecutive page fetches
    pub const DELAY_MIN_MS: u64 = 15_000;
    pub const DELAY_MAX_MS: u64 = 25_000;

    // Output
    pub const SAMPLE_SIZE: usize = 5;
    pub const LOG_DIR: &'static str = "logs";
}

/// Runtime knobs for page extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Structured-path yield at which the markup path is not consulted
    pub structured_threshold: usize,
    /// Minor units per whole currency unit in embedded prices
    pub minor_units_per_major: u64,
    /// Fill an empty structured-path brand from the first word of the title
    pub structured_brand_from_title: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            structured_threshold: Config::STRUCTURED_THRESHOLD,
            minor_units_per_major: Config::MINOR_UNITS_PER_MAJOR,
            structured_brand_from_title: false,
        }
    }
}
