use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, ExtractOptions};
use crate::export::OutputFormat;
use crate::pipeline::BatchLimits;
use crate::site_profiles::Site;

/// Extract product listings from saved or live catalog pages.
/// Exit codes: 0=success, 2=invalid arguments, 3=I/O or export error, 4=no products found
#[derive(Parser, Debug)]
#[command(name = "catalog_extract")]
#[command(about = "Extract product records from Ukrainian retail catalog pages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract from catalog pages saved as .html files.
    Files {
        #[arg(short, long, help = "Directory containing saved .html pages")]
        input_dir: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download catalog pages over HTTP and extract them.
    Fetch {
        #[arg(short, long, help = "Category URL (page 1 of the listing)")]
        category_url: String,

        #[arg(long, default_value_t = 1, help = "First catalog page to fetch")]
        start_page: u32,

        #[arg(long, default_value_t = 1, help = "Last catalog page to fetch (inclusive)")]
        end_page: u32,

        #[arg(
            long,
            default_value_t = Config::DELAY_MIN_MS,
            help = "Minimum pause between page fetches in milliseconds"
        )]
        delay_min_ms: u64,

        #[arg(
            long,
            default_value_t = Config::DELAY_MAX_MS,
            help = "Maximum pause between page fetches in milliseconds"
        )]
        delay_max_ms: u64,

        #[arg(
            short,
            long,
            default_value_t = Config::REQUEST_TIMEOUT_SECS,
            help = "Request timeout in seconds"
        )]
        timeout: u64,

        #[arg(
            short,
            long,
            default_value = Config::USER_AGENT,
            help = "User agent string for requests"
        )]
        user_agent: String,

        #[arg(long, help = "Save each fetched page as page_NNN.html in this directory")]
        save_html: Option<PathBuf>,

        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Which site, and how pages are extracted.
#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(short, long, value_enum, help = "Retailer the pages come from")]
    pub site: Site,

    #[arg(
        long,
        default_value_t = Config::STRUCTURED_THRESHOLD,
        help = "Embedded-data records at which markup is not consulted"
    )]
    pub structured_threshold: usize,

    #[arg(long, help = "Fill a missing embedded-data brand from the title's first word")]
    pub brand_from_title: bool,

    #[arg(long, help = "Stop after this many pages")]
    pub max_pages: Option<usize>,

    #[arg(long, help = "Stop starting new pages after this many seconds")]
    pub time_budget_secs: Option<u64>,
}

impl ExtractArgs {
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            structured_threshold: self.structured_threshold,
            structured_brand_from_title: self.brand_from_title,
            ..Default::default()
        }
    }

    pub fn limits(&self) -> BatchLimits {
        BatchLimits {
            max_pages: self.max_pages,
            time_budget: self.time_budget_secs.map(Duration::from_secs),
        }
    }
}

/// Where and how results are written.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(short, long, help = "Output file (default: <site>_products.<format>)")]
    pub output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv, help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, help = "Drop records whose URL was already seen")]
    pub dedup: bool,

    #[arg(long, help = "Omit the UTF-8 byte order mark from CSV output")]
    pub no_bom: bool,

    #[arg(
        long,
        default_value_t = Config::SAMPLE_SIZE,
        help = "Records to preview on the console (0 disables)"
    )]
    pub sample: usize,

    #[arg(long, default_value = Config::LOG_DIR, help = "Directory for log files")]
    pub log_dir: PathBuf,

    #[arg(long, help = "Also write JSON-formatted logs")]
    pub json_logs: bool,
}

impl OutputArgs {
    pub fn output_path(&self, site: Site) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}_products.{}", site, self.format.extension())))
    }
}

impl Commands {
    pub fn extract_args(&self) -> &ExtractArgs {
        match self {
            Commands::Files { extract, .. } | Commands::Fetch { extract, .. } => extract,
        }
    }

    pub fn output_args(&self) -> &OutputArgs {
        match self {
            Commands::Files { output, .. } | Commands::Fetch { output, .. } => output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_command_minimal() {
        let cli = Cli::try_parse_from([
            "catalog_extract",
            "files",
            "--site",
            "maudau",
            "--input-dir",
            "pages",
        ]);
        assert!(cli.is_ok());
        let cli = cli.unwrap();
        match &cli.command {
            Commands::Files { input_dir, extract, output } => {
                assert_eq!(input_dir, &PathBuf::from("pages"));
                assert_eq!(extract.site, Site::Maudau);
                assert_eq!(extract.structured_threshold, 5); // default
                assert_eq!(output.format, OutputFormat::Csv); // default
                assert!(!output.dedup);
                assert_eq!(output.output_path(extract.site), PathBuf::from("maudau_products.csv"));
            }
            _ => panic!("Expected Files command"),
        }
        let limits = cli.command.extract_args().limits();
        assert_eq!(limits.max_pages, None);
        assert_eq!(limits.time_budget, None);
    }

    #[test]
    fn test_files_command_with_options() {
        let cli = Cli::try_parse_from([
            "catalog_extract",
            "files",
            "--site",
            "rozetka",
            "--input-dir",
            "/tmp/rozetka",
            "--output",
            "/tmp/out.jsonl",
            "--format",
            "jsonl",
            "--dedup",
            "--max-pages",
            "3",
            "--time-budget-secs",
            "60",
            "--structured-threshold",
            "10",
            "--sample",
            "0",
        ])
        .unwrap();
        let extract = cli.command.extract_args();
        let output = cli.command.output_args();
        assert_eq!(extract.site, Site::Rozetka);
        assert_eq!(extract.options().structured_threshold, 10);
        assert_eq!(extract.limits().max_pages, Some(3));
        assert_eq!(extract.limits().time_budget, Some(Duration::from_secs(60)));
        assert_eq!(output.format, OutputFormat::Jsonl);
        assert!(output.dedup);
        assert_eq!(output.sample, 0);
        assert_eq!(output.output_path(Site::Rozetka), PathBuf::from("/tmp/out.jsonl"));
    }

    #[test]
    fn test_fetch_command() {
        let cli = Cli::try_parse_from([
            "catalog_extract",
            "fetch",
            "--site",
            "epicentrk",
            "--category-url",
            "https://epicentrk.ua/ua/shop/flyuidy/",
            "--end-page",
            "4",
            "--delay-min-ms",
            "100",
            "--delay-max-ms",
            "200",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch {
                category_url,
                start_page,
                end_page,
                delay_min_ms,
                delay_max_ms,
                timeout,
                user_agent,
                save_html,
                extract,
                ..
            } => {
                assert_eq!(category_url, "https://epicentrk.ua/ua/shop/flyuidy/");
                assert_eq!(save_html, None);
                assert_eq!(start_page, 1);
                assert_eq!(end_page, 4);
                assert_eq!(delay_min_ms, 100);
                assert_eq!(delay_max_ms, 200);
                assert_eq!(timeout, Config::REQUEST_TIMEOUT_SECS);
                assert_eq!(user_agent, Config::USER_AGENT);
                assert_eq!(extract.site, Site::Epicentrk);
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_fetch_save_html_dir() {
        let cli = Cli::try_parse_from([
            "catalog_extract",
            "fetch",
            "--site",
            "maudau",
            "--category-url",
            "https://maudau.com.ua/category/zasoby-dlia-prannia",
            "--save-html",
            "maudau_pages",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch { save_html, .. } => {
                assert_eq!(save_html, Some(PathBuf::from("maudau_pages")));
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_unknown_site_rejected() {
        let cli = Cli::try_parse_from([
            "catalog_extract",
            "files",
            "--site",
            "prom",
            "--input-dir",
            "pages",
        ]);
        let err = cli.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_missing_required_arg() {
        let cli = Cli::try_parse_from(["catalog_extract", "files", "--site", "maudau"]);
        assert!(cli.is_err());
        let err = cli.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_help_does_not_panic() {
        let cli = Cli::try_parse_from(["catalog_extract", "--help"]);
        assert!(cli.is_err());
        let err = cli.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_panic() {
        let cli = Cli::try_parse_from(["catalog_extract", "--version"]);
        assert!(cli.is_err());
        let err = cli.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
