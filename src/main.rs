use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use catalog_extract::cli::{Cli, Commands, ExtractArgs, OutputArgs};
use catalog_extract::export::{self, ExportError};
use catalog_extract::logging;
use catalog_extract::network::{FetchError, HttpClient};
use catalog_extract::pipeline::{Batch, BatchSummary, ProductCollection, StopSignal};
use catalog_extract::reconcile::PageExtractor;
use catalog_extract::source::{self, PageArchive, SourceError};
use catalog_extract::url_utils::normalize_url_for_cli;
use clap::Parser;
use rand::Rng;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum MainError {
    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("Input error: {0}")]
    Source(#[from] SourceError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("HTTP client error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("No products were extracted from any page")]
    NoProducts,
}

impl MainError {
    fn exit_code(&self) -> u8 {
        match self {
            MainError::Usage(_) => 2,
            MainError::Source(_) | MainError::Export(_) | MainError::Fetch(_) | MainError::Task(_) => 3,
            MainError::NoProducts => 4,
        }
    }
}

/// First Ctrl+C finishes the current page and writes what was collected.
/// Second Ctrl+C exits immediately.
fn setup_shutdown_handler(stop: StopSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, finishing the current page (press again to force quit)");
            stop.stop();

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nForce quit requested, exiting immediately...");
                std::process::exit(130);
            }
        }
    });
}

fn new_batch(extract: &ExtractArgs, stop: StopSignal) -> Batch {
    let extractor = PageExtractor::new(extract.site.profile(), extract.options());
    Batch::new(extractor, extract.limits(), stop)
}

async fn run_files(input_dir: PathBuf, extract: &ExtractArgs, stop: StopSignal) -> Result<Batch, MainError> {
    let files = source::list_html_files(&input_dir)?;
    info!(site = %extract.site, dir = %input_dir.display(), files = files.len(), "found saved pages");

    let mut batch = new_batch(extract, stop);
    let batch = tokio::task::spawn_blocking(move || {
        batch.run_files(&files);
        batch
    })
    .await?;
    Ok(batch)
}

#[allow(clippy::too_many_arguments)]
async fn run_fetch(
    category_url: &str,
    start_page: u32,
    end_page: u32,
    delay_min_ms: u64,
    delay_max_ms: u64,
    timeout: u64,
    user_agent: String,
    save_html: Option<PathBuf>,
    extract: &ExtractArgs,
    stop: StopSignal,
) -> Result<Batch, MainError> {
    if start_page == 0 || start_page > end_page {
        return Err(MainError::Usage(format!(
            "page range {}..={} is empty",
            start_page, end_page
        )));
    }
    if delay_min_ms > delay_max_ms {
        return Err(MainError::Usage(format!(
            "--delay-min-ms ({}) exceeds --delay-max-ms ({})",
            delay_min_ms, delay_max_ms
        )));
    }

    let client = HttpClient::new(user_agent, timeout)?;
    let category_url = normalize_url_for_cli(category_url);
    let mut archive = save_html.map(PageArchive::create).transpose()?;
    let mut batch = new_batch(extract, stop);

    for page in start_page..=end_page {
        if batch.should_stop().is_some() {
            break;
        }
        if page > start_page {
            let delay_ms = rand::thread_rng().gen_range(delay_min_ms..=delay_max_ms);
            info!(delay_ms, "pausing before next page");
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            if batch.should_stop().is_some() {
                break;
            }
        }

        let url = batch.extractor().profile().page_url(&category_url, page);
        let label = format!("page {}", page);
        info!(url = %url, page, "fetching catalog page");

        match client.fetch(&url).await {
            Ok(result) => {
                if let Some(archive) = archive.as_mut() {
                    archive.save(page, &result.content)?;
                }
                // Failures are counted and logged by the batch.
                let _ = batch.process_catalog_page(&label, &result.content, page == start_page);
            }
            Err(FetchError::Challenge) => {
                error!(url = %url, "anti-bot challenge served, stopping");
                batch.record_unreadable(&label, &FetchError::Challenge);
                if let Some(archive) = archive.as_mut() {
                    archive.record_failure(page);
                }
                break;
            }
            Err(e) => {
                batch.record_unreadable(&label, &e);
                if let Some(archive) = archive.as_mut() {
                    archive.record_failure(page);
                }
            }
        }
    }

    if let Some(archive) = archive {
        info!(dir = %archive.dir().display(), "fetched pages saved");
        archive.finish()?;
    }
    Ok(batch)
}

fn write_output(
    collection: &ProductCollection,
    summary: &BatchSummary,
    extract: &ExtractArgs,
    output: &OutputArgs,
) -> Result<(), MainError> {
    summary.log();
    if collection.is_empty() {
        return Err(MainError::NoProducts);
    }

    let path = output.output_path(extract.site);
    export::write_file(collection.records(), output.format, &path, !output.no_bom)?;
    info!(path = %path.display(), records = collection.len(), format = output.format.extension(), "results saved");

    if output.sample > 0 {
        print!("{}", export::render_sample(collection.records(), output.sample));
    }
    Ok(())
}

async fn run(command: Commands) -> Result<(), MainError> {
    let stop = StopSignal::new();
    setup_shutdown_handler(stop.clone());

    let extract = command.extract_args().clone();
    let output = command.output_args().clone();

    let batch = match command {
        Commands::Files { input_dir, .. } => run_files(input_dir, &extract, stop).await?,
        Commands::Fetch {
            category_url,
            start_page,
            end_page,
            delay_min_ms,
            delay_max_ms,
            timeout,
            user_agent,
            save_html,
            ..
        } => {
            run_fetch(
                &category_url,
                start_page,
                end_page,
                delay_min_ms,
                delay_max_ms,
                timeout,
                user_agent,
                save_html,
                &extract,
                stop,
            )
            .await?
        }
    };

    let (collection, summary) = batch.finish(output.dedup);
    write_output(&collection, &summary, &extract, &output)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let output = cli.command.output_args();
    let _log_guards = match logging::init_logging(&output.log_dir, output.json_logs) {
        Ok(guards) => Some(guards),
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
