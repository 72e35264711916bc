//! Batch driver: pages in, one accumulated product list out.
//!
//! Pages are processed one at a time. Between pages the batch checks its
//! limits (page cap, wall-clock budget, external stop signal, end of a
//! fetched catalog) and stops cleanly; a page already being extracted
//! always completes.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::dedup::dedup_by_url;
use crate::models::{ProductRecord, SkipTally};
use crate::reconcile::{ExtractionPath, PageError, PageExtractor, PageReport};
use crate::source;

/// Shared flag a signal handler sets to end the batch after the current page.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchLimits {
    pub max_pages: Option<usize>,
    pub time_budget: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PageLimit,
    TimeBudget,
    Interrupted,
    EndOfCatalog,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::PageLimit => "page limit reached",
            StopReason::TimeBudget => "time budget exhausted",
            StopReason::Interrupted => "interrupted",
            StopReason::EndOfCatalog => "catalog ran out of products",
        };
        f.write_str(text)
    }
}

/// Ordered records accumulated over a batch.
#[derive(Debug, Clone, Default)]
pub struct ProductCollection {
    records: Vec<ProductRecord>,
}

impl ProductCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page's records after everything collected so far.
    pub fn extend_page(&mut self, records: Vec<ProductRecord>) {
        self.records.extend(records);
    }

    /// Remove repeated URLs; returns how many records were dropped.
    pub fn dedup(&mut self) -> usize {
        dedup_by_url(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub pages_seen: usize,
    pub pages_with_products: usize,
    pub pages_failed: usize,
    pub structured_pages: usize,
    pub markup_pages: usize,
    pub fragment_failures: usize,
    pub skipped: SkipTally,
    pub duplicates_removed: usize,
    pub records: usize,
    pub stopped: Option<StopReason>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn log(&self) {
        info!(
            pages = self.pages_seen,
            with_products = self.pages_with_products,
            failed = self.pages_failed,
            structured = self.structured_pages,
            markup = self.markup_pages,
            records = self.records,
            duplicates = self.duplicates_removed,
            skipped = %self.skipped,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "batch finished"
        );
        if let Some(reason) = self.stopped {
            warn!(reason = %reason, "batch stopped early");
        }
    }
}

/// One extraction run over a finite list of pages.
pub struct Batch {
    extractor: PageExtractor,
    limits: BatchLimits,
    stop: StopSignal,
    started: Instant,
    collection: ProductCollection,
    summary: BatchSummary,
}

impl Batch {
    pub fn new(extractor: PageExtractor, limits: BatchLimits, stop: StopSignal) -> Self {
        Self {
            extractor,
            limits,
            stop,
            started: Instant::now(),
            collection: ProductCollection::new(),
            summary: BatchSummary::default(),
        }
    }

    pub fn extractor(&self) -> &PageExtractor {
        &self.extractor
    }

    /// Whether another page may start. Records the reason once it may not.
    pub fn should_stop(&mut self) -> Option<StopReason> {
        if let Some(reason) = self.summary.stopped {
            return Some(reason);
        }
        let reason = if self.stop.is_stopped() {
            Some(StopReason::Interrupted)
        } else if self
            .limits
            .max_pages
            .map(|max| self.summary.pages_seen >= max)
            .unwrap_or(false)
        {
            Some(StopReason::PageLimit)
        } else if self
            .limits
            .time_budget
            .map(|budget| self.started.elapsed() >= budget)
            .unwrap_or(false)
        {
            Some(StopReason::TimeBudget)
        } else {
            None
        };
        self.summary.stopped = reason;
        reason
    }

    /// Extract one page and append its records.
    pub fn process_page(&mut self, label: &str, html: &str) -> Result<usize, PageError> {
        self.summary.pages_seen += 1;
        match self.extractor.extract(html) {
            Ok(report) => Ok(self.accept(label, report)),
            Err(e) => {
                warn!(page = label, error = %e, "page produced no products");
                self.summary.pages_failed += 1;
                Err(e)
            }
        }
    }

    /// Extract a fetched listing page. A page after the first that yields no
    /// products is the end of the catalog; no further pages are started.
    pub fn process_catalog_page(&mut self, label: &str, html: &str, first: bool) -> Result<usize, PageError> {
        let result = self.process_page(label, html);
        if !first && matches!(result, Err(PageError::NoProducts { .. })) {
            info!(page = label, "no products past the first page, catalog exhausted");
            self.summary.stopped = Some(StopReason::EndOfCatalog);
        }
        result
    }

    /// Count a page that could not be obtained at all.
    pub fn record_unreadable(&mut self, label: &str, error: &dyn std::error::Error) {
        warn!(page = label, error = %error, "skipping unreadable page");
        self.summary.pages_seen += 1;
        self.summary.pages_failed += 1;
    }

    fn accept(&mut self, label: &str, report: PageReport) -> usize {
        let count = report.records.len();
        match report.path {
            ExtractionPath::Structured => self.summary.structured_pages += 1,
            ExtractionPath::Markup => self.summary.markup_pages += 1,
        }
        self.summary.pages_with_products += 1;
        self.summary.fragment_failures += report.fragment_failures;
        self.summary.skipped.merge(&report.skipped);

        info!(
            page = label,
            path = %report.path,
            records = count,
            total = self.collection.len() + count,
            "page extracted"
        );
        self.collection.extend_page(report.records);
        count
    }

    /// Process saved pages in order until they run out or a limit is hit.
    pub fn run_files(&mut self, files: &[PathBuf]) {
        for path in files {
            if self.should_stop().is_some() {
                break;
            }
            let label = source::page_label(path);
            match source::read_page(path) {
                Ok(html) => {
                    // Failures are counted and logged by process_page.
                    let _ = self.process_page(&label, &html);
                }
                Err(e) => self.record_unreadable(&label, &e),
            }
        }
    }

    /// Close the batch, optionally deduplicating by URL.
    pub fn finish(mut self, dedup: bool) -> (ProductCollection, BatchSummary) {
        if dedup {
            self.summary.duplicates_removed = self.collection.dedup();
        }
        self.summary.records = self.collection.len();
        self.summary.elapsed = self.started.elapsed();
        (self.collection, self.summary)
    }
}
