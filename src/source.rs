//! Saved catalog pages on disk.
//!
//! [`PageArchive`] writes fetched pages in the layout [`list_html_files`]
//! reads back, so a live run can be re-extracted offline.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Page numbers that could not be fetched, one per line.
pub const FAILED_PAGES_FILE: &str = "failed.txt";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("input directory not found: {0}")]
    MissingDir(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Every `*.html` file directly inside `dir`, sorted by file name.
pub fn list_html_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    if !dir.is_dir() {
        return Err(SourceError::MissingDir(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|source| SourceError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("html"))
                .unwrap_or(false)
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Read a page as UTF-8; invalid sequences are replaced, never rejected.
pub fn read_page(path: &Path) -> Result<String, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Short label for log lines and summaries.
pub fn page_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// File name for a fetched page; zero-padded so name order is page order.
pub fn archived_page_name(page: u32) -> String {
    format!("page_{:03}.html", page)
}

/// Directory receiving raw fetched pages plus a list of failed page numbers.
#[derive(Debug)]
pub struct PageArchive {
    dir: PathBuf,
    failed: BTreeSet<u32>,
}

impl PageArchive {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| SourceError::Write {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            failed: BTreeSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&mut self, page: u32, html: &str) -> Result<PathBuf, SourceError> {
        let path = self.dir.join(archived_page_name(page));
        std::fs::write(&path, html).map_err(|source| SourceError::Write {
            path: path.clone(),
            source,
        })?;
        self.failed.remove(&page);
        debug!(path = %path.display(), bytes = html.len(), "page saved");
        Ok(path)
    }

    pub fn record_failure(&mut self, page: u32) {
        self.failed.insert(page);
    }

    pub fn failed_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.failed.iter().copied()
    }

    /// Write the failed-page list. Nothing is written when every page arrived.
    pub fn finish(self) -> Result<Option<PathBuf>, SourceError> {
        if self.failed.is_empty() {
            return Ok(None);
        }
        let path = self.dir.join(FAILED_PAGES_FILE);
        let body: String = self.failed.iter().map(|page| format!("{}\n", page)).collect();
        std::fs::write(&path, body).map_err(|source| SourceError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), pages = self.failed.len(), "failed pages listed");
        Ok(Some(path))
    }
}
