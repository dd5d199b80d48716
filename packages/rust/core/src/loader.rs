//! Title document loader.
//!
//! Reads every `*.json` file in a folder, in lexical file-name order, and
//! parses each into a [`TitleDocument`]. A file that cannot be read or parsed
//! is logged and recorded as a [`LoadFailure`]; the remaining files are still
//! loaded.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use ecfr_shared::{Corpus, EcfrError, Result, SummaryEntry, TitleDocument, from_json_str};

use crate::progress::ProgressReporter;

/// File-name suffix of title documents.
pub const DOCUMENT_SUFFIX: &str = ".json";

/// A file that was skipped, with the reason.
#[derive(Debug)]
pub struct LoadFailure {
    /// File name within the input folder.
    pub file: String,
    /// Why the file could not be loaded.
    pub error: EcfrError,
}

/// Outcome of loading a folder.
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Successfully parsed titles, in file-name order.
    pub documents: Vec<TitleDocument>,
    /// Skipped files, in file-name order.
    pub failures: Vec<LoadFailure>,
}

impl LoadResult {
    pub fn loaded(&self) -> usize {
        self.documents.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// List title document files in `dir`, sorted by file name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| EcfrError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EcfrError::io(dir, e))?;
        if entry.file_name().to_string_lossy().ends_with(DOCUMENT_SUFFIX) {
            paths.push(entry.path());
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Read and parse a single title document.
pub fn parse_document(path: &Path) -> Result<TitleDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| EcfrError::io(path, e))?;
    from_json_str(&content)
        .map_err(|e| EcfrError::parse(format!("{}: {e}", path.display())))
}

/// Load every title document in `dir`.
///
/// Only an unreadable folder is an error; individual files that fail are
/// collected in [`LoadResult::failures`].
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_titles(dir: &Path, progress: &dyn ProgressReporter) -> Result<LoadResult> {
    let paths = list_documents(dir)?;
    let total = paths.len();
    let mut result = LoadResult::default();

    for (i, path) in paths.iter().enumerate() {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        progress.item(&file, i + 1, total);

        match parse_document(path) {
            Ok(document) => {
                info!(file = %file, "loaded title document");
                result.documents.push(document);
            }
            Err(error) => {
                warn!(file = %file, error = %error, "failed to load title document, skipping");
                result.failures.push(LoadFailure { file, error });
            }
        }
    }

    info!(
        loaded = result.loaded(),
        failed = result.failed(),
        "title documents loaded"
    );

    Ok(result)
}

/// Read a corpus artifact written by [`crate::writer::write_corpus`].
pub fn read_corpus(path: &Path) -> Result<Corpus> {
    let content = std::fs::read_to_string(path).map_err(|e| EcfrError::io(path, e))?;
    from_json_str(&content)
        .map_err(|e| EcfrError::parse(format!("invalid corpus {}: {e}", path.display())))
}

/// Read a summary artifact written by [`crate::writer::write_summary`].
pub fn read_summary(path: &Path) -> Result<Vec<SummaryEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| EcfrError::io(path, e))?;
    from_json_str(&content)
        .map_err(|e| EcfrError::parse(format!("invalid summary {}: {e}", path.display())))
}
