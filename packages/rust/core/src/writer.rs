//! Artifact writer.
//!
//! Artifacts are pretty-printed JSON, written to a hidden temp file next to
//! the target and then renamed into place.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use ecfr_shared::{Corpus, EcfrError, Result, SummaryEntry};

/// Metadata about a written artifact.
#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    /// Where the artifact was written.
    pub path: PathBuf,
    /// Number of top-level records in the artifact.
    pub count: usize,
    /// Size of the artifact in bytes.
    pub size_bytes: usize,
    /// Hex-encoded SHA-256 of the artifact.
    pub sha256: String,
}

/// Write the corpus artifact (a JSON array of title documents).
#[instrument(skip_all, fields(path = %path.display(), titles = corpus.len()))]
pub fn write_corpus(path: &Path, corpus: &Corpus) -> Result<WriteReport> {
    let report = write_json(path, corpus, corpus.len())?;
    info!(
        count = report.count,
        path = %report.path.display(),
        "wrote corpus artifact"
    );
    Ok(report)
}

/// Write the summary artifact in the order given.
#[instrument(skip_all, fields(path = %path.display(), entries = entries.len()))]
pub fn write_summary(path: &Path, entries: &[SummaryEntry]) -> Result<WriteReport> {
    let report = write_json(path, entries, entries.len())?;
    info!(
        count = report.count,
        path = %report.path.display(),
        "wrote summary artifact"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T, count: usize) -> Result<WriteReport> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| EcfrError::validation(format!("JSON serialization failed: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EcfrError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| EcfrError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&temp, &json).map_err(|e| EcfrError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| EcfrError::io(path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(path = %path.display(), size = json.len(), "wrote JSON file");

    Ok(WriteReport {
        path: path.to_path_buf(),
        count,
        size_bytes: json.len(),
        sha256,
    })
}
