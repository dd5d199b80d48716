//! End-to-end workflows.
//!
//! - `download`: API → `title-N.json` / `title-N.xml` files
//! - `combine`: title folder → loader → aggregator → corpus artifact
//! - `summarize`: corpus artifact → flattener → summary artifact

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use ecfr_fetch::{DocumentKind, FetchOptions, FetchOutcome, TitleFetcher};
use ecfr_shared::{EcfrError, Result};

use crate::loader::{self, LoadFailure};
use crate::progress::ProgressReporter;
use crate::writer::{self, WriteReport};
use crate::{aggregator, flattener};

// ---------------------------------------------------------------------------
// combine
// ---------------------------------------------------------------------------

/// Result of the `combine` workflow.
#[derive(Debug)]
pub struct CombineResult {
    /// Number of titles written to the corpus.
    pub loaded: usize,
    /// Files that were skipped.
    pub failures: Vec<LoadFailure>,
    /// The written corpus artifact.
    pub corpus: WriteReport,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Load every title in `input_dir` and write them as one corpus to `corpus_file`.
#[instrument(skip_all, fields(input = %input_dir.display(), output = %corpus_file.display()))]
pub fn combine(
    input_dir: &Path,
    corpus_file: &Path,
    progress: &dyn ProgressReporter,
) -> Result<CombineResult> {
    let start = Instant::now();

    progress.phase("Loading title documents");
    let loaded = loader::load_titles(input_dir, progress)?;

    progress.phase("Combining titles");
    let aggregated = aggregator::aggregate(loaded.documents);

    progress.phase("Writing corpus");
    let corpus = writer::write_corpus(corpus_file, &aggregated.corpus)?;

    let result = CombineResult {
        loaded: aggregated.count,
        failures: loaded.failures,
        corpus,
        elapsed: start.elapsed(),
    };

    progress.done();

    info!(
        loaded = result.loaded,
        failed = result.failures.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "combine complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// summarize
// ---------------------------------------------------------------------------

/// Result of the `summarize` workflow.
#[derive(Debug)]
pub struct SummarizeResult {
    /// Titles in the corpus.
    pub titles: usize,
    /// The written summary artifact.
    pub summary: WriteReport,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Flatten the corpus in `corpus_file` and write the summary to `summary_file`.
#[instrument(skip_all, fields(input = %corpus_file.display(), output = %summary_file.display()))]
pub fn summarize(
    corpus_file: &Path,
    summary_file: &Path,
    progress: &dyn ProgressReporter,
) -> Result<SummarizeResult> {
    let start = Instant::now();

    progress.phase("Reading corpus");
    let corpus = loader::read_corpus(corpus_file)?;

    progress.phase("Flattening titles");
    let entries = flattener::flatten(&corpus);

    progress.phase("Writing summary");
    let summary = writer::write_summary(summary_file, &entries)?;

    let result = SummarizeResult {
        titles: corpus.len(),
        summary,
        elapsed: start.elapsed(),
    };

    progress.done();

    info!(
        titles = result.titles,
        entries = result.summary.count,
        elapsed_ms = result.elapsed.as_millis(),
        "summarize complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// download
// ---------------------------------------------------------------------------

/// Configuration for the `download` workflow.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// API client settings.
    pub fetch: FetchOptions,
    /// Rendition to download.
    pub kind: DocumentKind,
    /// Title indexes to request, in ascending order.
    pub titles: RangeInclusive<u32>,
    /// Folder receiving `title-N.<ext>` files.
    pub out_dir: PathBuf,
    /// Pause between consecutive requests.
    pub delay: Duration,
}

/// Result of the `download` workflow.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Files written, in title order.
    pub saved: Vec<PathBuf>,
    /// Titles that could not be saved, with the reason.
    pub failed: Vec<(u32, String)>,
}

/// Download each title in `config.titles`, one request at a time.
///
/// A title that answers with a non-success status, fails in transit, or
/// cannot be written is recorded in [`DownloadReport::failed`] and the loop
/// moves on.
#[instrument(skip_all, fields(out = %config.out_dir.display(), kind = ?config.kind))]
pub async fn download(
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> Result<DownloadReport> {
    std::fs::create_dir_all(&config.out_dir).map_err(|e| EcfrError::io(&config.out_dir, e))?;

    let fetcher = TitleFetcher::new(&config.fetch)?;
    let total = config.titles.clone().count();
    let mut report = DownloadReport::default();

    progress.phase("Downloading titles");

    for (i, title) in config.titles.clone().enumerate() {
        if i > 0 && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }

        let file_name = config.kind.file_name(title);
        progress.item(&file_name, i + 1, total);

        match save_title(&fetcher, config, title, &file_name).await {
            Ok(path) => {
                info!(title, path = %path.display(), "downloaded title");
                report.saved.push(path);
            }
            Err(error) => {
                warn!(title, %error, "failed to download title");
                report.failed.push((title, error.to_string()));
            }
        }
    }

    progress.done();

    info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        "download complete"
    );

    Ok(report)
}

async fn save_title(
    fetcher: &TitleFetcher,
    config: &DownloadConfig,
    title: u32,
    file_name: &str,
) -> Result<PathBuf> {
    let body = match fetcher.fetch(title, config.kind).await? {
        FetchOutcome::Body(body) => body,
        FetchOutcome::Status(code) => {
            return Err(EcfrError::Network(format!("HTTP status {code}")));
        }
    };

    let path = config.out_dir.join(file_name);
    std::fs::write(&path, &body).map_err(|e| EcfrError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use ecfr_shared::SummaryEntry;

    fn temp_dir() -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("ecfr-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn combine_then_summarize_fixtures() {
        let tmp = temp_dir();
        let corpus_file = tmp.join("ecfr_combined.json");
        let summary_file = tmp.join("small_summary.json");

        let combined =
            combine(Path::new("../../../fixtures/titles"), &corpus_file, &SilentProgress).unwrap();
        assert_eq!(combined.loaded, 2);
        assert_eq!(combined.failures.len(), 1);
        assert_eq!(combined.corpus.count, 2);

        let corpus: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&corpus_file).unwrap()).unwrap();
        let titles = corpus.as_array().unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0]["label_level"], "Title 1");
        assert_eq!(titles[1]["label"], "Appendix A");

        let summarized = summarize(&corpus_file, &summary_file, &SilentProgress).unwrap();
        assert_eq!(summarized.titles, 2);
        assert_eq!(summarized.summary.count, 6);

        let entries: Vec<SummaryEntry> =
            serde_json::from_str(&std::fs::read_to_string(&summary_file).unwrap()).unwrap();
        let labels: Vec<_> = entries.iter().map(|e| e.label.as_deref().unwrap()).collect();
        assert_eq!(
            labels,
            [
                "Chapter I - Administrative Committee of the Federal Register",
                "Part 1 - Definitions",
                "§ 1.1 Definitions.",
                "Part 2 - General Information",
                "Chapter II - Office of the Federal Register",
                "Section A-1",
            ]
        );
        assert!(entries[..5].iter().all(|e| e.title_number.as_deref() == Some("1")));
        assert_eq!(entries[5].title_number, None);
        assert_eq!(entries[0].word_count, 6);
        assert_eq!(entries[4].description, None);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn deep_title_survives_combine_and_summarize() {
        let tmp = temp_dir();
        let input = tmp.join("json_titles");
        std::fs::create_dir_all(&input).unwrap();

        let depth = 2_000;
        let mut json = String::from(r#"{"label":"Title 21 - Food and Drugs","children":["#);
        for level in 0..depth {
            json.push_str(&format!(
                r#"{{"type":"part","label":"Level {level}","description":"w","children":["#
            ));
        }
        json.push_str(r#"{"type":"section","description":"bottom of the tree"}"#);
        json.push_str(&"]}".repeat(depth));
        json.push_str("]}");
        std::fs::write(input.join("title-21.json"), &json).unwrap();

        let corpus_file = tmp.join("ecfr_combined.json");
        let summary_file = tmp.join("small_summary.json");

        let combined = combine(&input, &corpus_file, &SilentProgress).unwrap();
        assert_eq!(combined.loaded, 1);
        assert!(combined.failures.is_empty());

        let summarized = summarize(&corpus_file, &summary_file, &SilentProgress).unwrap();
        assert_eq!(summarized.titles, 1);
        assert_eq!(summarized.summary.count, depth + 1);

        let entries = crate::loader::read_summary(&summary_file).unwrap();
        assert_eq!(entries.len(), depth + 1);
        assert_eq!(entries[0].label.as_deref(), Some("Level 0"));
        assert_eq!(entries[depth].word_count, 4);
        assert!(entries.iter().all(|e| e.title_number.as_deref() == Some("21")));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn summarize_rejects_bad_corpus() {
        let tmp = temp_dir();
        let corpus_file = tmp.join("ecfr_combined.json");
        std::fs::write(&corpus_file, "{not json").unwrap();

        let result = summarize(&corpus_file, &tmp.join("out.json"), &SilentProgress);
        assert!(matches!(result, Err(EcfrError::Parse { .. })));
        assert!(!tmp.join("out.json").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn download_skips_failed_titles() {
        let server = wiremock::MockServer::start().await;

        for title in [1, 3] {
            wiremock::Mock::given(wiremock::matchers::method("GET"))
                .and(wiremock::matchers::path(format!(
                    "/structure/current/title-{title}.json"
                )))
                .respond_with(
                    wiremock::ResponseTemplate::new(200)
                        .set_body_string(format!(r#"{{"label":"Title {title}"}}"#)),
                )
                .mount(&server)
                .await;
        }
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/structure/current/title-2.json"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let tmp = temp_dir();
        let config = DownloadConfig {
            fetch: FetchOptions {
                base_url: server.uri().parse().unwrap(),
                timeout_secs: 5,
            },
            kind: DocumentKind::Structure,
            titles: 1..=3,
            out_dir: tmp.join("json_titles"),
            delay: Duration::ZERO,
        };

        let report = download(&config, &SilentProgress).await.unwrap();

        assert_eq!(
            report.saved,
            [
                tmp.join("json_titles/title-1.json"),
                tmp.join("json_titles/title-3.json")
            ]
        );
        assert_eq!(
            report.failed,
            [(2, "network error: HTTP status 503".to_string())]
        );
        assert_eq!(
            std::fs::read_to_string(tmp.join("json_titles/title-3.json")).unwrap(),
            r#"{"label":"Title 3"}"#
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn download_full_text_uses_snapshot_date() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/full/2024-01-01/title-4.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<ECFR/>"))
            .mount(&server)
            .await;

        let tmp = temp_dir();
        let config = DownloadConfig {
            fetch: FetchOptions {
                base_url: server.uri().parse().unwrap(),
                timeout_secs: 5,
            },
            kind: DocumentKind::Full(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            titles: 4..=4,
            out_dir: tmp.clone(),
            delay: Duration::ZERO,
        };

        let report = download(&config, &SilentProgress).await.unwrap();
        assert_eq!(report.saved, [tmp.join("title-4.xml")]);
        assert!(report.failed.is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn download_writes_body_bytes_verbatim() {
        let server = wiremock::MockServer::start().await;
        let raw = vec![0xff, 0xfe, b'<', b'E', b'C', b'F', b'R', b'/', b'>', 0x80];

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/full/2024-01-01/title-8.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(raw.clone()))
            .mount(&server)
            .await;

        let tmp = temp_dir();
        let config = DownloadConfig {
            fetch: FetchOptions {
                base_url: server.uri().parse().unwrap(),
                timeout_secs: 5,
            },
            kind: DocumentKind::Full(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            titles: 8..=8,
            out_dir: tmp.clone(),
            delay: Duration::ZERO,
        };

        let report = download(&config, &SilentProgress).await.unwrap();
        assert!(report.failed.is_empty());
        assert_eq!(std::fs::read(tmp.join("title-8.xml")).unwrap(), raw);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
