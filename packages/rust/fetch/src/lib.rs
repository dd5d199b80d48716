//! Title document retrieval from the eCFR versioner API.
//!
//! Two document shapes are available per title:
//! - the current structure tree as JSON (`structure/current/title-N.json`),
//!   which is what the summary pipeline consumes;
//! - a full-text XML snapshot for a given date (`full/YYYY-MM-DD/title-N.xml`).
//!
//! A request either yields a body or the non-success status the API answered
//! with. Transport failures surface as [`EcfrError::Network`].

use std::time::Duration;

use chrono::NaiveDate;
use ecfr_shared::{EcfrError, FetchConfig, Result};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("ecfr-digest/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Which rendition of a title to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Current hierarchy as JSON.
    Structure,
    /// Full text as XML, as of the given date.
    Full(NaiveDate),
}

impl DocumentKind {
    /// File extension used when saving this kind to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Structure => "json",
            Self::Full(_) => "xml",
        }
    }

    /// On-disk file name for `title`, e.g. `title-5.json`.
    pub fn file_name(&self, title: u32) -> String {
        format!("title-{title}.{}", self.extension())
    }
}

/// Result of a single title request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response body, byte for byte as sent.
    Body(Vec<u8>),
    /// Any other HTTP status.
    Status(u16),
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// API root; title paths are appended to it.
    pub base_url: Url,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl TryFrom<&FetchConfig> for FetchOptions {
    type Error = EcfrError;

    fn try_from(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url()?,
            timeout_secs: config.timeout_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// TitleFetcher
// ---------------------------------------------------------------------------

/// HTTP client for the versioner API.
pub struct TitleFetcher {
    client: Client,
    base: String,
}

impl TitleFetcher {
    /// Build a fetcher with the given options.
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| EcfrError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base: opts.base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Request URL for `title` in the given rendition.
    pub fn title_url(&self, title: u32, kind: DocumentKind) -> String {
        match kind {
            DocumentKind::Structure => {
                format!("{}/structure/current/title-{title}.json", self.base)
            }
            DocumentKind::Full(date) => format!(
                "{}/full/{}/title-{title}.xml",
                self.base,
                date.format("%Y-%m-%d")
            ),
        }
    }

    /// Fetch the current structure tree of `title`.
    pub async fn fetch_structure(&self, title: u32) -> Result<FetchOutcome> {
        self.fetch(title, DocumentKind::Structure).await
    }

    /// Fetch the full-text XML of `title` as of `date`.
    pub async fn fetch_full(&self, title: u32, date: NaiveDate) -> Result<FetchOutcome> {
        self.fetch(title, DocumentKind::Full(date)).await
    }

    /// Fetch `title` in the given rendition.
    #[instrument(skip(self))]
    pub async fn fetch(&self, title: u32, kind: DocumentKind) -> Result<FetchOutcome> {
        let url = self.title_url(title, kind);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EcfrError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "non-success status");
            return Ok(FetchOutcome::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EcfrError::Network(format!("{url}: failed to read body: {e}")))?
            .to_vec();

        debug!(%url, bytes = body.len(), "fetched title");
        Ok(FetchOutcome::Body(body))
    }
}
