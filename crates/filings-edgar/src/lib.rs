#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR archive backend.
//!
//! This crate provides access to SEC EDGAR filings including:
//!
//! - CIK (Central Index Key) lookup from ticker symbols
//! - Company submissions index (recent filings and older pages)
//! - Full submission and primary document downloads
//!
//! # Example
//!
//! ```no_run
//! use filings_edgar::EdgarArchive;
//! use filings_core::{Archive, DocumentType, FetchRequest};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let archive = EdgarArchive::new("MyApp/1.0 (contact@example.com)")?;
//!
//!     let request = FetchRequest::new(DocumentType::AnnualReport, "JPM", 2);
//!     let written = archive.fetch(&request, Path::new("data/sec_filings")).await?;
//!     println!("{written} bundles");
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use filings_core::{Archive, DocumentType, FetchRequest, FilingsError, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// SEC EDGAR document archive base URL
const ARCHIVES_BASE_URL: &str = "https://www.sec.gov/Archives/edgar/data";

/// SEC company tickers URL
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Per-request network timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// File name of the full-text submission inside a bundle
pub const FULL_SUBMISSION_FILE: &str = "full-submission.txt";

/// File stem of the primary document inside a bundle
pub const PRIMARY_DOCUMENT_STEM: &str = "primary-document";

const ARCHIVE_NAME: &str = "SEC EDGAR";

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// SEC EDGAR filing archive.
///
/// Every HTTP exchange holds the rate limiter for its full duration, so a
/// shared `EdgarArchive` never has two requests in flight and consecutive
/// requests start at least 100ms apart.
#[derive(Debug)]
pub struct EdgarArchive {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    tickers: OnceCell<HashMap<String, u64>>,
}

impl EdgarArchive {
    /// Create a new EDGAR archive with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Example
    /// ```
    /// use filings_edgar::EdgarArchive;
    ///
    /// let archive = EdgarArchive::new("MyApp/1.0 (contact@example.com)").unwrap();
    /// ```
    pub fn new(user_agent: &str) -> Result<Self> {
        if user_agent.trim().is_empty() {
            return Err(FilingsError::Configuration(
                "SEC EDGAR requires an identifying user agent".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FilingsError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client))
    }

    /// Create a new EDGAR archive with a custom HTTP client.
    ///
    /// The client must already carry an identifying user agent.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
            tickers: OnceCell::new(),
        }
    }

    /// Perform one rate-limited GET and return the body.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        // Held until the body is read: one request in flight at a time
        let mut limiter = self.rate_limiter.lock().await;
        limiter.wait().await;

        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FilingsError::Network(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Err(FilingsError::NotFound(url.to_string())),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                warn!(%status, "Request refused - check user agent and request rate");
                return Err(FilingsError::RateLimited {
                    archive: ARCHIVE_NAME.to_string(),
                    retry_after: None,
                });
            }
            s if !s.is_success() => {
                return Err(FilingsError::Network(format!("HTTP {status} for {url}")));
            }
            _ => {}
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FilingsError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_bytes(url).await?;
        serde_json::from_slice(&body)
            .map_err(|e| FilingsError::Parse(format!("Failed to parse {url}: {e}")))
    }

    /// Ticker to CIK map, fetched once per archive instance.
    async fn ticker_map(&self) -> Result<&HashMap<String, u64>> {
        self.tickers
            .get_or_try_init(|| async {
                debug!("Fetching company tickers from SEC");
                let data: HashMap<String, CompanyTickerInfo> =
                    self.get_json(COMPANY_TICKERS_URL).await?;
                Ok::<_, FilingsError>(
                    data.into_values()
                        .map(|c| (c.ticker.to_uppercase(), c.cik_str))
                        .collect::<HashMap<_, _>>(),
                )
            })
            .await
    }

    /// Look up a company's CIK number from a ticker symbol or a numeric CIK.
    ///
    /// # Returns
    /// The company's CIK number as an integer
    pub async fn get_cik(&self, identifier: &str) -> Result<u64> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(FilingsError::InvalidParameter("Empty identifier".to_string()));
        }

        // Registry identifiers are used as-is
        if identifier.bytes().all(|b| b.is_ascii_digit()) {
            return identifier
                .parse()
                .map_err(|e| FilingsError::InvalidParameter(format!("Bad CIK {identifier}: {e}")));
        }

        let tickers = self.ticker_map().await?;
        match tickers.get(&identifier.to_uppercase()) {
            Some(cik) => {
                debug!("Found CIK {} for ticker {}", pad_cik(*cik), identifier);
                Ok(*cik)
            }
            None => Err(FilingsError::SymbolNotFound(identifier.to_string())),
        }
    }

    /// Fetch company submissions/filings metadata.
    async fn fetch_company_submissions(&self, cik: u64) -> Result<CompanySubmissions> {
        let url = format!("{}/submissions/CIK{}.json", EDGAR_BASE_URL, pad_cik(cik));
        self.get_json(&url).await
    }

    /// Collect the `limit` most recent filings of one form, following
    /// older submission pages when the recent window is too short.
    async fn recent_filings(
        &self,
        cik: u64,
        doc_type: DocumentType,
        limit: usize,
    ) -> Result<Vec<FilingRef>> {
        let submissions = self.fetch_company_submissions(cik).await?;
        debug!(
            company = %submissions.name,
            cik = %pad_cik(cik),
            "Loaded submissions index"
        );

        let mut filings = select_recent(&submissions.filings.recent, doc_type, limit);

        for page in &submissions.filings.files {
            if filings.len() >= limit {
                break;
            }
            let url = format!("{}/submissions/{}", EDGAR_BASE_URL, page.name);
            let older: FilingColumns = self.get_json(&url).await?;
            filings.extend(select_recent(&older, doc_type, limit - filings.len()));
        }

        Ok(filings)
    }

    /// Download one bundle into `bundle_dir`.
    async fn download_bundle(
        &self,
        cik: u64,
        filing: &FilingRef,
        bundle_dir: &Path,
        include_details: bool,
    ) -> Result<()> {
        tokio::fs::create_dir_all(bundle_dir).await?;

        let base = format!("{}/{}/{}", ARCHIVES_BASE_URL, cik, filing.accession.replace('-', ""));

        let submission = self
            .get_bytes(&format!("{}/{}.txt", base, filing.accession))
            .await?;
        tokio::fs::write(bundle_dir.join(FULL_SUBMISSION_FILE), submission).await?;

        if include_details && let Some(primary) = &filing.primary_document {
            let document = self.get_bytes(&format!("{base}/{primary}")).await?;
            tokio::fs::write(bundle_dir.join(primary_document_name(primary)), document).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl Archive for EdgarArchive {
    fn name(&self) -> &str {
        ARCHIVE_NAME
    }

    async fn check_available(&self) -> Result<()> {
        self.ticker_map()
            .await
            .map(|_| ())
            .map_err(|e| FilingsError::Configuration(format!("SEC EDGAR unreachable: {e}")))
    }

    async fn fetch(&self, request: &FetchRequest<'_>, root: &Path) -> Result<usize> {
        if request.limit == 0 {
            return Ok(0);
        }

        let cik = self.get_cik(request.identifier).await?;
        let form = request.doc_type.form();
        let filings = self.recent_filings(cik, request.doc_type, request.limit).await?;

        if filings.is_empty() {
            return Err(FilingsError::NotFound(format!(
                "no {} filings for {}",
                form, request.identifier
            )));
        }
        if filings.len() < request.limit {
            warn!(
                identifier = request.identifier,
                form,
                found = filings.len(),
                limit = request.limit,
                "Archive holds fewer filings than requested"
            );
        }

        let form_dir = root.join(request.identifier).join(form);
        let mut written = 0;
        for filing in &filings {
            let bundle_dir = form_dir.join(&filing.accession);
            if bundle_is_intact(&bundle_dir, request.include_details).await {
                debug!(accession = %filing.accession, "Bundle already present, skipping");
            } else {
                self.download_bundle(cik, filing, &bundle_dir, request.include_details)
                    .await?;
            }
            written += 1;
        }

        Ok(written)
    }
}

/// CIK zero-padded to 10 digits, as the EDGAR API expects.
fn pad_cik(cik: u64) -> String {
    format!("{:0>10}", cik)
}

/// Bundle file name for a primary document, keeping its extension.
fn primary_document_name(primary: &str) -> String {
    let ext = Path::new(primary)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("html");
    format!("{PRIMARY_DOCUMENT_STEM}.{ext}")
}

/// Pick the first `limit` filings of a form from newest-first columns.
fn select_recent(columns: &FilingColumns, doc_type: DocumentType, limit: usize) -> Vec<FilingRef> {
    let form = doc_type.form();
    columns
        .form
        .iter()
        .zip(&columns.accession_number)
        .enumerate()
        .filter(|(_, (f, _))| f.as_str() == form)
        .take(limit)
        .map(|(i, (_, accession))| FilingRef {
            accession: accession.clone(),
            primary_document: columns
                .primary_document
                .get(i)
                .filter(|d| !d.is_empty())
                .cloned(),
        })
        .collect()
}

/// True if the bundle already holds a non-empty full submission (and a
/// non-empty primary document when details are requested).
async fn bundle_is_intact(bundle_dir: &Path, include_details: bool) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(bundle_dir).await else {
        return false;
    };

    let mut has_submission = false;
    let mut has_primary = false;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(meta) = entry.metadata().await else {
            return false;
        };
        if meta.is_file() && meta.len() == 0 {
            return false;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == FULL_SUBMISSION_FILE {
            has_submission = true;
        } else if name.starts_with(PRIMARY_DOCUMENT_STEM) {
            has_primary = true;
        }
    }

    has_submission && (has_primary || !include_details)
}

// =============================================================================
// SEC API Response Types
// =============================================================================

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
}

/// Company submissions/filings metadata.
#[derive(Debug, Deserialize)]
struct CompanySubmissions {
    /// Company name
    #[serde(default)]
    name: String,
    filings: SubmissionFilings,
}

#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    /// Most recent filings (at least one year or 1000 filings)
    recent: FilingColumns,
    /// Older filings, split into separate pages
    #[serde(default)]
    files: Vec<SubmissionPage>,
}

#[derive(Debug, Deserialize)]
struct SubmissionPage {
    name: String,
}

/// Column-oriented filing list, newest first.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilingColumns {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    primary_document: Vec<String>,
}

/// One filing selected for download.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FilingRef {
    accession: String,
    primary_document: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
