//! Per-(commodity, year) collection pipeline.
//!
//! resolve → throttle → fetch (with retry) → decode → extract → normalize,
//! falling back through alternate addresses until one yields a table.
//! Every failure is folded into the result's outcome tag; nothing here
//! returns an error to the caller.

use std::ops::RangeInclusive;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::CollectorConfig;
use crate::countries;
use crate::error::FetchError;
use crate::locator::{self, commodities};
use crate::schema::{AttemptDiagnostic, AttemptStatus, CollectionResult, ExtractedRow, Outcome};
use crate::source::http::HttpSource;
use crate::source::{AutoDecoder, DocumentSource, Page, PageDecoder};
use crate::table::{self, TableExtraction};
use crate::throttle::Throttle;

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub commodity: String,
    pub year: u16,
}

/// Cartesian product of commodities and an inclusive year range.
#[derive(Debug, Clone)]
pub struct CollectionPlan {
    pub commodities: Vec<String>,
    pub years: RangeInclusive<u16>,
}

impl CollectionPlan {
    pub fn new(commodities: Vec<String>, start: u16, end: u16) -> Self {
        Self {
            commodities,
            years: Self::years(start, end),
        }
    }

    /// Inclusive range, accepting the bounds in either order.
    pub fn years(start: u16, end: u16) -> RangeInclusive<u16> {
        start.min(end)..=start.max(end)
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.commodities
            .iter()
            .flat_map(|commodity| {
                self.years.clone().map(move |year| Job {
                    commodity: commodity.clone(),
                    year,
                })
            })
            .collect()
    }
}

/// Hex sha256 of fetched document bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Extract the table and replace each raw label with its canonical name.
pub fn extract_normalized(
    pages: &[Page],
    commodity: &str,
    year: u16,
    source_address: &str,
) -> TableExtraction {
    let mut extraction = table::extract(pages, commodity, year, source_address);
    normalize_rows(&mut extraction.rows);
    extraction
}

fn normalize_rows(rows: &mut [ExtractedRow]) {
    for row in rows {
        row.country = countries::normalize(&row.country_raw);
    }
}

#[derive(Clone)]
pub struct Collector {
    source: Arc<dyn DocumentSource>,
    decoder: Arc<dyn PageDecoder>,
    throttle: Arc<Throttle>,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        decoder: Arc<dyn PageDecoder>,
        config: CollectorConfig,
    ) -> Self {
        let throttle = Arc::new(Throttle::new(config.min_request_interval()));
        Self {
            source,
            decoder,
            throttle,
            config,
        }
    }

    /// Collector over HTTP with format sniffing.
    pub fn http(config: CollectorConfig) -> Result<Self, FetchError> {
        let source = HttpSource::new(config.fetch_timeout(), &config.user_agent)?;
        Ok(Self::new(Arc::new(source), Arc::new(AutoDecoder), config))
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Run the full pipeline for one `(commodity, year)`.
    pub async fn collect(&self, commodity: &str, year: u16) -> CollectionResult {
        let commodity = commodities::canonical_id(commodity);
        let mut result = CollectionResult {
            commodity: commodity.clone(),
            year,
            outcome: Outcome::NotResolvable,
            reason: None,
            rows: Vec::new(),
            attempts: Vec::new(),
        };

        let located = match locator::resolve(&commodity, year) {
            Ok(located) => located,
            Err(reason) => {
                info!("Skipping {} {}: {}", commodity, year, reason);
                result.reason = Some(reason.to_string());
                return result;
            }
        };

        for (index, address) in located.candidates().enumerate() {
            if index > 0 {
                info!(
                    "Falling back to alternate {} for {} {}: {}",
                    index, commodity, year, address
                );
            }

            let (diagnostic, extraction) = self.try_address(&commodity, year, address).await;
            result.attempts.push(diagnostic);

            let Some(extraction) = extraction else {
                continue;
            };
            result.outcome = if extraction.rows.is_empty() {
                Outcome::ResolvedButZeroValidRows
            } else {
                Outcome::ResolvedAndParsed
            };
            result.rows = extraction.rows;
            info!(
                "{} {}: {} ({} rows)",
                commodity,
                year,
                result.outcome,
                result.rows.len()
            );
            return result;
        }

        warn!(
            "{} {}: no table found in {} candidate addresses",
            commodity,
            year,
            result.attempts.len()
        );
        result.outcome = Outcome::ResolvedButNoTableFound;
        result.reason = Some(format!(
            "all {} candidate addresses exhausted",
            result.attempts.len()
        ));
        result
    }

    /// Fetch, decode and extract one address. Returns the extraction only
    /// when a table header was found.
    async fn try_address(
        &self,
        commodity: &str,
        year: u16,
        address: &str,
    ) -> (AttemptDiagnostic, Option<TableExtraction>) {
        let mut diagnostic = AttemptDiagnostic::new(address);

        let (fetched, attempts) = self.fetch_with_retry(address).await;
        diagnostic.fetch_attempts = attempts;
        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Fetch failed for {}: {}", address, e);
                diagnostic.status = AttemptStatus::FetchFailed {
                    error: e.to_string(),
                };
                return (diagnostic, None);
            }
        };
        diagnostic.content_sha256 = Some(content_hash(&bytes));

        let pages = match self.decoder.decode(&bytes) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Decode failed for {}: {}", address, e);
                diagnostic.status = AttemptStatus::DecodeFailed {
                    error: e.to_string(),
                };
                return (diagnostic, None);
            }
        };

        let extraction = extract_normalized(&pages, commodity, year, address);
        diagnostic.header_line = extraction.header_line().map(|l| l.trim().to_string());
        diagnostic.multiplier = Some(extraction.multiplier());
        diagnostic.layout_verified = Some(extraction.layout_verified);
        diagnostic.rows_accepted = extraction.rows.len();
        diagnostic.rows_rejected = extraction.rejected;

        if !extraction.matched {
            diagnostic.status = AttemptStatus::NoTableFound;
            return (diagnostic, None);
        }
        diagnostic.status = AttemptStatus::Parsed;
        (diagnostic, Some(extraction))
    }

    /// Only transient failures are retried, with exponential backoff. Every
    /// attempt waits for the shared throttle first.
    async fn fetch_with_retry(&self, address: &str) -> (Result<Vec<u8>, FetchError>, u32) {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            self.throttle.wait().await;
            attempt += 1;
            match self.source.fetch(address).await {
                Ok(bytes) => return (Ok(bytes), attempt),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let backoff = self.config.backoff(attempt - 1);
                    warn!(
                        "Transient failure on {} (attempt {}/{}), backing off {:.1}s: {}",
                        address,
                        attempt,
                        max_attempts,
                        backoff.as_secs_f64(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }

    /// Run every job on a bounded worker pool sharing one throttle.
    /// Results come back sorted by `(commodity, year)`.
    pub async fn collect_all(&self, jobs: Vec<Job>) -> Vec<CollectionResult> {
        let total = jobs.len();
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();

        for job in jobs {
            let collector = self.clone();
            let sem = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                collector.collect(&job.commodity, job.year).await
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!("Collection task failed: {}", e),
            }
        }

        results.sort_by(|a, b| (&a.commodity, a.year).cmp(&(&b.commodity, b.year)));
        info!("Collected {}/{} jobs", results.len(), total);
        results
    }
}
