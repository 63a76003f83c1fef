//! Record types produced by the extraction pipeline.
//!
//! Everything here is plain data with serde derives so runs can be written
//! out as JSON or CSV without any conversion layer.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub const UNIT_METRIC_TONS: &str = "metric tons";

/// ISO8601 UTC timestamp for the current time.
pub fn now_iso8601() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_iso8601(secs)
}

fn format_iso8601(secs: u64) -> String {
    let time_of_day = secs % 86_400;
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        time_of_day / 3600,
        (time_of_day % 3600) / 60,
        time_of_day % 60
    )
}

// Days since 1970-01-01 to (year, month, day), proleptic Gregorian.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Primary address plus ordered fallbacks for one `(commodity, year)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorResult {
    pub primary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<String>,
}

impl LocatorResult {
    pub fn new(primary: String, alternates: Vec<String>) -> Self {
        Self {
            primary,
            alternates,
        }
    }

    /// Primary first, then alternates in order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.alternates.iter().map(String::as_str))
    }
}

/// One country row of a production/reserves table.
///
/// Volumes are the numbers as printed; multiply by `multiplier` to get
/// metric tons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRow {
    pub commodity: String,
    /// Canonical name after normalization. Equal to `country_raw` until the
    /// normalizer has run.
    pub country: String,
    pub country_raw: String,
    pub year: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserves_volume: Option<f64>,
    pub unit: String,
    pub multiplier: u64,
    pub source_address: String,
}

/// Per `(commodity, year)` result tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    ResolvedAndParsed,
    ResolvedButNoTableFound,
    ResolvedButZeroValidRows,
    NotResolvable,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::ResolvedAndParsed => "resolved-and-parsed",
            Outcome::ResolvedButNoTableFound => "resolved-but-no-table-found",
            Outcome::ResolvedButZeroValidRows => "resolved-but-zero-valid-rows",
            Outcome::NotResolvable => "not-resolvable",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// What happened to a single candidate address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptStatus {
    FetchFailed { error: String },
    DecodeFailed { error: String },
    NoTableFound,
    Parsed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptDiagnostic {
    pub address: String,
    pub fetch_attempts: u32,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_verified: Option<bool>,
    pub rows_accepted: usize,
    pub rows_rejected: usize,
}

impl AttemptDiagnostic {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            fetch_attempts: 0,
            status: AttemptStatus::NoTableFound,
            content_sha256: None,
            header_line: None,
            multiplier: None,
            layout_verified: None,
            rows_accepted: 0,
            rows_rejected: 0,
        }
    }
}

/// Everything the pipeline learned about one `(commodity, year)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResult {
    pub commodity: String,
    pub year: u16,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub rows: Vec<ExtractedRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<AttemptDiagnostic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub resolved_and_parsed: usize,
    pub resolved_but_no_table_found: usize,
    pub resolved_but_zero_valid_rows: usize,
    pub not_resolvable: usize,
    pub total_rows: usize,
}

impl ReportSummary {
    pub fn from_results(results: &[CollectionResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.outcome {
                Outcome::ResolvedAndParsed => summary.resolved_and_parsed += 1,
                Outcome::ResolvedButNoTableFound => summary.resolved_but_no_table_found += 1,
                Outcome::ResolvedButZeroValidRows => summary.resolved_but_zero_valid_rows += 1,
                Outcome::NotResolvable => summary.not_resolvable += 1,
            }
            summary.total_rows += result.rows.len();
        }
        summary
    }
}

/// A whole collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub id: String,
    pub started_at: String,
    pub finished_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractor_version: Option<String>,
    pub summary: ReportSummary,
    pub results: Vec<CollectionResult>,
}

impl CollectionReport {
    pub fn new(started_at: String, results: Vec<CollectionResult>) -> Self {
        Self {
            id: format!("run_{}", Uuid::new_v4().simple()),
            started_at,
            finished_at: now_iso8601(),
            extractor_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            summary: ReportSummary::from_results(&results),
            results,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &ExtractedRow> {
        self.results.iter().flat_map(|r| r.rows.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_iso8601() {
        assert_eq!(format_iso8601(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_iso8601(951_782_400), "2000-02-29T00:00:00Z");
        assert_eq!(format_iso8601(1_700_000_000), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_outcome_serializes_as_tag() {
        let json = serde_json::to_string(&Outcome::ResolvedButZeroValidRows).unwrap();
        assert_eq!(json, "\"resolved-but-zero-valid-rows\"");
        assert_eq!(Outcome::NotResolvable.to_string(), "not-resolvable");
    }

    #[test]
    fn test_candidates_order() {
        let result = LocatorResult::new("a".into(), vec!["b".into(), "c".into()]);
        assert_eq!(result.candidates().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_summary_counts() {
        let result = |outcome| CollectionResult {
            commodity: "tin".into(),
            year: 2000,
            outcome,
            reason: None,
            rows: Vec::new(),
            attempts: Vec::new(),
        };
        let report = CollectionReport::new(
            now_iso8601(),
            vec![
                result(Outcome::NotResolvable),
                result(Outcome::NotResolvable),
                result(Outcome::ResolvedButNoTableFound),
            ],
        );
        assert!(report.id.starts_with("run_"));
        assert_eq!(report.summary.not_resolvable, 2);
        assert_eq!(report.summary.resolved_but_no_table_found, 1);
        assert_eq!(report.summary.total_rows, 0);
    }
}
