//! Maintenance passes over a saved collection report.
//!
//! `clean_report` re-runs the country normalizer on every row, so a report
//! written before a correction-table change can be brought up to date.
//! `analyze` summarizes the labels and the years that produced no rows,
//! which is what the correction table gets curated from.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::{debug, info};

use crate::countries;
use crate::locator::epochs;
use crate::schema::CollectionReport;

/// Labels at least this long are assumed to be prose, not damaged names.
const SUSPICIOUS_MAX_CHARS: usize = 15;
const SUSPICIOUS_CHARS: &[char] = &['(', ':', ';', '%'];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    pub records: usize,
    pub corrections: usize,
}

/// Re-normalize `country` from `country_raw` on every row. Returns how many
/// rows changed.
pub fn clean_report(report: &mut CollectionReport) -> CleanSummary {
    let mut summary = CleanSummary::default();
    for result in &mut report.results {
        for row in &mut result.rows {
            summary.records += 1;
            let cleaned = countries::normalize(&row.country_raw);
            if cleaned != row.country {
                debug!("{} {}: {:?} -> {:?}", row.commodity, row.year, row.country, cleaned);
                row.country = cleaned;
                summary.corrections += 1;
            }
        }
    }
    info!(
        "Cleaned {} records, {} corrections",
        summary.records, summary.corrections
    );
    summary
}

/// Which label of each row to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelField {
    Country,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelAnalysis {
    pub total_labels: usize,
    pub unique_labels: usize,
    /// Most frequent first; ties by label.
    pub frequencies: Vec<LabelCount>,
    /// Short labels carrying `(`, `:`, `;` or `%`, sorted.
    pub suspicious: Vec<String>,
    /// Years of the archive with no rows, per commodity in the report.
    pub missing_years: BTreeMap<String, Vec<u16>>,
}

/// Publication years covered by any naming epoch.
pub fn archive_years() -> RangeInclusive<u16> {
    let start = epochs::EPOCHS.iter().map(|e| *e.years.start()).min().unwrap_or(0);
    let end = epochs::EPOCHS.iter().map(|e| *e.years.end()).max().unwrap_or(0);
    start..=end
}

fn is_suspicious(label: &str) -> bool {
    label.chars().count() < SUSPICIOUS_MAX_CHARS && label.contains(SUSPICIOUS_CHARS)
}

pub fn analyze(report: &CollectionReport, field: LabelField) -> LabelAnalysis {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total_labels = 0;
    for row in report.rows() {
        let label = match field {
            LabelField::Country => row.country.as_str(),
            LabelField::Raw => row.country_raw.as_str(),
        };
        *counts.entry(label).or_default() += 1;
        total_labels += 1;
    }

    let mut frequencies: Vec<LabelCount> = counts
        .iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count: *count,
        })
        .collect();
    frequencies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

    let mut suspicious: Vec<String> = counts
        .keys()
        .filter(|label| is_suspicious(label))
        .map(|label| label.to_string())
        .collect();
    suspicious.sort();

    LabelAnalysis {
        total_labels,
        unique_labels: counts.len(),
        frequencies,
        suspicious,
        missing_years: missing_years(report),
    }
}

/// Archive years with no accepted rows, for every commodity the report
/// mentions. Commodities with full coverage are left out.
pub fn missing_years(report: &CollectionReport) -> BTreeMap<String, Vec<u16>> {
    let mut present: BTreeMap<&str, BTreeSet<u16>> = BTreeMap::new();
    for result in &report.results {
        let years = present.entry(result.commodity.as_str()).or_default();
        if !result.rows.is_empty() {
            years.insert(result.year);
        }
    }

    present
        .into_iter()
        .filter_map(|(commodity, years)| {
            let missing: Vec<u16> = archive_years().filter(|y| !years.contains(y)).collect();
            (!missing.is_empty()).then(|| (commodity.to_string(), missing))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{now_iso8601, CollectionResult, ExtractedRow, Outcome, UNIT_METRIC_TONS};

    fn row(commodity: &str, year: u16, country: &str, raw: &str) -> ExtractedRow {
        ExtractedRow {
            commodity: commodity.to_string(),
            country: country.to_string(),
            country_raw: raw.to_string(),
            year,
            production_volume: Some(1.0),
            reserves_volume: None,
            unit: UNIT_METRIC_TONS.to_string(),
            multiplier: 1,
            source_address: "mem://doc".to_string(),
        }
    }

    fn result(commodity: &str, year: u16, rows: Vec<ExtractedRow>) -> CollectionResult {
        let outcome = if rows.is_empty() {
            Outcome::ResolvedButNoTableFound
        } else {
            Outcome::ResolvedAndParsed
        };
        CollectionResult {
            commodity: commodity.to_string(),
            year,
            outcome,
            reason: None,
            rows,
            attempts: Vec::new(),
        }
    }

    fn sample_report() -> CollectionReport {
        CollectionReport::new(
            now_iso8601(),
            vec![
                result(
                    "barite",
                    1997,
                    vec![
                        // Written by an older normalizer.
                        row("barite", 1997, "Franc", "Franc"),
                        row("barite", 1997, "Congo (Brazzaville", "Congo (Brazzaville)"),
                        row("barite", 1997, "China", "China"),
                    ],
                ),
                result(
                    "barite",
                    1998,
                    vec![
                        row("barite", 1998, "China", "China Larg"),
                        row("barite", 1998, "Peru (export", "Peru (export"),
                    ],
                ),
                result("barite", 1999, Vec::new()),
            ],
        )
    }

    #[test]
    fn test_clean_report_counts_changed_rows() {
        let mut report = sample_report();
        let summary = clean_report(&mut report);
        assert_eq!(summary, CleanSummary { records: 5, corrections: 3 });

        let countries: Vec<&str> = report.rows().map(|r| r.country.as_str()).collect();
        assert_eq!(
            countries,
            vec!["France", "Congo (Brazzaville)", "China", "China", "Peru"]
        );
        // A second pass finds nothing left to fix.
        assert_eq!(clean_report(&mut report).corrections, 0);
    }

    #[test]
    fn test_analyze_frequencies_and_suspicious() {
        let report = sample_report();
        let analysis = analyze(&report, LabelField::Country);
        assert_eq!(analysis.total_labels, 5);
        assert_eq!(analysis.unique_labels, 4);
        assert_eq!(
            analysis.frequencies[0],
            LabelCount {
                label: "China".to_string(),
                count: 2
            }
        );
        assert_eq!(analysis.frequencies[1].label, "Congo (Brazzaville");
        // "Congo (Brazzaville" is 18 chars, too long to flag.
        assert_eq!(analysis.suspicious, vec!["Peru (export"]);

        let raw = analyze(&report, LabelField::Raw);
        assert_eq!(raw.unique_labels, 5);
        assert!(raw.frequencies.iter().all(|f| f.count == 1));
        assert!(raw.suspicious.contains(&"Peru (export".to_string()));
    }

    #[test]
    fn test_missing_years_per_commodity() {
        let report = sample_report();
        let missing = missing_years(&report);
        let barite = &missing["barite"];
        let years = archive_years();
        assert_eq!(barite.len(), years.clone().count() - 2);
        assert!(!barite.contains(&1997));
        assert!(!barite.contains(&1998));
        assert!(barite.contains(&1999));
        assert_eq!(barite.first(), Some(years.start()));
        assert_eq!(barite.last(), Some(years.end()));
    }

    #[test]
    fn test_archive_years_span_every_epoch() {
        assert_eq!(archive_years(), 1996..=2025);
    }

    #[test]
    fn test_is_suspicious() {
        assert!(is_suspicious("China (andal"));
        assert!(is_suspicious("Japan 45%"));
        assert!(is_suspicious("Germany:"));
        assert!(!is_suspicious("Congo (Kinshasa)"));
        assert!(!is_suspicious("Peru"));
    }
}
