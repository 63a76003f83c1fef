//! JSON and CSV writers for collection runs.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::schema::{CollectionReport, ExtractedRow};

/// Flat CSV record. Every column is always present so rows line up.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    commodity: &'a str,
    year: u16,
    country: &'a str,
    country_raw: &'a str,
    production_volume: Option<f64>,
    reserves_volume: Option<f64>,
    unit: &'a str,
    multiplier: u64,
    source_address: &'a str,
}

impl<'a> From<&'a ExtractedRow> for CsvRow<'a> {
    fn from(row: &'a ExtractedRow) -> Self {
        Self {
            commodity: &row.commodity,
            year: row.year,
            country: &row.country,
            country_raw: &row.country_raw,
            production_volume: row.production_volume,
            reserves_volume: row.reserves_volume,
            unit: &row.unit,
            multiplier: row.multiplier,
            source_address: &row.source_address,
        }
    }
}

pub fn write_json<W: Write>(report: &CollectionReport, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, report).context("Failed to serialize report")?;
    Ok(())
}

pub fn write_rows_csv<'a, W, I>(rows: I, writer: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a ExtractedRow>,
{
    let mut csv = csv::Writer::from_writer(writer);
    let mut written = 0;
    for row in rows {
        csv.serialize(CsvRow::from(row))
            .context("Failed to write CSV row")?;
        written += 1;
    }
    csv.flush().context("Failed to flush CSV")?;
    Ok(written)
}

pub fn write_json_file(report: &CollectionReport, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    write_json(report, &mut writer)?;
    writer.flush().with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

pub fn read_json<R: Read>(reader: R) -> Result<CollectionReport> {
    serde_json::from_reader(reader).context("Failed to parse report")
}

pub fn read_json_file(path: &Path) -> Result<CollectionReport> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    read_json(BufReader::new(file)).with_context(|| format!("Failed to read {:?}", path))
}

pub fn write_rows_csv_file(report: &CollectionReport, path: &Path) -> Result<usize> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_rows_csv(report.rows(), BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{now_iso8601, CollectionResult, Outcome};

    fn row(country: &str, reserves: Option<f64>) -> ExtractedRow {
        ExtractedRow {
            commodity: "barite".into(),
            country: country.into(),
            country_raw: country.into(),
            year: 1997,
            production_volume: Some(640.0),
            reserves_volume: reserves,
            unit: "metric tons".into(),
            multiplier: 1000,
            source_address: "mem://barite".into(),
        }
    }

    fn report() -> CollectionReport {
        CollectionReport::new(
            now_iso8601(),
            vec![CollectionResult {
                commodity: "barite".into(),
                year: 1997,
                outcome: Outcome::ResolvedAndParsed,
                reason: None,
                rows: vec![row("United States", Some(60_000.0)), row("Iran", None)],
                attempts: Vec::new(),
            }],
        )
    }

    #[test]
    fn test_csv_has_fixed_columns() {
        let report = report();
        let mut out = Vec::new();
        let written = write_rows_csv(report.rows(), &mut out).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "commodity,year,country,country_raw,production_volume,reserves_volume,unit,multiplier,source_address"
        );
        assert_eq!(lines[2], "barite,1997,Iran,Iran,640.0,,metric tons,1000,mem://barite");
    }

    #[test]
    fn test_json_round_trips_summary() {
        let report = report();
        let mut out = Vec::new();
        write_json(&report, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["summary"]["resolved_and_parsed"], 1);
        assert_eq!(value["summary"]["total_rows"], 2);
        assert_eq!(value["results"][0]["outcome"], "resolved-and-parsed");
    }

    #[test]
    fn test_json_reads_back() {
        let report = report();
        let mut out = Vec::new();
        write_json(&report, &mut out).unwrap();
        let loaded = read_json(out.as_slice()).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.rows().count(), 2);
        assert_eq!(loaded.results[0].rows[1].reserves_volume, None);

        assert!(read_json(&b"{\"id\": 1}"[..]).is_err());
    }
}
