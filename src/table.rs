//! Production/reserves table extraction from decoded page text.
//!
//! Pure functions, no async. Reads the unit preamble from the first page,
//! finds the first page carrying a known table header, then walks that page
//! line by line through a small state machine and parses candidate rows.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::schema::{ExtractedRow, UNIT_METRIC_TONS};
use crate::source::Page;

// ============================================================================
// Multiplier
// ============================================================================

static RE_SCALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(Data in\s+([A-Za-z]+)\s+(?:of\s+)?metric tons").unwrap()
});

static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());

/// Unit scale printed in the document preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    One,
    Thousand,
    Million,
    Billion,
    Trillion,
}

impl Scale {
    pub fn factor(self) -> u64 {
        match self {
            Scale::One => 1,
            Scale::Thousand => 1_000,
            Scale::Million => 1_000_000,
            Scale::Billion => 1_000_000_000,
            Scale::Trillion => 1_000_000_000_000,
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "thousand" | "thousands" => Some(Scale::Thousand),
            "million" | "millions" => Some(Scale::Million),
            "billion" | "billions" => Some(Scale::Billion),
            "trillion" | "trillions" => Some(Scale::Trillion),
            _ => None,
        }
    }
}

/// Infer the unit scale from a page's preamble. Defaults to one.
pub fn infer_scale(text: &str) -> Scale {
    if let Some(word) = RE_SCALE.captures(text).and_then(|c| c.get(1)) {
        if let Some(scale) = Scale::from_word(word.as_str()) {
            info!("Found multiplier: {} = {}", word.as_str(), scale.factor());
            return scale;
        }
        debug!("Unrecognized scale word '{}'", word.as_str());
    }
    if text.contains("(Data in metric tons") || text.contains("(Data in tons") {
        info!("Found multiplier: metric tons = 1");
        return Scale::One;
    }
    warn!("No multiplier found in preamble, defaulting to 1");
    Scale::One
}

// ============================================================================
// Header search
// ============================================================================

/// Header phrases in priority order.
pub const HEADER_PHRASES: &[&str] = &[
    "World Smelter Production and Capacity",
    "World Mine Production and Reserves",
    "World Production and Reserves",
    "Production Yearend capacity",
    "Refinery production",
    "Mine production",
    "World Production:",
    "Pig iron",
    "Steel production:",
];

/// Headers whose column layout has not been checked against the
/// production/reserves position rule.
const UNVERIFIED_HEADERS: &[&str] = &["World Production:", "Pig iron", "Steel production:"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    /// Index into the page slice.
    pub page_index: usize,
    pub page_num: u32,
    pub phrase: &'static str,
    pub line: String,
}

/// First page with any known header. Within that page the highest-priority
/// phrase wins and the first line containing it is the header line.
pub fn find_header(pages: &[Page]) -> Option<HeaderMatch> {
    for (page_index, page) in pages.iter().enumerate() {
        for &phrase in HEADER_PHRASES {
            if !page.text.contains(phrase) {
                continue;
            }
            if let Some(line) = page.text.lines().find(|l| l.contains(phrase)) {
                info!("Found table header '{}' on page {}", phrase, page.page_num);
                return Some(HeaderMatch {
                    page_index,
                    page_num: page.page_num,
                    phrase,
                    line: line.to_string(),
                });
            }
        }
    }
    None
}

/// Column layout implied by the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Two production years then reserves.
    SingleSection,
    /// Mine and refinery production side by side, reserves last.
    TwoSection,
}

impl Layout {
    pub fn from_header(line: &str) -> Self {
        if line.contains("Mine production") && line.contains("Refinery production") {
            Layout::TwoSection
        } else {
            Layout::SingleSection
        }
    }

    /// Values a row needs before its last value is read as reserves.
    pub fn reserves_threshold(self) -> usize {
        match self {
            Layout::SingleSection => 3,
            Layout::TwoSection => 5,
        }
    }
}

// ============================================================================
// Row collection state machine
// ============================================================================

const STOP_PHRASES: &[&str] = &["World Resources:", "Substitutes:", "Notes:", "Sources:"];
const MIN_LINE_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Searching,
    Collecting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Header,
    Blank,
    Stop,
    /// "World total" closes the table; "Other countries" does not.
    Aggregate { closes_table: bool },
    Candidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Skip,
    Parse,
}

pub fn classify_line(line: &str, header_line: &str) -> LineClass {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineClass::Blank;
    }
    if !header_line.is_empty() && line.contains(header_line) {
        return LineClass::Header;
    }
    if line.contains("World total") {
        return LineClass::Aggregate { closes_table: true };
    }
    if line.contains("Other countries") {
        return LineClass::Aggregate {
            closes_table: false,
        };
    }
    if STOP_PHRASES.iter().any(|p| line.contains(p)) || trimmed.chars().count() < MIN_LINE_LEN {
        return LineClass::Stop;
    }
    LineClass::Candidate
}

pub fn transition(state: ScanState, class: LineClass) -> (ScanState, Action) {
    use Action::*;
    use LineClass::*;
    use ScanState::*;

    match (state, class) {
        (Searching, Header) => (Collecting, Skip),
        (Searching, _) => (Searching, Skip),
        (Collecting, Header | Blank) => (Collecting, Skip),
        (Collecting, Stop) => (Done, Skip),
        (Collecting, Aggregate { closes_table: true }) => (Done, Parse),
        (Collecting, Aggregate { closes_table: false } | Candidate) => (Collecting, Parse),
        (Done, _) => (Done, Skip),
    }
}

/// Lines the state machine hands to the row parser, in page order.
pub fn candidate_lines<'a>(text: &'a str, header_line: &str) -> Vec<&'a str> {
    let mut state = ScanState::Searching;
    let mut out = Vec::new();
    for line in text.lines() {
        let class = classify_line(line, header_line);
        let (next, action) = transition(state, class);
        if next == ScanState::Done && state == ScanState::Collecting {
            debug!("Stopping collection at: {}", line.trim());
        }
        if action == Action::Parse {
            out.push(line);
        }
        state = next;
        if state == ScanState::Done {
            break;
        }
    }
    out
}

// ============================================================================
// Row parsing
// ============================================================================

/// Labels that survive number stripping but are column headings.
const LABEL_DENYLIST: &[&str] = &[
    "Country",
    "World",
    "Production",
    "Yearend",
    "Mine production Reserves",
    "Refinery production Reserves",
];

/// Country names that legitimately end in the estimate marker.
const TRAILING_E_EXEMPT: &[&str] = &["Chile"];

/// Parse a numeric token. Placeholder markers yield `None`.
pub fn clean_number(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() || token == "-" || token == "NA" {
        return None;
    }
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRejection {
    TooFewValues,
    EmptyLabel,
    Denylisted,
}

/// Label and values parsed from one line, before layout is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub label: String,
    pub values: Vec<f64>,
}

pub fn parse_line(line: &str) -> Result<ParsedLine, RowRejection> {
    let trimmed = line.trim();
    let values: Vec<f64> = RE_NUMBER
        .find_iter(trimmed)
        .filter_map(|m| clean_number(m.as_str()))
        .collect();

    let stripped = RE_NUMBER.replace_all(trimmed, "");
    let mut label = stripped.trim();
    if label.ends_with('e') && !TRAILING_E_EXEMPT.contains(&label) {
        label = label[..label.len() - 1].trim_end();
    }

    if values.len() < 2 {
        return Err(RowRejection::TooFewValues);
    }
    if label.is_empty() {
        return Err(RowRejection::EmptyLabel);
    }
    if LABEL_DENYLIST.contains(&label) {
        return Err(RowRejection::Denylisted);
    }
    Ok(ParsedLine {
        label: label.to_string(),
        values,
    })
}

// ============================================================================
// Extraction
// ============================================================================

/// Result of running the extractor over one document.
#[derive(Debug, Clone)]
pub struct TableExtraction {
    pub rows: Vec<ExtractedRow>,
    /// A known header was found.
    pub matched: bool,
    pub header: Option<HeaderMatch>,
    pub scale: Scale,
    pub layout: Layout,
    /// False for headers whose column positions have not been checked.
    pub layout_verified: bool,
    pub rejected: usize,
}

impl TableExtraction {
    pub fn multiplier(&self) -> u64 {
        self.scale.factor()
    }

    pub fn header_line(&self) -> Option<&str> {
        self.header.as_ref().map(|h| h.line.as_str())
    }
}

/// Locate and parse the production/reserves table in `pages`.
pub fn extract(
    pages: &[Page],
    commodity: &str,
    year: u16,
    source_address: &str,
) -> TableExtraction {
    let scale = pages
        .first()
        .map(|p| infer_scale(&p.text))
        .unwrap_or(Scale::One);

    let Some(header) = find_header(pages) else {
        info!("No table header found for {} {}", commodity, year);
        return TableExtraction {
            rows: Vec::new(),
            matched: false,
            header: None,
            scale,
            layout: Layout::SingleSection,
            layout_verified: true,
            rejected: 0,
        };
    };

    let layout = Layout::from_header(&header.line);
    let layout_verified = !UNVERIFIED_HEADERS.contains(&header.phrase);
    if !layout_verified {
        warn!(
            "Header '{}' for {} {} uses an unverified column layout; check rows by hand",
            header.phrase, commodity, year
        );
    }

    let mut rows = Vec::new();
    let mut rejected = 0;
    for line in candidate_lines(&pages[header.page_index].text, &header.line) {
        match parse_line(line) {
            Ok(parsed) => {
                let production_volume = parsed.values.get(1).copied();
                let reserves_volume = if parsed.values.len() >= layout.reserves_threshold() {
                    parsed.values.last().copied()
                } else {
                    None
                };
                debug!(
                    "Accepted row '{}': production={:?} reserves={:?}",
                    parsed.label, production_volume, reserves_volume
                );
                rows.push(ExtractedRow {
                    commodity: commodity.to_string(),
                    country: parsed.label.clone(),
                    country_raw: parsed.label,
                    year,
                    production_volume,
                    reserves_volume,
                    unit: UNIT_METRIC_TONS.to_string(),
                    multiplier: scale.factor(),
                    source_address: source_address.to_string(),
                });
            }
            Err(reason) => {
                debug!("Rejected line {:?}: {:?}", line.trim(), reason);
                rejected += 1;
            }
        }
    }

    info!(
        "Extracted {} rows ({} rejected) for {} {} from header '{}'",
        rows.len(),
        rejected,
        commodity,
        year,
        header.line.trim()
    );

    TableExtraction {
        rows,
        matched: true,
        header: Some(header),
        scale,
        layout,
        layout_verified,
        rejected,
    }
}
