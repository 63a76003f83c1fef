//! Country label normalization.
//!
//! Labels coming out of the table extractor carry layout damage: stray
//! parentheses, percentages, footnote prose, estimate markers eaten into the
//! name. `normalize` first strips structure until nothing changes, then
//! applies a single exact-match correction.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::TableError;

const MAX_LABEL_CHARS: usize = 50;

static RE_EMPTY_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*\(\s*\))+\s*$").unwrap());
static RE_LEADING_EDGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\s()]+").unwrap());
static RE_PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d.,]*%").unwrap());
static RE_TRAILING_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[—–-]+$").unwrap());
static RE_TRAILING_NA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+NA$").unwrap());

// Keys are already structurally clean; values never appear as keys.
static CORRECTIONS: &[(&str, &str)] = &[
    // Truncated by the estimate-marker strip or by line wrapping.
    ("Chil", "Chile"),
    ("Franc", "France"),
    ("Greec", "Greece"),
    ("Mozambiqu", "Mozambique"),
    ("Sierra Leon", "Sierra Leone"),
    ("Zair", "Zaire"),
    ("Zimbabw", "Zimbabwe"),
    ("Ukrain", "Ukraine"),
    ("Singapor", "Singapore"),
    ("Surinam", "Suriname"),
    ("Côte d’Ivoir", "Ivory Coast"),
    ("Cote d'Ivoir", "Ivory Coast"),
    ("Other countrie", "Other"),
    ("Congo (Kinshasa", "Congo (Kinshasa)"),
    ("Argentinae", "Argentina"),
    ("Azerbaijane", "Azerbaijan"),
    ("Namibiae", "Namibia"),
    ("Russiae", "Russia"),

    // Footnote or prose text glued onto the country cell.
    ("Australia not available Th", "Australia"),
    ("Canada not available Th", "Canada"),
    ("China (andalusite", "China"),
    ("China China Kyrgyzstan and Peru ar", "China"),
    ("China Larg", "China"),
    ("China Zinc chapter for zinc reserves", "China"),
    ("China and Peru", "China"),
    ("China germanium", "China"),
    ("China ores ar", "China"),
    ("Germany Zinc chapter for zinc reserves", "Germany"),
    ("Germany compounds", "Germany"),
    ("Germany countries:", "Germany"),
    ("Germany country to which th", "Germany"),
    ("Germany produced sulfur production may not b", "Germany"),
    ("India (kyanit", "India"),
    ("India Larg", "India"),
    ("India Moderat", "India"),
    ("India attributed For instanc", "India"),
    ("India country for which th", "India"),
    ("India country to which th", "India"),
    ("India of aluminosilicates", "India"),
    ("India processed long distances from wher", "India"),
    ("India reserves wer", "India"),
    ("India wher", "India"),
    ("Iran Arabian oil may b", "Iran"),
    ("Iran attributed For instanc", "Iran"),
    ("Iran may not b", "Iran"),
    ("Iran sulfur from Saudi Arabian oil may b", "Iran"),
    ("Iran they ar", "Iran"),
    ("Italy Arabian oil may b", "Italy"),
    ("Italy Reserves", "Italy"),
    ("Italy Reserves and reserv", "Italy"),
    ("Italy may not b", "Italy"),
    ("Japan about", "Japan"),
    ("Japan countries:", "Japan"),
    ("Japan producing countries but data", "Japan"),
    ("Japan production", "Japan"),
    ("Japan recovered at refineries in th", "Japan"),
    ("Japan reserves wer", "Japan"),
    ("Japan wher", "Japan"),
    ("Jordan NA Larg", "Jordan"),
    ("Kazakhstan concentrat", "Kazakhstan"),
    ("Kazakhstan for zinc reserves", "Kazakhstan"),
    ("Kazakhstan long distances from wher", "Kazakhstan"),
    ("Kazakhstan may not b", "Kazakhstan"),
    ("Kazakhstan production", "Kazakhstan"),
    ("Kazakhstan sulfur from Saudi Arabian oil may b", "Kazakhstan"),
    ("Kazakhstan unspecified", "Kazakhstan"),
    ("Kyrgyzstan China Kyrgyzstan and Peru", "Kyrgyzstan"),
    ("Kyrgyzstan China Kyrgyzstan and Peru ar", "Kyrgyzstan"),
    ("Mexico (exports", "Mexico"),
    ("Mexico (net exports", "Mexico"),
    ("Mexico (net exports hav", "Mexico"),
    ("Mexico (net exports reserves", "Mexico"),
    ("Mexico attributed For instanc", "Mexico"),
    ("Mexico for most ar", "Mexico"),
    ("Mexico producing countries", "Mexico"),
    ("Netherlands Arabian oil may b", "Netherlands"),
    ("Peru (andalusite", "Peru"),
    ("Peru (exports reserves", "Peru"),
    ("Peru crud", "Peru"),
    ("Poland data ar", "Poland"),
    ("Poland recovered at refineries in th", "Poland"),
    ("Qatar Larg", "Qatar"),
    ("Russia Moderat", "Russia"),
    ("Russia datolit", "Russia"),
    ("Russia ores ar", "Russia"),
    ("South Africa (andalusite", "South Africa"),
    ("South Africa sillimanite", "South Africa"),
    ("Spain (includes pegmatites", "Spain"),
    ("Turkey concentrat", "Turkey"),
    ("Turkey refined borates", "Turkey"),
    ("United States (from Cliffsid", "United States"),
    ("United States (kyanite Larg", "United States"),
    ("United States Previously published", "United States"),
    ("United States Reserves of sulfur in crud", "United States"),
    ("United States Significant in th", "United States"),
    ("Brazil Moderat", "Brazil"),
    ("Brazil demand", "Brazil"),
    ("Canada countries", "Canada"),
    ("Canada processing", "Canada"),
    ("Canada production is a result of th", "Canada"),
    ("Finland foreseeabl", "Finland"),
    ("Finland long distances from wher", "Finland"),
    ("Israel NA Larg", "Israel"),
    ("Kuwait country for which th", "Kuwait"),
    ("Kuwait sulfur from Saudi Arabian oil may b", "Kuwait"),
    ("Morocco production", "Morocco"),
    ("Norway reserves", "Norway"),
    ("approximately million tons to tons Finland is th", "Finland"),
    ("Brazil (crude", "Brazil"),
    ("Brazil (crude)", "Brazil"),
    ("Peru (export", "Peru"),

    // World total variants.
    ("World total (rounded *", "World"),
    ("World total (rounded Larg", "World"),
    ("World total (rounded XX XX XX", "World"),
    ("World total", "World"),
    ("World total (may be rounded", "World"),
    ("World total (may be rounded)", "World"),
    ("World total (rounded", "World"),
    ("World total (rounded)", "World"),
    ("World total World total", "World"),
    ("World total (rounded) Larg", "World"),

    // Other / rest-of-world variants.
    ("Other PGMs", "Other"),
    ("Other countries", "Other"),
    ("Other country", "Other"),
    ("Other nations", "Other"),
    ("Rest of world", "Other"),
    ("Others", "Other"),
    ("Remaining countries", "Other"),
    ("Various countries", "Other"),
    ("Several countries", "Other"),
    ("Rhodium", "Other"),
    ("Palladium", "Other"),
    ("Platinum", "Other"),

    // Alternative names.
    ("Burma", "Myanmar"),
    ("Côte d’Ivoire", "Ivory Coast"),
    ("Cote d'Ivoire", "Ivory Coast"),
    ("Czech Republic", "Czechia"),
    ("Korea Republic", "South Korea"),
    ("Korea Republic of", "South Korea"),
    ("Korea, Republic of", "South Korea"),
    ("Republic of Korea", "South Korea"),
    ("Korea North", "North Korea"),
    ("Korea, North", "North Korea"),
    ("UK", "United Kingdom"),
    ("US", "United States"),
    ("USA", "United States"),

    // Demonyms.
    ("Chilean", "Chile"),
    ("Australian", "Australia"),
    ("Canadian", "Canada"),
    ("Chinese", "China"),
    ("German", "Germany"),
    ("Indian", "India"),
    ("Japanese", "Japan"),
    ("Mexican", "Mexico"),
    ("Russian", "Russia"),
    ("American", "United States"),

    // Layout debris.
    ("=", "Unknown"),
    ("e", "Unknown"),
];

static CORRECTION_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| CORRECTIONS.iter().copied().collect());

fn is_numeric_token(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

// Empty groups, dangling `(` and a `)` with no opening partner. A closed
// group such as "Congo (Brazzaville)" is kept.
fn strip_trailing_parens(label: &str) -> &str {
    let mut s = label.trim_end();
    loop {
        let before = s.len();
        if let Some(m) = RE_EMPTY_GROUPS.find(s) {
            s = s[..m.start()].trim_end();
        }
        s = s.trim_end_matches(|c: char| c == '(' || c.is_whitespace());
        if s.ends_with(')') && s.matches('(').count() < s.matches(')').count() {
            s = s[..s.len() - 1].trim_end();
        }
        if s.len() == before {
            return s;
        }
    }
}

fn cleanup_pass(label: &str) -> String {
    let s = strip_trailing_parens(label.trim());
    let s = RE_LEADING_EDGE.replace(&s, "");
    let s = RE_PERCENT.replace_all(&s, "");
    let s = s
        .split_whitespace()
        .filter(|token| !is_numeric_token(token))
        .collect::<Vec<_>>()
        .join(" ");
    let s = RE_TRAILING_DASH.replace(&s, "");
    let s = RE_TRAILING_NA.replace(&s, "");
    s.chars()
        .take(MAX_LABEL_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Structural cleanup, repeated until the label stops changing.
pub fn clean_structure(label: &str) -> String {
    let mut current = label.to_string();
    loop {
        let next = cleanup_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Exact-match correction for an already cleaned label.
pub fn correction(cleaned: &str) -> Option<&'static str> {
    CORRECTION_MAP.get(cleaned).copied()
}

pub fn correction_count() -> usize {
    CORRECTIONS.len()
}

/// Canonical country name for a raw extracted label. Idempotent.
pub fn normalize(raw: &str) -> String {
    let cleaned = clean_structure(raw);
    match correction(&cleaned) {
        Some(canonical) => canonical.to_string(),
        None => cleaned,
    }
}

/// Keys must survive cleanup unchanged, and every value must normalize to
/// itself in one lookup.
pub fn validate() -> Result<(), TableError> {
    let mut seen = HashSet::new();
    for (key, value) in CORRECTIONS {
        if !seen.insert(*key) {
            return Err(TableError::Duplicate(key.to_string()));
        }
        if clean_structure(key) != *key {
            return Err(TableError::UnreachableCorrection(key.to_string()));
        }
        if key == value || normalize(value) != *value {
            return Err(TableError::ChainedCorrection {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_consistent() {
        assert_eq!(validate(), Ok(()));
    }

    #[test]
    fn test_estimate_marker_fixes() {
        assert_eq!(normalize("Franc"), "France");
        assert_eq!(normalize("Mozambiqu"), "Mozambique");
        assert_eq!(normalize("Cote d'Ivoir"), "Ivory Coast");
        assert_eq!(normalize("Russiae"), "Russia");
    }

    #[test]
    fn test_structural_cleanup() {
        assert_eq!(normalize("Germany   () ()"), "Germany");
        assert_eq!(normalize("India . . ()"), "India");
        assert_eq!(normalize("Austria —  ()"), "Austria");
        assert_eq!(normalize("Iran NA NA"), "Iran");
        assert_eq!(normalize("  (Peru)  "), "Peru");
        assert_eq!(normalize("Japan about 45%"), "Japan");
    }

    #[test]
    fn test_consolidation() {
        assert_eq!(normalize("World total (may be rounded)"), "World");
        assert_eq!(normalize("World total (rounded)"), "World");
        assert_eq!(normalize("World total"), "World");
        assert_eq!(normalize("Other countries   NA"), "Other");
        assert_eq!(normalize("Other countries"), "Other");
        assert_eq!(normalize("Palladium"), "Other");
    }

    #[test]
    fn test_parenthesized_value_survives() {
        assert_eq!(normalize("Congo (Kinshasa)"), "Congo (Kinshasa)");
        assert_eq!(normalize("Congo (Kinshasa"), "Congo (Kinshasa)");
        assert_eq!(normalize("Congo (Brazzaville)"), "Congo (Brazzaville)");
        assert_eq!(normalize("Burma (Myanmar)"), "Burma (Myanmar)");
        assert_eq!(normalize("Burma (Myanmar)  ()"), "Burma (Myanmar)");
        assert_eq!(normalize("Brazil (crude)"), "Brazil");
    }

    #[test]
    fn test_unbalanced_parens_are_stripped() {
        assert_eq!(clean_structure("Canada   () ()"), "Canada");
        assert_eq!(clean_structure("Italy ( ( ( ("), "Italy");
        assert_eq!(clean_structure("Peru)"), "Peru");
        assert_eq!(clean_structure("Chile (Atacama) )"), "Chile (Atacama)");
    }

    #[test]
    fn test_unknown_labels_pass_through() {
        assert_eq!(normalize("Peru"), "Peru");
        assert_eq!(normalize("Papua New Guinea"), "Papua New Guinea");
        assert_eq!(normalize("Korea, Republic of"), "South Korea");
    }

    #[test]
    fn test_truncates_long_labels() {
        let long = "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do";
        let cleaned = normalize(long);
        assert!(cleaned.chars().count() <= MAX_LABEL_CHARS);
        assert!(long.starts_with(&cleaned));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut samples: Vec<&str> = vec![
            "Germany ( ( ( (",
            "World total (rounded)   Larg",
            "Osmium    () —",
            ".. .% .% .% %.",
            "Côte d’Ivoire",
            "  Chinae  ",
            "",
        ];
        for (key, value) in CORRECTIONS {
            samples.push(*key);
            samples.push(*value);
        }
        for raw in samples {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", raw);
        }
    }
}
