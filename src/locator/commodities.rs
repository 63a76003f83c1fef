//! Commodity identifiers and the era-specific short forms used in document names.

use std::collections::HashSet;

use crate::error::TableError;

/// Two-digit codes used in the 1997-2003 file names (`{code}03{yy}.pdf`).
///
/// Several codes repeat across unrelated commodities; that is how the
/// archive was published and the locator does not try to disambiguate.
static CODES_1997_2003: &[(&str, &str)] = &[
    ("aluminum", "05"),
    ("antimony", "06"),
    ("arsenic", "03"),
    ("asbestos", "07"),
    ("barite", "08"),
    ("beryllium", "06"),
    ("bismuth", "11"),
    ("boron", "12"),
    ("bromine", "13"),
    ("cadmium", "14"),
    ("cesium", "11"),
    ("chromium", "18"),
    ("cobalt", "21"),
    ("copper", "24"),
    ("diamond", "27"),
    ("diatomite", "25"),
    ("feldspar", "26"),
    ("fluorspar", "28"),
    ("gallium", "46"),
    ("garnet", "41"),
    ("germanium", "22"),
    ("gold", "30"),
    ("graphite", "14"),
    ("gypsum", "32"),
    ("hafnium", "23"),
    ("helium", "25"),
    ("indium", "49"),
    ("iodine", "77"),
    ("iron_and_steel", "35"),
    ("iron_ore", "34"),
    ("kyanite", "37"),
    ("lead", "38"),
    ("lithium", "45"),
    ("magnesium", "32"),
    ("manganese", "33"),
    ("mercury", "43"),
    ("mica", "35"),
    ("molybdenum", "47"),
    ("nickel", "50"),
    ("niobium", "47"),
    ("nitrogen", "39"),
    ("palladium", "40"),
    ("peat", "41"),
    ("phosphate_rock", "42"),
    ("platinum", "43"),
    ("potash", "44"),
    ("rare_earths", "46"),
    ("rhenium", "48"),
    ("rubidium", "49"),
    ("salt", "50"),
    ("sand_gravel", "51"),
    ("scandium", "52"),
    ("selenium", "53"),
    ("silicon", "54"),
    ("silver", "88"),
    ("sodium_sulfate", "55"),
    ("strontium", "56"),
    ("sulfur", "57"),
    ("talc", "58"),
    ("tantalum", "59"),
    ("tellurium", "60"),
    ("thallium", "84"),
    ("thorium", "62"),
    ("tin", "63"),
    ("titanium", "64"),
    ("tungsten", "68"),
    ("uranium", "66"),
    ("vanadium", "70"),
    ("vermiculite", "71"),
    ("yttrium", "69"),
    ("zinc", "72"),
    ("zirconium", "71"),
    ("stone_crushed", "63"),
    ("stone_dimension", "80"),
    ("granite_crushed", "63"),
    ("granite_dimension", "80"),
    ("limestone_crushed", "63"),
    ("limestone_dimension", "80"),
];

const SHORT_NAME_LEN: usize = 5;

/// Canonical identifier plus the short forms each naming epoch needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommodityDescriptor {
    pub canonical_id: String,
    /// Only meaningful for 1997-2003.
    pub short_code: Option<&'static str>,
    pub short_name: String,
    pub directory: String,
}

impl CommodityDescriptor {
    /// Build a descriptor for any commodity id. Unknown commodities simply
    /// have no `short_code`.
    pub fn lookup(raw: &str) -> Self {
        let canonical_id = canonical_id(raw);
        Self {
            short_code: short_code(&canonical_id),
            short_name: short_name(&canonical_id),
            directory: directory_slug(&canonical_id),
            canonical_id,
        }
    }
}

/// Lowercase, word-separated id: `"Rare Earths"` and `"rare-earths"` both
/// become `"rare_earths"`.
pub fn canonical_id(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// 1997-2003 numeric code for a canonical id.
pub fn short_code(canonical_id: &str) -> Option<&'static str> {
    CODES_1997_2003
        .iter()
        .find(|(id, _)| *id == canonical_id)
        .map(|(_, code)| *code)
}

/// First five letters of the id with separators removed.
pub fn short_name(canonical_id: &str) -> String {
    canonical_id
        .chars()
        .filter(|c| *c != '_' && !c.is_whitespace())
        .take(SHORT_NAME_LEN)
        .collect()
}

/// Hyphenated directory name used in archive paths.
pub fn directory_slug(canonical_id: &str) -> String {
    match canonical_id {
        "iron_and_steel" => "iron-steel".to_string(),
        other => other.replace('_', "-"),
    }
}

/// Every `(canonical_id, code)` pair of the 1997-2003 table.
pub fn coded_commodities() -> impl Iterator<Item = (&'static str, &'static str)> {
    CODES_1997_2003.iter().copied()
}

pub fn code_count() -> usize {
    CODES_1997_2003.len()
}

/// Every code must be two ASCII digits and every id must be listed once.
pub fn validate() -> Result<(), TableError> {
    let mut seen = HashSet::new();
    for (id, code) in CODES_1997_2003 {
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(TableError::MalformedCode {
                commodity: id.to_string(),
                code: code.to_string(),
            });
        }
        if !seen.insert(*id) {
            return Err(TableError::Duplicate(id.to_string()));
        }
    }
    Ok(())
}
