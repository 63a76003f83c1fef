//! Historical document locator.
//!
//! Turns `(commodity, year)` into a primary address plus ordered fallbacks.
//! Resolution is a priority chain: literal exception, then the epoch's
//! override for the commodity, then the epoch's generic template.

pub mod commodities;
pub mod epochs;

use serde::Serialize;

use crate::schema::LocatorResult;
use commodities::CommodityDescriptor;
use epochs::{epoch_for, literal_for};

/// Why a `(commodity, year)` pair has no address. The caller skips the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NotResolvable {
    EmptyCommodity,
    NoEpoch { year: u16 },
    MissingCode { commodity: String, epoch: &'static str },
}

impl std::fmt::Display for NotResolvable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotResolvable::EmptyCommodity => write!(f, "empty commodity id"),
            NotResolvable::NoEpoch { year } => write!(f, "no naming epoch covers {}", year),
            NotResolvable::MissingCode { commodity, epoch } => {
                write!(f, "{} has no numeric code for the {} epoch", commodity, epoch)
            }
        }
    }
}

/// Values substituted into address templates.
struct TemplateVars<'a> {
    descriptor: &'a CommodityDescriptor,
    year: u16,
}

impl TemplateVars<'_> {
    /// Returns `None` when the template needs a code the commodity lacks.
    fn render(&self, template: &str) -> Option<String> {
        if template.contains("{code}") && self.descriptor.short_code.is_none() {
            return None;
        }
        let year_full = format!("{:04}", self.year);
        let year_short = format!("{:02}", self.year % 100);
        let mut out = template
            .replace("{commodity}", &self.descriptor.directory)
            .replace("{short}", &self.descriptor.short_name)
            .replace("{yyyy}", &year_full)
            .replace("{yy}", &year_short);
        if let Some(code) = self.descriptor.short_code {
            out = out.replace("{code}", code);
        }
        Some(out)
    }
}

/// Resolve the document addresses for `commodity` in publication `year`.
pub fn resolve(commodity: &str, year: u16) -> Result<LocatorResult, NotResolvable> {
    let descriptor = CommodityDescriptor::lookup(commodity);
    if descriptor.canonical_id.is_empty() {
        return Err(NotResolvable::EmptyCommodity);
    }
    let vars = TemplateVars {
        descriptor: &descriptor,
        year,
    };

    if let Some(literal) = literal_for(&descriptor.canonical_id, year) {
        if let Some(primary) = vars.render(literal.primary) {
            return Ok(build(&vars, primary, literal.alternates));
        }
    }

    let epoch = epoch_for(year).ok_or(NotResolvable::NoEpoch { year })?;

    if let Some(address) = epoch.override_for(&descriptor.canonical_id) {
        if let Some(primary) = vars.render(address) {
            return Ok(build(&vars, primary, &[]));
        }
    }

    let missing_code = || NotResolvable::MissingCode {
        commodity: descriptor.canonical_id.clone(),
        epoch: epoch.label,
    };
    let (primary, alternates) = epoch.generic().ok_or_else(missing_code)?;
    let primary = vars.render(primary).ok_or_else(missing_code)?;
    Ok(build(&vars, primary, alternates))
}

fn build(vars: &TemplateVars<'_>, primary: String, alternates: &[&str]) -> LocatorResult {
    let mut rendered: Vec<String> = Vec::with_capacity(alternates.len());
    for template in alternates {
        let Some(address) = vars.render(template) else {
            continue;
        };
        if address != primary && !rendered.contains(&address) {
            rendered.push(address);
        }
    }
    LocatorResult::new(primary, rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    const S3: &str =
        "https://d9-wret.s3.us-west-2.amazonaws.com/assets/palladium/production/mineral-pubs/";

    #[test]
    fn test_barite_1997_uses_numeric_code() {
        let result = resolve("barite", 1997).unwrap();
        assert_eq!(result.primary, format!("{}barite/080397.pdf", S3));
        assert!(result.primary.contains("08"));
        assert_eq!(result.alternates, vec![format!("{}barite/baritmcs97.pdf", S3)]);
    }

    #[test]
    fn test_every_coded_commodity_resolves_in_code_epoch() {
        for (commodity, code) in commodities::coded_commodities() {
            // zinc keeps its literal `zinc_mcs{yy}` documents in these years.
            if commodity == "zinc" {
                continue;
            }
            for year in 1997..=2003 {
                let result = resolve(commodity, year).unwrap();
                assert!(
                    result.primary.contains(&format!("/{}03{:02}", code, year % 100)),
                    "{} {} -> {}",
                    commodity,
                    year,
                    result.primary
                );
            }
        }
        assert!(!resolve("zinc", 1999).unwrap().primary.contains("/7203"));
    }

    #[test]
    fn test_every_override_beats_the_code_table() {
        for epoch in epochs::EPOCHS {
            for template in epoch.templates {
                let epochs::AddressTemplate::Override { commodity, address } = template else {
                    continue;
                };
                for year in epoch.years.clone() {
                    let expected = address
                        .replace("{yyyy}", &format!("{:04}", year))
                        .replace("{yy}", &format!("{:02}", year % 100));
                    let result = resolve(commodity, year).unwrap();
                    assert_eq!(result.primary, expected, "{} {}", commodity, year);
                    assert!(result.alternates.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_missing_code_is_not_resolvable() {
        let err = resolve("bauxite", 2001).unwrap_err();
        assert_eq!(
            err,
            NotResolvable::MissingCode {
                commodity: "bauxite".to_string(),
                epoch: "1997-2003",
            }
        );
        // Same commodity resolves fine outside the coded epoch.
        assert!(resolve("bauxite", 2005).is_ok());
    }

    #[test]
    fn test_year_outside_epochs() {
        assert_eq!(
            resolve("copper", 1990).unwrap_err(),
            NotResolvable::NoEpoch { year: 1990 }
        );
        assert_eq!(
            resolve("copper", 2030).unwrap_err(),
            NotResolvable::NoEpoch { year: 2030 }
        );
    }

    #[test]
    fn test_empty_commodity() {
        assert_eq!(resolve("  ", 2010).unwrap_err(), NotResolvable::EmptyCommodity);
    }

    #[test]
    fn test_overrides_beat_code_table() {
        // iron_ore has code 34 but the override is used directly.
        let result = resolve("iron_ore", 1999).unwrap();
        assert_eq!(result.primary, format!("{}iron-ore/340399.pdf", S3));
        assert!(result.alternates.is_empty());

        // Multi-commodity documents in the current epoch.
        for pgm in ["platinum", "palladium", "rhodium", "iridium", "osmium", "ruthenium"] {
            let result = resolve(pgm, 2023).unwrap();
            assert_eq!(
                result.primary,
                "https://pubs.usgs.gov/periodicals/mcs2023/mcs2023-platinum.pdf"
            );
        }
        assert_eq!(
            resolve("tantalum", 2021).unwrap().primary,
            "https://pubs.usgs.gov/periodicals/mcs2021/mcs2021-niobium.pdf"
        );
    }

    #[test]
    fn test_override_without_code_entry_still_resolves() {
        // rhodium has no 1997-2003 code, but the 2020+ override does not need one.
        assert!(commodities::short_code("rhodium").is_none());
        assert!(resolve("rhodium", 2020).is_ok());
    }

    #[test]
    fn test_2004_2007_alternates_are_ordered_and_unique() {
        let result = resolve("tin", 2005).unwrap();
        assert_eq!(result.primary, format!("{}tin/tinmcs05.pdf", S3));
        // "{commodity}mcs" equals the primary for short names, so it is dropped.
        assert_eq!(
            result.alternates,
            vec![
                format!("{}tin/tin_mcs05.pdf", S3),
                format!("{}tin/tin-mcs05.pdf", S3),
            ]
        );

        let copper = resolve("copper", 2006).unwrap();
        assert_eq!(copper.alternates.len(), 3);
        assert_eq!(copper.alternates[2], format!("{}copper/coppermcs06.pdf", S3));
    }

    #[test]
    fn test_2008_2012_and_2019_schemes() {
        let result = resolve("copper", 2010).unwrap();
        assert_eq!(result.primary, format!("{}copper/mcs-2010-coppe.pdf", S3));
        assert_eq!(result.alternates.len(), 2);

        let result = resolve("copper", 2019).unwrap();
        assert!(result.primary.contains("s3fs-public/atoms/files/mcs-2019-coppe.pdf"));
        assert_eq!(result.alternates.len(), 2);
    }

    #[test]
    fn test_current_epoch_hyphenates_full_id() {
        let result = resolve("Sodium Sulfate", 2024).unwrap();
        assert_eq!(
            result.primary,
            "https://pubs.usgs.gov/periodicals/mcs2024/mcs2024-sodium-sulfate.pdf"
        );
        assert!(result.alternates.is_empty());
    }

    #[test]
    fn test_zinc_literals_take_priority() {
        assert_eq!(
            resolve("zinc", 1996).unwrap().primary,
            format!("{}zinc/zinc_mcs96.pdf", S3)
        );
        // zinc has code 72, but the literal wins.
        assert_eq!(
            resolve("zinc", 2001).unwrap().primary,
            format!("{}zinc/zinc_mcs01.pdf", S3)
        );
        let modern = resolve("zinc", 2012).unwrap();
        assert_eq!(modern.primary, format!("{}zinc/mcs-2012-zinc.pdf", S3));
        assert_eq!(modern.alternates.len(), 4);
        // After 2019 zinc follows the generic scheme again.
        assert_eq!(
            resolve("zinc", 2022).unwrap().primary,
            "https://pubs.usgs.gov/periodicals/mcs2022/mcs2022-zinc.pdf"
        );
    }

    #[test]
    fn test_lead_transition_year() {
        let result = resolve("lead", 1996).unwrap();
        assert_eq!(result.primary, format!("{}lead/380396.pdf", S3));
        assert_eq!(result.alternates, vec![format!("{}lead/leadmcs96.pdf", S3)]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for year in 1994..=2027 {
            assert_eq!(resolve("nickel", year), resolve("nickel", year));
        }
    }
}
