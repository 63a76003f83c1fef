//! Naming epochs: the year ranges that share one document-addressing convention.
//!
//! The archive was reorganised several times between 1996 and 2025. Each
//! epoch lists its per-commodity overrides and its generic template, and
//! `LITERAL_ADDRESSES` holds the hand-authored exceptions that win over both.

use std::ops::RangeInclusive;

use crate::error::TableError;

macro_rules! s3 {
    ($path:literal) => {
        concat!(
            "https://d9-wret.s3.us-west-2.amazonaws.com/assets/palladium/production/mineral-pubs/",
            $path
        )
    };
}

macro_rules! s3_public {
    ($path:literal) => {
        concat!(
            "https://d9-wret.s3-us-west-2.amazonaws.com/assets/palladium/production/s3fs-public/atoms/files/",
            $path
        )
    };
}

macro_rules! archive {
    ($path:literal) => {
        concat!("https://apps.usgs.gov/minerals-information-archives/", $path)
    };
}

macro_rules! periodical {
    ($path:literal) => {
        concat!("https://pubs.usgs.gov/periodicals/mcs{yyyy}/", $path)
    };
}

/// Placeholders a template may reference.
pub const PLACEHOLDERS: &[&str] = &["commodity", "short", "code", "yy", "yyyy"];

/// One way of addressing a document inside an epoch.
#[derive(Debug, Clone, Copy)]
pub enum AddressTemplate {
    /// Literal address for a single commodity; only the year is substituted.
    Override {
        commodity: &'static str,
        address: &'static str,
    },
    /// The epoch's naming convention for every other commodity.
    Generic {
        primary: &'static str,
        alternates: &'static [&'static str],
    },
}

/// A contiguous range of publication years sharing one convention.
#[derive(Debug)]
pub struct Epoch {
    pub label: &'static str,
    pub years: RangeInclusive<u16>,
    pub templates: &'static [AddressTemplate],
}

impl Epoch {
    pub fn override_for(&self, commodity: &str) -> Option<&'static str> {
        self.templates.iter().find_map(|t| match t {
            AddressTemplate::Override {
                commodity: c,
                address,
            } if *c == commodity => Some(*address),
            _ => None,
        })
    }

    pub fn generic(&self) -> Option<(&'static str, &'static [&'static str])> {
        self.templates.iter().find_map(|t| match t {
            AddressTemplate::Generic {
                primary,
                alternates,
            } => Some((*primary, *alternates)),
            _ => None,
        })
    }
}

/// A hand-authored address that takes priority over every epoch template.
#[derive(Debug)]
pub struct LiteralAddress {
    pub commodity: &'static str,
    pub years: RangeInclusive<u16>,
    pub primary: &'static str,
    pub alternates: &'static [&'static str],
}

const fn platinum_group(commodity: &'static str) -> AddressTemplate {
    AddressTemplate::Override {
        commodity,
        address: periodical!("mcs{yyyy}-platinum.pdf"),
    }
}

pub static EPOCHS: &[Epoch] = &[
    Epoch {
        label: "1996",
        years: 1996..=1996,
        templates: &[
            AddressTemplate::Override {
                commodity: "iron_ore",
                address: s3!("iron-ore/feoremcs{yy}.pdf"),
            },
            AddressTemplate::Override {
                commodity: "iron_and_steel",
                address: s3!("iron-steel/isteemcs{yy}.pdf"),
            },
            AddressTemplate::Generic {
                primary: s3!("{commodity}/{short}mcs{yy}.pdf"),
                alternates: &[],
            },
        ],
    },
    Epoch {
        label: "1997-2003",
        years: 1997..=2003,
        templates: &[
            AddressTemplate::Override {
                commodity: "iron_ore",
                address: s3!("iron-ore/3403{yy}.pdf"),
            },
            AddressTemplate::Override {
                commodity: "iron_and_steel",
                address: s3!("iron-steel/3503{yy}.pdf"),
            },
            AddressTemplate::Generic {
                primary: s3!("{commodity}/{code}03{yy}.pdf"),
                alternates: &[s3!("{commodity}/{short}mcs{yy}.pdf")],
            },
        ],
    },
    Epoch {
        label: "2004-2007",
        years: 2004..=2007,
        templates: &[
            AddressTemplate::Override {
                commodity: "iron_ore",
                address: s3!("iron-ore/feoremcs{yy}.pdf"),
            },
            AddressTemplate::Override {
                commodity: "iron_and_steel",
                address: s3!("iron-steel/festmcs{yy}.pdf"),
            },
            AddressTemplate::Generic {
                primary: s3!("{commodity}/{short}mcs{yy}.pdf"),
                alternates: &[
                    s3!("{commodity}/{short}_mcs{yy}.pdf"),
                    s3!("{commodity}/{short}-mcs{yy}.pdf"),
                    s3!("{commodity}/{commodity}mcs{yy}.pdf"),
                ],
            },
        ],
    },
    Epoch {
        label: "2008-2012",
        years: 2008..=2012,
        templates: &[
            AddressTemplate::Override {
                commodity: "iron_ore",
                address: s3!("iron-ore/mcs-{yyyy}-feore.pdf"),
            },
            AddressTemplate::Override {
                commodity: "iron_and_steel",
                address: s3!("iron-steel/mcs-{yyyy}-feste.pdf"),
            },
            AddressTemplate::Generic {
                primary: s3!("{commodity}/mcs-{yyyy}-{short}.pdf"),
                alternates: &[
                    s3!("{commodity}/mcs{yyyy}-{short}.pdf"),
                    s3_public!("mcs-{yyyy}-{short}.pdf"),
                ],
            },
        ],
    },
    Epoch {
        label: "2013-2018",
        years: 2013..=2018,
        templates: &[
            AddressTemplate::Override {
                commodity: "iron_ore",
                address: archive!("iron-ore/mcs-{yyyy}-feore.pdf"),
            },
            AddressTemplate::Override {
                commodity: "iron_and_steel",
                address: archive!("iron-steel/mcs-{yyyy}-feste.pdf"),
            },
            AddressTemplate::Generic {
                primary: s3!("{commodity}/mcs-{yyyy}-{short}.pdf"),
                alternates: &[
                    s3!("{commodity}/mcs{yyyy}-{short}.pdf"),
                    s3_public!("mcs-{yyyy}-{short}.pdf"),
                    archive!("{commodity}/mcs-{yyyy}-{short}.pdf"),
                ],
            },
        ],
    },
    Epoch {
        label: "2019",
        years: 2019..=2019,
        templates: &[
            AddressTemplate::Override {
                commodity: "iron_ore",
                address: s3_public!("mcs-{yyyy}-feore.pdf"),
            },
            AddressTemplate::Override {
                commodity: "iron_and_steel",
                address: s3_public!("mcs-{yyyy}-feste.pdf"),
            },
            AddressTemplate::Generic {
                primary: s3_public!("mcs-{yyyy}-{short}.pdf"),
                alternates: &[
                    s3!("{commodity}/mcs-{yyyy}-{short}.pdf"),
                    s3!("{commodity}/mcs{yyyy}-{short}.pdf"),
                ],
            },
        ],
    },
    Epoch {
        label: "2020-2025",
        years: 2020..=2025,
        templates: &[
            AddressTemplate::Override {
                commodity: "iron_ore",
                address: periodical!("mcs{yyyy}-iron-ore.pdf"),
            },
            AddressTemplate::Override {
                commodity: "iron_and_steel",
                address: periodical!("mcs{yyyy}-iron-steel.pdf"),
            },
            platinum_group("platinum"),
            platinum_group("palladium"),
            platinum_group("rhodium"),
            platinum_group("iridium"),
            platinum_group("osmium"),
            platinum_group("ruthenium"),
            AddressTemplate::Override {
                commodity: "niobium",
                address: periodical!("mcs{yyyy}-niobium.pdf"),
            },
            AddressTemplate::Override {
                commodity: "tantalum",
                address: periodical!("mcs{yyyy}-niobium.pdf"),
            },
            AddressTemplate::Override {
                commodity: "rare_earths",
                address: periodical!("mcs{yyyy}-ree.pdf"),
            },
            AddressTemplate::Override {
                commodity: "clay",
                address: periodical!("mcs{yyyy}-clay.pdf"),
            },
            AddressTemplate::Override {
                commodity: "kaolin",
                address: periodical!("mcs{yyyy}-clay.pdf"),
            },
            AddressTemplate::Override {
                commodity: "bentonite",
                address: periodical!("mcs{yyyy}-clay.pdf"),
            },
            AddressTemplate::Override {
                commodity: "selenium",
                address: periodical!("mcs{yyyy}-selenium.pdf"),
            },
            AddressTemplate::Override {
                commodity: "tellurium",
                address: periodical!("mcs{yyyy}-selenium.pdf"),
            },
            AddressTemplate::Override {
                commodity: "soda_ash",
                address: periodical!("mcs{yyyy}-soda-ash.pdf"),
            },
            AddressTemplate::Override {
                commodity: "phosphate_rock",
                address: periodical!("mcs{yyyy}-phosphate-rock.pdf"),
            },
            AddressTemplate::Override {
                commodity: "sand_gravel",
                address: periodical!("mcs{yyyy}-sand-gravel.pdf"),
            },
            AddressTemplate::Override {
                commodity: "stone_crushed",
                address: periodical!("mcs{yyyy}-stone-crushed.pdf"),
            },
            AddressTemplate::Override {
                commodity: "stone_dimension",
                address: periodical!("mcs{yyyy}-stone-dimension.pdf"),
            },
            AddressTemplate::Generic {
                primary: periodical!("mcs{yyyy}-{commodity}.pdf"),
                alternates: &[],
            },
        ],
    },
];

pub static LITERAL_ADDRESSES: &[LiteralAddress] = &[
    LiteralAddress {
        commodity: "zinc",
        years: 1996..=1996,
        primary: s3!("zinc/zinc_mcs96.pdf"),
        alternates: &[],
    },
    LiteralAddress {
        commodity: "zinc",
        years: 1997..=2007,
        primary: s3!("zinc/zinc_mcs{yy}.pdf"),
        alternates: &[],
    },
    LiteralAddress {
        commodity: "zinc",
        years: 2008..=2019,
        primary: s3!("zinc/mcs-{yyyy}-zinc.pdf"),
        alternates: &[
            s3!("zinc/mcs{yyyy}-zinc.pdf"),
            s3_public!("mcs-{yyyy}-zinc.pdf"),
            s3_public!("mcs-{yyyy}-zinc_0.pdf"),
            "https://d9-wret.s3-us-west-2.amazonaws.com/assets/palladium/production/atoms/files/mcs-{yyyy}-zinc.pdf",
        ],
    },
    // 1996 lead was already published under the 1997 numeric scheme.
    LiteralAddress {
        commodity: "lead",
        years: 1996..=1996,
        primary: s3!("lead/380396.pdf"),
        alternates: &[s3!("lead/leadmcs96.pdf")],
    },
];

/// Epoch covering `year`, if any.
pub fn epoch_for(year: u16) -> Option<&'static Epoch> {
    EPOCHS.iter().find(|e| e.years.contains(&year))
}

/// Literal exception for `(commodity, year)`, if any.
pub fn literal_for(commodity: &str, year: u16) -> Option<&'static LiteralAddress> {
    LITERAL_ADDRESSES
        .iter()
        .find(|l| l.commodity == commodity && l.years.contains(&year))
}

/// Names inside `{...}` in a template.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                found.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    found
}

fn check_template(template: &str) -> Result<(), TableError> {
    for name in placeholders(template) {
        if !PLACEHOLDERS.contains(&name) {
            return Err(TableError::UnknownPlaceholder {
                template: template.to_string(),
                placeholder: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Epochs must be sorted and disjoint, templates must only use known
/// placeholders, and literal exceptions must fall inside some epoch.
pub fn validate() -> Result<(), TableError> {
    for pair in EPOCHS.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.years.start() < prev.years.start() {
            return Err(TableError::UnsortedEpochs(next.label.to_string()));
        }
        if next.years.start() <= prev.years.end() {
            return Err(TableError::OverlappingEpochs {
                first: prev.label.to_string(),
                second: next.label.to_string(),
            });
        }
    }

    for epoch in EPOCHS {
        for template in epoch.templates {
            match template {
                AddressTemplate::Override { address, .. } => check_template(address)?,
                AddressTemplate::Generic {
                    primary,
                    alternates,
                } => {
                    check_template(primary)?;
                    for alt in alternates.iter() {
                        check_template(alt)?;
                    }
                }
            }
        }
    }

    for literal in LITERAL_ADDRESSES {
        let covered = epoch_for(*literal.years.start()).is_some()
            && epoch_for(*literal.years.end()).is_some();
        if !covered {
            return Err(TableError::OrphanLiteral {
                commodity: literal.commodity.to_string(),
            });
        }
        check_template(literal.primary)?;
        for alt in literal.alternates {
            check_template(alt)?;
        }
    }

    Ok(())
}
