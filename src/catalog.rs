//! Startup check of every compiled-in lookup table.

use tracing::info;

use crate::countries;
use crate::error::TableError;
use crate::locator::{commodities, epochs};

/// Sizes of the validated tables, for the startup log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub epochs: usize,
    pub literal_addresses: usize,
    pub commodity_codes: usize,
    pub corrections: usize,
}

/// Validate epochs, commodity codes and country corrections. Fails on the
/// first inconsistency.
pub fn validate_static_tables() -> Result<CatalogSummary, TableError> {
    epochs::validate()?;
    commodities::validate()?;
    countries::validate()?;

    let summary = CatalogSummary {
        epochs: epochs::EPOCHS.len(),
        literal_addresses: epochs::LITERAL_ADDRESSES.len(),
        commodity_codes: commodities::code_count(),
        corrections: countries::correction_count(),
    };
    info!(
        "Static tables OK: {} epochs, {} literal addresses, {} commodity codes, {} corrections",
        summary.epochs, summary.literal_addresses, summary.commodity_codes, summary.corrections
    );
    Ok(summary)
}
