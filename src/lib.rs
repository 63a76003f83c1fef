//! mcs-extract: per-country production and reserves from the Mineral
//! Commodity Summaries archive.
//!
//! The pipeline is locator → source → table extractor → country normalizer,
//! driven per `(commodity, year)` by [`collector::Collector`].

pub mod audit;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod countries;
pub mod error;
pub mod export;
pub mod locator;
pub mod schema;
pub mod source;
pub mod table;
pub mod throttle;

pub use collector::{CollectionPlan, Collector, Job};
pub use config::CollectorConfig;
pub use error::{FetchError, TableError};
pub use locator::{resolve, NotResolvable};
pub use schema::{CollectionReport, CollectionResult, ExtractedRow, LocatorResult, Outcome};
