//! Error types shared across the pipeline.

use thiserror::Error;

/// Failure while fetching or decoding a document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection reset / aborted. Worth retrying with backoff.
    #[error("transient fetch failure for {address}: {message}")]
    Transient { address: String, message: String },

    /// Server answered with a non-success status.
    #[error("{address} returned HTTP {status}")]
    Status { address: String, status: u16 },

    /// Any other transport failure (DNS, TLS, timeout, body read).
    #[error("failed to fetch {address}: {message}")]
    Transport { address: String, message: String },

    /// Bytes were fetched but could not be turned into page text.
    #[error("failed to decode document: {0}")]
    Decode(String),
}

impl FetchError {
    /// Only connection-reset-class failures are retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    /// Short tag used in attempt diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transient { .. } => "transient",
            FetchError::Status { .. } => "status",
            FetchError::Transport { .. } => "transport",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// A static lookup table failed its load-time consistency check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("epochs {first} and {second} overlap")]
    OverlappingEpochs { first: String, second: String },

    #[error("epochs are not sorted: {0} starts before its predecessor")]
    UnsortedEpochs(String),

    #[error("template `{template}` uses unknown placeholder `{placeholder}`")]
    UnknownPlaceholder { template: String, placeholder: String },

    #[error("literal address for {commodity} covers years outside every epoch")]
    OrphanLiteral { commodity: String },

    #[error("commodity code for {commodity} is not two digits: {code:?}")]
    MalformedCode { commodity: String, code: String },

    #[error("duplicate entry for {0}")]
    Duplicate(String),

    #[error("correction key {0:?} is changed by structural cleanup and can never match")]
    UnreachableCorrection(String),

    #[error("correction {key:?} -> {value:?} does not resolve in a single lookup")]
    ChainedCorrection { key: String, value: String },
}
