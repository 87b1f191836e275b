//! Error taxonomy for selection, assembly and the processing steps.
//!
//! File-level I/O returns `anyhow::Result` instead; these typed errors flow
//! into it through `?`.
use crate::select::SeriesKind;

/// Result alias used by every operation with a fixed failure set.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed range token (`"0:5"`, `"all"`, `"3"`, ...).
    #[error("invalid range token '{token}': {reason}")]
    InvalidRange { token: String, reason: String },

    /// Index failure while resolving the segment list of a block.
    #[error("segment index {index} is out of range (block has {len} segments)")]
    SegmentOutOfRange { index: usize, len: usize },

    /// Index failure while resolving a series list inside one segment.
    #[error("{kind} index {index} is out of range in segment {segment} ({len} available)")]
    SeriesOutOfRange {
        kind: SeriesKind,
        segment: usize,
        index: usize,
        len: usize,
    },

    #[error("invalid action '{0}': valid actions are 'new', 'replace', 'add' or 'add:<segment>'")]
    InvalidAction(String),

    #[error("at least one analog signal or spike train must be provided")]
    EmptyInput,

    /// Both or neither of the analog-signal / spike-train ranges were given.
    #[error("must specify exactly one series kind (analog signal or spike train index), got {0}")]
    AmbiguousSelection(&'static str),

    #[error("action '{0}' requires an existing block")]
    MissingBlock(&'static str),

    #[error("invalid write action '{0}': valid actions are 'new', 'replace', 'update'")]
    InvalidWriteAction(String),

    #[error("unsupported format '{0}': valid formats are 'safetensors', 'json'")]
    UnsupportedFormat(String),

    #[error("invalid quantity '{input}': {reason}")]
    InvalidQuantity { input: String, reason: String },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Error {
    pub(crate) fn invalid_range(token: &str, reason: impl Into<String>) -> Self {
        Error::InvalidRange { token: token.to_string(), reason: reason.into() }
    }
}
