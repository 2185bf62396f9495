//! Error types for the transformation engine.

use thiserror::Error;

/// Errors surfaced by transformation primitives and the pipeline runner.
///
/// Every failure mode is a typed result; nothing unwinds across the pipeline
/// boundary. Batch runs report the first failing element in input order.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransformError {
    /// Upstream parser failure, surfaced verbatim.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Regex compilation failure for a queued replace operation.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A flattened key exceeded the configured path bound.
    #[error("flattened path exceeds {limit} bytes (at `{prefix}`)")]
    PathOverflow { limit: usize, prefix: String },

    /// Allocation-substrate failure; fatal to the current call.
    #[error("allocation failed: {what}")]
    AllocFailed { what: &'static str },

    /// Unreachable-state detection; fatal.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(&'static str),
}

impl TransformError {
    /// The path context of the error, if it carries one.
    pub fn path(&self) -> Option<&str> {
        match self {
            TransformError::PathOverflow { prefix, .. } => Some(prefix),
            _ => None,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
