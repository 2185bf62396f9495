//! Flattened-path construction.
//!
//! A flattened path identifies a leaf in a JSON tree: object descent appends
//! `.key` (bare `key` at the root), array descent appends `[i]`. Paths are
//! built in a single reusable buffer with push/truncate checkpoints so a
//! whole flatten pass performs no per-segment allocation.

use std::fmt::Write as _;

use crate::error::TransformError;

/// Upper bound on a flattened path, in bytes. Exceeding it is a fatal
/// failure for the document being flattened.
pub const MAX_PATH_LEN: usize = 8192;

/// How much of an overlong path to quote in the error message.
const OVERFLOW_PREFIX_LEN: usize = 64;

/// A checkpoint into a [`PathBuffer`], restoring the parent prefix after a
/// child has been visited.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint(usize);

/// Reusable scratch buffer for dotted/bracketed path prefixes.
#[derive(Debug, Default)]
pub(crate) struct PathBuffer {
    buf: String,
}

impl PathBuffer {
    pub(crate) fn new() -> Self {
        Self {
            buf: String::with_capacity(128),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.buf
    }

    /// Append an object-key segment: `key` at the root, `.key` below it.
    pub(crate) fn push_key(&mut self, key: &str) -> Result<Checkpoint, TransformError> {
        let mark = self.buf.len();
        if !self.buf.is_empty() {
            self.buf.push('.');
        }
        self.buf.push_str(key);
        self.check(mark)
    }

    /// Append an array-index segment `[i]`.
    pub(crate) fn push_index(&mut self, index: usize) -> Result<Checkpoint, TransformError> {
        let mark = self.buf.len();
        // Writing into a String is infallible.
        let _ = write!(self.buf, "[{index}]");
        self.check(mark)
    }

    /// Restore the buffer to a previously returned checkpoint.
    pub(crate) fn truncate(&mut self, checkpoint: Checkpoint) {
        self.buf.truncate(checkpoint.0);
    }

    fn check(&mut self, mark: usize) -> Result<Checkpoint, TransformError> {
        if self.buf.len() > MAX_PATH_LEN {
            let prefix: String = self.buf.chars().take(OVERFLOW_PREFIX_LEN).collect();
            return Err(TransformError::PathOverflow {
                limit: MAX_PATH_LEN,
                prefix,
            });
        }
        Ok(Checkpoint(mark))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
