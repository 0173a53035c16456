use std::io;

use thiserror::Error;

/// Represents a failure the caller has to deal with.
///
/// Malformed bibliography content is never an `Error`; broken entries are
/// skipped and tallied in [`SkipStats`](crate::SkipStats) instead. Only
/// failures outside the text itself end up here.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the bibliography stream, scanning a folder or touching a
    /// state file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A persisted state file (preferences or reading status) exists but
    /// cannot be deserialized.
    #[error("malformed state file: {0}")]
    State(#[from] serde_json::Error),
}

// Why an entry block was dropped instead of becoming a record.
// Internal: the public surface only exposes the per-reason counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum SkipReason {
    #[error("entry header does not match `@type{{key,`")]
    MalformedHeader,
    #[error("entry has no field region")]
    NoFields,
    #[error("entry has neither a usable title nor a citation key")]
    Anonymous,
}

/// Counters describing what the parser dropped on the floor.
///
/// Dropping is silent by contract, so these counters (and debug-level log
/// lines) are the only trace a skipped entry leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipStats {
    /// Entry blocks that reached the field tokenizer.
    pub blocks: usize,
    /// Accumulations discarded because their braces never closed.
    pub unterminated: usize,
    /// Blocks whose first line did not look like `@type{key,`.
    pub malformed_header: usize,
    /// Blocks with nothing between the header comma and the last `}`.
    pub no_fields: usize,
    /// Entries with neither a title nor a citation key.
    pub anonymous: usize,
}

impl SkipStats {
    pub(crate) fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MalformedHeader => self.malformed_header += 1,
            SkipReason::NoFields => self.no_fields += 1,
            SkipReason::Anonymous => self.anonymous += 1,
        }
    }

    /// Total number of entries that did not make it into the output.
    pub fn skipped(&self) -> usize {
        self.unterminated + self.malformed_header + self.no_fields + self.anonymous
    }
}
