//! Run statistics accumulated by a pipeline instance.

use serde::Serialize;

/// Counters accumulated over the lifetime of one pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    /// Documents handed to the pipeline.
    pub files_seen: usize,
    /// Documents that produced a record set.
    pub files_succeeded: usize,
    /// Records that survived validation.
    pub records_produced: usize,
    /// Documents that failed with an input error.
    pub errors: usize,
    /// Empty extractions and empty parses.
    pub warnings: usize,
    /// Validation messages emitted.
    pub validation_errors: usize,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}
