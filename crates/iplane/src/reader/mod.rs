//! Reader implementation for iPlane trace files

mod source;
pub mod trace_reader;

pub use trace_reader::TraceFileReader;

use serde::Serialize;

use crate::schema::layout::DEFAULT_MAX_TTL;

/// Configuration for trace file readers
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Label used in errors and logs instead of the file name (default: none)
    pub source_label: Option<String>,

    /// Trace entries with a larger ttl are rejected as corrupt (default: 512)
    pub max_ttl: i32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            source_label: None,
            max_ttl: DEFAULT_MAX_TTL,
        }
    }
}

/// Running totals of what a reader has decoded so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    pub blocks: u64,
    pub records: u64,
    pub hops: u64,
    pub bytes_read: u64,
}
