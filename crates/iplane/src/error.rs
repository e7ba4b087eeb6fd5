//! Error types for trace file reader operations

use std::fmt;

use thiserror::Error;

/// Result type for trace file operations
pub type Result<T> = std::result::Result<T, TraceFileError>;

/// Which structure was being decoded when the input ran out or went bad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationKind {
    /// End of input inside a 16-byte block header
    BlockHeader,

    /// End of input inside an 8-byte record header
    RecordHeader,

    /// End of input inside a 12-byte trace entry
    TraceEntry,

    /// A trace entry decoded to a ttl above the configured limit.
    /// Treated as misalignment rather than a real value.
    TtlOutOfRange { ttl: i32, limit: i32 },
}

impl fmt::Display for TruncationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TruncationKind::BlockHeader => write!(f, "incomplete block header"),
            TruncationKind::RecordHeader => write!(f, "incomplete record header"),
            TruncationKind::TraceEntry => write!(f, "incomplete trace entry"),
            TruncationKind::TtlOutOfRange { ttl, limit } => {
                write!(f, "ttl {} exceeds limit {}", ttl, limit)
            }
        }
    }
}

/// Errors that can occur while reading a trace file
#[derive(Error, Debug)]
pub enum TraceFileError {
    /// The stream ended mid-structure or decoded to nonsense.
    /// Always fatal for the stream; there are no sync markers to recover from.
    #[error("{label} seems to be truncated after {offset} bytes ({kind})")]
    Truncated {
        /// Identifier of the source (file name or configured label)
        label: String,
        /// Byte offset reached when the failure was detected
        offset: u64,
        kind: TruncationKind,
    },

    /// I/O error other than a short read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reader was advanced after an I/O error had already failed it
    #[error("{label} is unreadable after an I/O error at {offset} bytes")]
    Failed { label: String, offset: u64 },

    /// The reader was advanced after being closed
    #[error("Reader for {0} is closed")]
    Closed(String),
}

impl TraceFileError {
    /// Returns true for truncation and corruption failures
    pub fn is_truncated(&self) -> bool {
        matches!(self, TraceFileError::Truncated { .. })
    }

    /// Byte offset carried by truncation and failure errors
    pub fn offset(&self) -> Option<u64> {
        match self {
            TraceFileError::Truncated { offset, .. } | TraceFileError::Failed { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }

    /// The truncation kind, if this is a truncation error
    pub fn kind(&self) -> Option<TruncationKind> {
        match self {
            TraceFileError::Truncated { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
