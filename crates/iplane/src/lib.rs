//! # iplane
//!
//! A standalone Rust library for reading iPlane traceroute files.
//!
//! The files are a flat sequence of blocks. Each block holds a number of
//! traceroute records, and each record holds the hops observed on the way
//! to one destination. This crate provides:
//! - Block, record and hop decoding for the fixed little-endian layout
//! - Lazy, nested iteration (blocks -> records -> hops) that never
//!   materializes more than one hop at a time
//! - Truncation and corruption detection with byte offsets for diagnostics
//!
//! ## Example
//!
//! ```no_run
//! use iplane::{ReaderConfig, TraceFileReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = TraceFileReader::open(
//!     "trace.out.planetlab1.dojima.wide.ad.jp",
//!     ReaderConfig::default(),
//! )?;
//!
//! while let Some(mut records) = reader.next_block()? {
//!     while let Some(record) = records.next_record()? {
//!         let mut path = record.destination.to_string();
//!         for hop in record.hops {
//!             path.push_str(&format!("=>{}", hop?.address));
//!         }
//!         println!("{}", path);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod iter;
pub mod reader;
pub mod schema;

#[cfg(test)]
mod testing;

pub use error::{Result, TraceFileError, TruncationKind};
pub use iter::{HopCursor, Record, RecordCursor, TraceRecord, TraceRecordIterator};
pub use reader::{ReaderConfig, ReaderStats, TraceFileReader};
pub use schema::{BlockHeader, Hop, RecordHeader};
