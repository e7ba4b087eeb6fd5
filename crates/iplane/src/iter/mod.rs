//! Iteration APIs for trace files
//!
//! - [`RecordCursor`] / [`HopCursor`]: lazy, borrow-checked cursors that read one
//!   record header or hop entry per step
//! - [`TraceRecordIterator`]: owning iterator that yields complete [`TraceRecord`]s
//!
//! # Example
//!
//! ```rust,no_run
//! use iplane::{ReaderConfig, TraceFileReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = TraceFileReader::open("trace.out", ReaderConfig::default())?;
//!
//! while let Some(mut records) = reader.next_block()? {
//!     println!("collector {}", records.block().collector_id);
//!     while let Some(record) = records.next_record()? {
//!         for hop in record.hops {
//!             let hop = hop?;
//!             println!("{} {} {}", hop.address, hop.latency_ms, hop.ttl);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod record_iter;

pub use cursor::{HopCursor, Record, RecordCursor};
pub use record_iter::{TraceRecord, TraceRecordIterator};
