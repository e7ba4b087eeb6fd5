//! Iterator for fully read records
//!
//! This module provides [`TraceRecordIterator`] which yields owned [`TraceRecord`]
//! objects, each holding every hop of one destination's traceroute.

use std::io::Read;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::error::Result;
use crate::reader::TraceFileReader;
use crate::schema::{BlockHeader, Hop};

/// A complete traceroute record with all hops read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    /// Header of the block the record came from
    pub block: BlockHeader,

    pub destination: Ipv4Addr,

    /// Declared hop count, as stored in the file
    pub hop_count: i32,

    pub hops: Vec<Hop>,
}

impl TraceRecord {
    /// Returns the hop addresses in probe order
    pub fn path(&self) -> Vec<Ipv4Addr> {
        self.hops.iter().map(|hop| hop.address).collect()
    }

    /// Returns true if the last hop is the destination itself
    pub fn reached_destination(&self) -> bool {
        self.hops
            .last()
            .is_some_and(|hop| hop.address == self.destination)
    }
}

/// Iterator over the records of a trace file
///
/// Walks every block in order and collects each record's hops. The first error
/// is yielded once; the iterator is fused afterwards.
///
/// # Example
///
/// ```rust,no_run
/// use iplane::{ReaderConfig, TraceFileReader};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let reader = TraceFileReader::open("trace.out", ReaderConfig::default())?;
///
/// for record in reader.into_records() {
///     let record = record?;
///     println!("{}: {} hops", record.destination, record.hops.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct TraceRecordIterator<R> {
    /// The underlying reader
    reader: TraceFileReader<R>,

    done: bool,
}

impl<R: Read> TraceRecordIterator<R> {
    pub fn new(reader: TraceFileReader<R>) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    /// Access to the reader, e.g. for its statistics
    pub fn reader(&self) -> &TraceFileReader<R> {
        &self.reader
    }

    pub fn into_inner(self) -> TraceFileReader<R> {
        self.reader
    }

    fn read_next(&mut self) -> Result<Option<TraceRecord>> {
        loop {
            let Some(mut records) = self.reader.next_block()? else {
                return Ok(None);
            };
            let block = records.block();

            if let Some(record) = records.next_record()? {
                let destination = record.destination;
                let hop_count = record.hop_count;
                let hops = record.hops.collect::<Result<Vec<_>>>()?;

                return Ok(Some(TraceRecord {
                    block,
                    destination,
                    hop_count,
                    hops,
                }));
            }

            // Block has no records left, move on to the next header
        }
    }
}

impl<R: Read> Iterator for TraceRecordIterator<R> {
    type Item = Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
