//! Lazy cursors over the records of a block and the hops of a record
//!
//! Both cursors borrow the reader mutably, so only one of them can move the
//! underlying stream at a time: a [`HopCursor`] has to be dropped before its
//! [`RecordCursor`] can advance, and the record cursor has to be dropped before
//! the reader moves on to the next block.

use std::io::Read;
use std::net::Ipv4Addr;

use crate::error::Result;
use crate::reader::TraceFileReader;
use crate::schema::{BlockHeader, Hop};

/// Cursor over the records of one block
pub struct RecordCursor<'r, R> {
    reader: &'r mut TraceFileReader<R>,
    block: BlockHeader,
}

impl<'r, R: Read> RecordCursor<'r, R> {
    pub(crate) fn new(reader: &'r mut TraceFileReader<R>, block: BlockHeader) -> Self {
        Self { reader, block }
    }

    /// Header of the block this cursor walks
    pub fn block(&self) -> BlockHeader {
        self.block
    }

    /// Records of the block not handed out yet
    pub fn remaining(&self) -> u32 {
        self.block
            .records()
            .saturating_sub(self.reader.records_consumed_in_block())
    }

    /// Decodes the next record header
    ///
    /// Returns `Ok(None)` once the block's record count is reached. Hops the
    /// caller did not read from the previous record are consumed first so the
    /// stream stays aligned.
    pub fn next_record(&mut self) -> Result<Option<Record<'_, R>>> {
        let Some(header) = self.reader.next_record_header()? else {
            return Ok(None);
        };

        Ok(Some(Record {
            destination: header.destination,
            hop_count: header.hop_count,
            hops: HopCursor::new(&mut *self.reader),
        }))
    }
}

/// One destination's traceroute with its hops still unread
pub struct Record<'c, R> {
    pub destination: Ipv4Addr,

    /// Declared number of hops, as stored in the file
    pub hop_count: i32,

    pub hops: HopCursor<'c, R>,
}

/// Cursor over the hops of one record
///
/// Yields exactly the declared number of hops. The first error ends the
/// iteration.
pub struct HopCursor<'c, R> {
    reader: &'c mut TraceFileReader<R>,
    failed: bool,
}

impl<'c, R: Read> HopCursor<'c, R> {
    fn new(reader: &'c mut TraceFileReader<R>) -> Self {
        Self {
            reader,
            failed: false,
        }
    }

    /// Hops of the record not read yet
    pub fn remaining(&self) -> u32 {
        if self.failed {
            0
        } else {
            self.reader.pending_hops()
        }
    }
}

impl<R: Read> Iterator for HopCursor<'_, R> {
    type Item = Result<Hop>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.reader.next_hop() {
            Ok(Some(hop)) => Some(Ok(hop)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining() as usize))
    }
}
