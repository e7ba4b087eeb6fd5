//! Forward-only reader for iPlane trace files

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::error::{Result, TraceFileError, TruncationKind};
use crate::iter::{RecordCursor, TraceRecordIterator};
use crate::reader::source::ByteSource;
use crate::reader::{ReaderConfig, ReaderStats};
use crate::schema::layout::{BLOCK_HEADER_LEN, RECORD_HEADER_LEN, TRACE_ENTRY_LEN};
use crate::schema::{BlockHeader, Hop, RecordHeader};

/// Reader for iPlane trace files
///
/// Decodes `block header -> (record header -> hop entries) x record count`
/// sequences until the input ends on a block boundary. The reader owns its
/// byte source; dropping the reader closes it.
///
/// Any decode failure poisons the reader: every later advance fails again with
/// the same truncation error, so a swallowed error never reads as a clean end.
pub struct TraceFileReader<R> {
    /// Underlying byte stream
    source: ByteSource<R>,

    /// Identifier used in errors and logs
    label: String,

    config: ReaderConfig,

    /// Header of the block currently being read
    block: Option<BlockHeader>,

    /// Records of the current block already handed out
    records_consumed: u32,

    /// Hop entries of the last record not read yet
    pending_hops: u32,

    /// First failure, repeated on every later advance
    failure: Option<Failure>,

    stats: ReaderStats,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Truncated { offset: u64, kind: TruncationKind },
    Io { offset: u64 },
}

impl TraceFileReader<File> {
    /// Opens a trace file for reading
    ///
    /// The file path is used as the source label unless `config.source_label` is set.
    pub fn open<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::new(file, path.display().to_string(), config))
    }
}

impl<R: Read> TraceFileReader<R> {
    /// Creates a reader over a stream positioned at the start of a trace file
    pub fn new(source: R, label: impl Into<String>, config: ReaderConfig) -> Self {
        let label = config.source_label.clone().unwrap_or_else(|| label.into());

        Self {
            source: ByteSource::new(source),
            label,
            config,
            block: None,
            records_consumed: 0,
            pending_hops: 0,
            failure: None,
            stats: ReaderStats::default(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Header of the most recently read block
    pub fn current_block(&self) -> Option<BlockHeader> {
        self.block
    }

    /// Number of records of the current block handed out so far
    pub fn records_consumed_in_block(&self) -> u32 {
        self.records_consumed
    }

    /// Bytes consumed from the source
    pub fn offset(&self) -> u64 {
        self.source.offset()
    }

    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            bytes_read: self.source.offset(),
            ..self.stats
        }
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_closed()
    }

    /// Releases the underlying source. Closing twice is a no-op.
    pub fn close(&mut self) {
        if !self.source.is_closed() {
            debug!(source = %self.label, offset = self.source.offset(), "closing trace file");
            self.source.close();
        }
    }

    /// Advances to the next run of records
    ///
    /// Returns a cursor over the remaining records of the current block, reading
    /// the next block header first when the current block is used up. Returns
    /// `Ok(None)` when the input ends exactly on a block boundary.
    ///
    /// Hops left unread from the previous record are read and discarded first.
    pub fn next_block(&mut self) -> Result<Option<RecordCursor<'_, R>>> {
        self.ensure_readable()?;
        self.drain_pending_hops()?;

        let block = match self.block {
            Some(block) if self.records_consumed < block.records() => block,
            _ => {
                if self.at_eof()? {
                    debug!(
                        source = %self.label,
                        blocks = self.stats.blocks,
                        records = self.stats.records,
                        "reached end of trace file"
                    );
                    return Ok(None);
                }
                self.read_block_header()?
            }
        };

        Ok(Some(RecordCursor::new(self, block)))
    }

    /// Turns the reader into an iterator of fully read records
    pub fn into_records(self) -> TraceRecordIterator<R> {
        TraceRecordIterator::new(self)
    }

    /// Reads the next record header of the current block
    pub(crate) fn next_record_header(&mut self) -> Result<Option<RecordHeader>> {
        self.ensure_readable()?;
        self.drain_pending_hops()?;

        let Some(block) = self.block else {
            return Ok(None);
        };
        if self.records_consumed >= block.records() {
            return Ok(None);
        }

        self.records_consumed += 1;
        let buf = self.read_section::<RECORD_HEADER_LEN>(TruncationKind::RecordHeader)?;
        let header = RecordHeader::decode(&buf);

        if header.hop_count < 0 {
            warn!(
                source = %self.label,
                destination = %header.destination,
                hop_count = header.hop_count,
                "negative hop count, reading record as empty"
            );
        }
        trace!(
            destination = %header.destination,
            hop_count = header.hop_count,
            record = self.records_consumed,
            "read record header"
        );

        self.pending_hops = header.hops();
        self.stats.records += 1;
        Ok(Some(header))
    }

    /// Reads the next hop entry of the current record
    pub(crate) fn next_hop(&mut self) -> Result<Option<Hop>> {
        if self.pending_hops == 0 {
            return Ok(None);
        }
        self.ensure_readable()?;

        let buf = self.read_section::<TRACE_ENTRY_LEN>(TruncationKind::TraceEntry)?;
        let hop = Hop::decode(&buf);

        if hop.ttl > self.config.max_ttl {
            return Err(self.fail(TruncationKind::TtlOutOfRange {
                ttl: hop.ttl,
                limit: self.config.max_ttl,
            }));
        }

        self.pending_hops -= 1;
        self.stats.hops += 1;
        Ok(Some(hop))
    }

    pub(crate) fn pending_hops(&self) -> u32 {
        self.pending_hops
    }

    fn ensure_readable(&self) -> Result<()> {
        if self.source.is_closed() {
            return Err(TraceFileError::Closed(self.label.clone()));
        }

        match self.failure {
            None => Ok(()),
            Some(Failure::Truncated { offset, kind }) => Err(TraceFileError::Truncated {
                label: self.label.clone(),
                offset,
                kind,
            }),
            Some(Failure::Io { offset }) => Err(TraceFileError::Failed {
                label: self.label.clone(),
                offset,
            }),
        }
    }

    fn drain_pending_hops(&mut self) -> Result<()> {
        if self.pending_hops > 0 {
            debug!(
                source = %self.label,
                hops = self.pending_hops,
                "skipping unread hops of previous record"
            );
            while self.next_hop()?.is_some() {}
        }
        Ok(())
    }

    fn at_eof(&mut self) -> Result<bool> {
        self.source.at_eof().map_err(|e| {
            self.failure = Some(Failure::Io {
                offset: self.source.offset(),
            });
            TraceFileError::Io(e)
        })
    }

    fn read_block_header(&mut self) -> Result<BlockHeader> {
        let buf = self.read_section::<BLOCK_HEADER_LEN>(TruncationKind::BlockHeader)?;
        let header = BlockHeader::decode(&buf);

        if header.record_count < 0 {
            warn!(
                source = %self.label,
                record_count = header.record_count,
                "negative record count, reading block as empty"
            );
        }
        debug!(
            source = %self.label,
            collector_id = header.collector_id,
            measurement_unit_id = header.measurement_unit_id,
            record_count = header.record_count,
            block_length = header.block_length,
            offset = self.source.offset(),
            "read block header"
        );

        self.block = Some(header);
        self.records_consumed = 0;
        self.stats.blocks += 1;
        Ok(header)
    }

    /// Reads exactly `N` bytes or fails the stream
    fn read_section<const N: usize>(&mut self, kind: TruncationKind) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        let filled = match self.source.read_into(&mut buf) {
            Ok(filled) => filled,
            Err(e) => {
                self.failure = Some(Failure::Io {
                    offset: self.source.offset(),
                });
                return Err(e.into());
            }
        };

        if filled < N {
            return Err(self.fail(kind));
        }
        Ok(buf)
    }

    fn fail(&mut self, kind: TruncationKind) -> TraceFileError {
        let offset = self.source.offset();
        self.failure = Some(Failure::Truncated { offset, kind });
        TraceFileError::Truncated {
            label: self.label.clone(),
            offset,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{reader, TraceFileBuilder};
    use std::io::Cursor;

    #[test]
    fn test_empty_input_ends_normally() {
        let mut reader = reader(Vec::new());
        assert!(reader.next_block().unwrap().is_none());
        assert_eq!(reader.current_block(), None);
        assert_eq!(reader.stats(), ReaderStats::default());
    }

    #[test]
    fn test_label_override_from_config() {
        let config = ReaderConfig {
            source_label: Some("planetlab1.dojima.wide.ad.jp".to_string()),
            ..Default::default()
        };
        let reader = TraceFileReader::new(Cursor::new(Vec::new()), "trace.out", config);
        assert_eq!(reader.label(), "planetlab1.dojima.wide.ad.jp");
    }

    #[test]
    fn test_block_state_visible_after_advance() {
        let bytes = TraceFileBuilder::new()
            .block(1, 2, 1, 0)
            .record([10, 0, 0, 1], 0)
            .build();
        let mut reader = reader(bytes);

        {
            let cursor = reader.next_block().unwrap().unwrap();
            assert_eq!(cursor.block().record_count, 1);
        }

        let header = reader.current_block().unwrap();
        assert_eq!(header.collector_id, 1);
        assert_eq!(header.measurement_unit_id, 2);
        assert_eq!(reader.records_consumed_in_block(), 0);
        assert_eq!(reader.offset(), 16);
    }

    #[test]
    fn test_pending_hops_drained_before_next_record() {
        let bytes = TraceFileBuilder::new()
            .block(1, 2, 2, 0)
            .record([10, 0, 0, 1], 2)
            .hop([10, 0, 0, 2], 1.0, 1)
            .hop([10, 0, 0, 3], 2.0, 2)
            .record([10, 0, 0, 9], 0)
            .build();
        let mut reader = reader(bytes);

        let mut records = reader.next_block().unwrap().unwrap();
        let first = records.next_record().unwrap().unwrap();
        assert_eq!(first.hop_count, 2);
        drop(first);

        let second = records.next_record().unwrap().unwrap();
        assert_eq!(second.destination.to_string(), "10.0.0.9");
        drop(second);
        drop(records);

        assert_eq!(reader.stats().hops, 2);
        assert!(reader.next_block().unwrap().is_none());
    }

    #[test]
    fn test_failure_is_sticky() {
        // Two records promised, the first one's hop is garbage
        let bytes = TraceFileBuilder::new()
            .block(1, 2, 2, 0)
            .record([10, 0, 0, 1], 1)
            .hop([10, 0, 0, 2], 1.0, 600)
            .record([10, 0, 0, 9], 0)
            .build();
        let mut reader = reader(bytes);
        let expected = TruncationKind::TtlOutOfRange { ttl: 600, limit: 512 };

        {
            let mut records = reader.next_block().unwrap().unwrap();
            let record = records.next_record().unwrap().unwrap();
            let hops: Vec<_> = record.hops.filter_map(|hop| hop.ok()).collect();
            assert!(hops.is_empty());

            let err = records.next_record().err().expect("Failed reader must keep failing");
            assert_eq!(err.kind(), Some(expected));
            assert_eq!(err.offset(), Some(36));
        }

        for _ in 0..2 {
            let err = reader.next_block().err().expect("Failed reader must keep failing");
            assert_eq!(err.kind(), Some(expected));
            assert_eq!(err.offset(), Some(36));
        }
    }

    #[test]
    fn test_closed_reader_errors() {
        let mut reader = reader(TraceFileBuilder::new().block(1, 2, 0, 0).build());
        reader.close();
        reader.close();

        assert!(reader.is_closed());
        assert!(matches!(
            reader.next_block(),
            Err(TraceFileError::Closed(label)) if label == "memory"
        ));
    }
}
