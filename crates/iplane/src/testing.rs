//! In-memory trace files for unit tests

use std::io::Cursor;

use crate::reader::{ReaderConfig, TraceFileReader};

/// Assembles raw trace file bytes field by field
#[derive(Default)]
pub(crate) struct TraceFileBuilder {
    bytes: Vec<u8>,
}

impl TraceFileBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn block(
        mut self,
        collector_id: i32,
        measurement_unit_id: i32,
        record_count: i32,
        block_length: i32,
    ) -> Self {
        for value in [collector_id, measurement_unit_id, record_count, block_length] {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub(crate) fn record(mut self, destination: [u8; 4], hop_count: i32) -> Self {
        self.bytes.extend_from_slice(&destination);
        self.bytes.extend_from_slice(&hop_count.to_le_bytes());
        self
    }

    pub(crate) fn hop(mut self, address: [u8; 4], latency_ms: f32, ttl: i32) -> Self {
        self.bytes.extend_from_slice(&address);
        self.bytes.extend_from_slice(&latency_ms.to_le_bytes());
        self.bytes.extend_from_slice(&ttl.to_le_bytes());
        self
    }

    pub(crate) fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.bytes
    }
}

pub(crate) fn reader(bytes: Vec<u8>) -> TraceFileReader<Cursor<Vec<u8>>> {
    TraceFileReader::new(Cursor::new(bytes), "memory", ReaderConfig::default())
}
