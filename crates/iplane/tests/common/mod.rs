//! Shared helpers for building trace files in memory
#![allow(dead_code)]

use std::io::{Cursor, Read};

use iplane::{BlockHeader, ReaderConfig, Result, TraceFileReader};

/// Assembles raw trace file bytes field by field
#[derive(Default)]
pub struct TraceFileBuilder {
    bytes: Vec<u8>,
}

impl TraceFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(
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

    pub fn record(mut self, destination: [u8; 4], hop_count: i32) -> Self {
        self.bytes.extend_from_slice(&destination);
        self.bytes.extend_from_slice(&hop_count.to_le_bytes());
        self
    }

    pub fn hop(mut self, address: [u8; 4], latency_ms: f32, ttl: i32) -> Self {
        self.bytes.extend_from_slice(&address);
        self.bytes.extend_from_slice(&latency_ms.to_le_bytes());
        self.bytes.extend_from_slice(&ttl.to_le_bytes());
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

pub fn reader_for(bytes: Vec<u8>) -> TraceFileReader<Cursor<Vec<u8>>> {
    TraceFileReader::new(Cursor::new(bytes), "memory", ReaderConfig::default())
}

/// Flattened view of one decoded record
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub block: BlockHeader,
    pub destination: String,
    pub hop_count: i32,
    pub hops: Vec<(String, f32, i32)>,
}

/// Walks the whole file through the lazy cursors
pub fn decode_all<R: Read>(reader: &mut TraceFileReader<R>) -> Result<Vec<Decoded>> {
    let mut decoded = Vec::new();

    while let Some(mut records) = reader.next_block()? {
        let block = records.block();
        while let Some(record) = records.next_record()? {
            let destination = record.destination.to_string();
            let hop_count = record.hop_count;
            let mut hops = Vec::new();
            for hop in record.hops {
                let hop = hop?;
                hops.push((hop.address.to_string(), hop.latency_ms, hop.ttl));
            }
            decoded.push(Decoded {
                block,
                destination,
                hop_count,
                hops,
            });
        }
    }

    Ok(decoded)
}
