//! iPlane trace file layout
//!
//! This module defines the on-disk structures of the traceroute files published at
//! <http://iplane.cs.washington.edu/data/data.html>. All integers are little-endian,
//! addresses are stored in network byte order.

use std::net::Ipv4Addr;

use serde::Serialize;

/// Header preceding every block of records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub collector_id: i32,
    pub measurement_unit_id: i32,
    /// Number of records that follow
    pub record_count: i32,
    /// Declared byte length. Informational only, never used to seek.
    pub block_length: i32,
}

/// Header of one destination's traceroute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordHeader {
    pub destination: Ipv4Addr,
    /// Number of trace entries that follow
    pub hop_count: i32,
}

/// A single probe result along the path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hop {
    pub address: Ipv4Addr,
    pub latency_ms: f32,
    /// 0 marks a hop that did not answer
    pub ttl: i32,
}

/// Sizes and limits of the fixed layout
pub mod layout {
    /// cId, uId, record count, length
    pub const BLOCK_HEADER_LEN: usize = 16;
    /// destination, hop count
    pub const RECORD_HEADER_LEN: usize = 8;
    /// hop address, latency, ttl
    pub const TRACE_ENTRY_LEN: usize = 12;

    /// Largest ttl accepted before an entry is considered garbage
    pub const DEFAULT_MAX_TTL: i32 = 512;
}

fn le_i32(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn le_f32(buf: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn ipv4(buf: &[u8], at: usize) -> Ipv4Addr {
    Ipv4Addr::new(buf[at], buf[at + 1], buf[at + 2], buf[at + 3])
}

impl BlockHeader {
    pub fn decode(buf: &[u8; layout::BLOCK_HEADER_LEN]) -> Self {
        Self {
            collector_id: le_i32(buf, 0),
            measurement_unit_id: le_i32(buf, 4),
            record_count: le_i32(buf, 8),
            block_length: le_i32(buf, 12),
        }
    }

    /// Record count with negative values read as an empty block
    pub fn records(&self) -> u32 {
        self.record_count.max(0) as u32
    }
}

impl RecordHeader {
    pub fn decode(buf: &[u8; layout::RECORD_HEADER_LEN]) -> Self {
        Self {
            destination: ipv4(buf, 0),
            hop_count: le_i32(buf, 4),
        }
    }

    /// Hop count with negative values read as no hops
    pub fn hops(&self) -> u32 {
        self.hop_count.max(0) as u32
    }
}

impl Hop {
    pub fn decode(buf: &[u8; layout::TRACE_ENTRY_LEN]) -> Self {
        Self {
            address: ipv4(buf, 0),
            latency_ms: le_f32(buf, 4),
            ttl: le_i32(buf, 8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_block_header() {
        let mut buf = [0u8; layout::BLOCK_HEADER_LEN];
        buf[0..4].copy_from_slice(&7i32.to_le_bytes());
        buf[4..8].copy_from_slice(&(-3i32).to_le_bytes());
        buf[8..12].copy_from_slice(&1200i32.to_le_bytes());
        buf[12..16].copy_from_slice(&65536i32.to_le_bytes());

        let header = BlockHeader::decode(&buf);
        assert_eq!(header.collector_id, 7);
        assert_eq!(header.measurement_unit_id, -3);
        assert_eq!(header.record_count, 1200);
        assert_eq!(header.block_length, 65536);
        assert_eq!(header.records(), 1200);
    }

    #[test]
    fn test_negative_record_count_is_empty() {
        let mut buf = [0u8; layout::BLOCK_HEADER_LEN];
        buf[8..12].copy_from_slice(&(-1i32).to_le_bytes());

        assert_eq!(BlockHeader::decode(&buf).records(), 0);
    }

    #[test]
    fn test_decode_record_header_network_order_address() {
        let mut buf = [0u8; layout::RECORD_HEADER_LEN];
        buf[0..4].copy_from_slice(&[192, 168, 10, 254]);
        buf[4..8].copy_from_slice(&17i32.to_le_bytes());

        let header = RecordHeader::decode(&buf);
        assert_eq!(header.destination.to_string(), "192.168.10.254");
        assert_eq!(header.hop_count, 17);
        assert_eq!(header.hops(), 17);
    }

    #[test]
    fn test_decode_hop() {
        let mut buf = [0u8; layout::TRACE_ENTRY_LEN];
        buf[0..4].copy_from_slice(&[10, 0, 0, 2]);
        buf[4..8].copy_from_slice(&1.5f32.to_le_bytes());
        buf[8..12].copy_from_slice(&64i32.to_le_bytes());

        let hop = Hop::decode(&buf);
        assert_eq!(hop.address, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(hop.latency_ms, 1.5);
        assert_eq!(hop.ttl, 64);
    }
}
