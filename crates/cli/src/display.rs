use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use iplane::{BlockHeader, Hop, TraceRecord};
use serde::Serialize;

use crate::lookup::Resolution;

/// Output format of the dumper
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented path listing, one record after another
    Text,
    /// One table per record
    Table,
    /// One JSON object per line
    Json,
}

impl OutputFormat {
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        <Self as ValueEnum>::from_str(name, true)
            .map_err(|_| anyhow::anyhow!("Unknown output format: {}", name))
    }
}

/// A hop prepared for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayHop {
    pub host: String,
    pub latency_ms: f32,
    pub ttl: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
}

/// Resolves a hop, showing `unknown_marker` for hops that did not answer
pub fn display_hop(hop: &Hop, resolution: &mut Resolution, unknown_marker: &str) -> DisplayHop {
    if hop.ttl == 0 {
        return DisplayHop {
            host: unknown_marker.to_string(),
            latency_ms: hop.latency_ms,
            ttl: hop.ttl,
            asn: resolution.has_asn().then(|| unknown_marker.to_string()),
        };
    }

    DisplayHop {
        host: resolution.hostname(hop.address),
        latency_ms: hop.latency_ms,
        ttl: hop.ttl,
        asn: resolution.asn(hop.address),
    }
}

pub fn block_line(block: &BlockHeader) -> String {
    format!(
        "cId={},uId={},record={},len={}",
        block.collector_id, block.measurement_unit_id, block.record_count, block.block_length
    )
}

pub fn record_heading(destination: impl std::fmt::Display, hop_count: i32) -> String {
    format!("Destination: {}\tTotal Hops: {}", destination, hop_count)
}

/// `--->` style line for the `index`-th hop (1-based)
pub fn hop_line(index: usize, hop: &DisplayHop) -> String {
    let mut line = format!(
        "{}>\t{}\tLatency: {:.6}",
        "-".repeat(index),
        hop.host,
        hop.latency_ms
    );
    if let Some(asn) = &hop.asn {
        line.push('\t');
        line.push_str(asn);
    }
    line
}

/// Table of one record's hops
pub fn hop_table(hops: &[DisplayHop], with_asn: bool) -> Table {
    let mut header = vec!["#", "Host", "Latency (ms)", "TTL"];
    if with_asn {
        header.push("AS");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for (i, hop) in hops.iter().enumerate() {
        let mut row = vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&hop.host),
            Cell::new(format!("{:.3}", hop.latency_ms)).set_alignment(CellAlignment::Right),
            Cell::new(hop.ttl).set_alignment(CellAlignment::Right),
        ];
        if with_asn {
            row.push(Cell::new(hop.asn.as_deref().unwrap_or_default()));
        }
        table.add_row(row);
    }

    table
}

/// JSON line payload: the decoded record plus its resolved hops
#[derive(Debug, Serialize)]
pub struct JsonRecord<'a> {
    pub source: &'a str,
    #[serde(flatten)]
    pub record: &'a TraceRecord,
    pub resolved: Vec<DisplayHop>,
}
