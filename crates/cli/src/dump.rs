use anyhow::{Context, Result};
use iplane::{ReaderStats, TraceFileReader};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{Read, Write};
use tracing::info;

use crate::display::{self, DisplayHop, JsonRecord, OutputFormat};
use crate::lookup::Resolution;

/// Waits for the user between records
pub struct Pager {
    editor: Option<DefaultEditor>,
}

impl Pager {
    pub fn disabled() -> Self {
        Self { editor: None }
    }

    pub fn interactive() -> Result<Self> {
        let editor = DefaultEditor::new().context("Failed to create readline editor")?;
        Ok(Self {
            editor: Some(editor),
        })
    }

    /// Returns false once the user asked to stop
    pub fn wait(&mut self) -> Result<bool> {
        let Some(editor) = self.editor.as_mut() else {
            return Ok(true);
        };

        match editor.readline("Type Enter ... (next record)") {
            Ok(_) => Ok(true),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
            Err(err) => Err(err).context("Failed to read from terminal"),
        }
    }
}

/// Drives a reader and renders what it decodes
pub struct Dumper {
    resolution: Resolution,
    pager: Pager,
    unknown_marker: String,
}

impl Dumper {
    pub fn new(resolution: Resolution, pager: Pager, unknown_marker: impl Into<String>) -> Self {
        Self {
            resolution,
            pager,
            unknown_marker: unknown_marker.into(),
        }
    }

    pub fn dump<R: Read, W: Write>(
        &mut self,
        format: OutputFormat,
        reader: TraceFileReader<R>,
        out: &mut W,
    ) -> Result<ReaderStats> {
        let stats = match format {
            OutputFormat::Text => self.dump_text(reader, out)?,
            OutputFormat::Table => self.dump_table(reader, out)?,
            OutputFormat::Json => self.dump_json(reader, out)?,
        };
        self.resolution.log_cache_stats();
        Ok(stats)
    }

    fn dump_text<R: Read, W: Write>(
        &mut self,
        mut reader: TraceFileReader<R>,
        out: &mut W,
    ) -> Result<ReaderStats> {
        let source = reader.label().to_string();

        'blocks: while let Some(mut records) = reader.next_block()? {
            writeln!(out, "{}", display::block_line(&records.block()))?;

            while let Some(record) = records.next_record()? {
                writeln!(out, "{}", display::record_heading(record.destination, record.hop_count))?;
                writeln!(out)?;
                writeln!(out, "> {}", source)?;

                for (i, hop) in record.hops.enumerate() {
                    let hop = display::display_hop(&hop?, &mut self.resolution, &self.unknown_marker);
                    writeln!(out, "{}", display::hop_line(i + 1, &hop))?;
                }
                out.flush()?;

                if !self.pager.wait()? {
                    break 'blocks;
                }
            }
        }

        Ok(reader.stats())
    }

    fn dump_table<R: Read, W: Write>(
        &mut self,
        mut reader: TraceFileReader<R>,
        out: &mut W,
    ) -> Result<ReaderStats> {
        let source = reader.label().to_string();
        let with_asn = self.resolution.has_asn();

        'blocks: while let Some(mut records) = reader.next_block()? {
            writeln!(out, "{}", display::block_line(&records.block()))?;

            while let Some(record) = records.next_record()? {
                let mut hops = Vec::new();
                for hop in record.hops {
                    hops.push(display::display_hop(&hop?, &mut self.resolution, &self.unknown_marker));
                }

                writeln!(
                    out,
                    "{}\tSource: {}",
                    display::record_heading(record.destination, record.hop_count),
                    source
                )?;
                writeln!(out, "{}", display::hop_table(&hops, with_asn))?;
                out.flush()?;

                if !self.pager.wait()? {
                    break 'blocks;
                }
            }
        }

        Ok(reader.stats())
    }

    fn dump_json<R: Read, W: Write>(
        &mut self,
        reader: TraceFileReader<R>,
        out: &mut W,
    ) -> Result<ReaderStats> {
        let source = reader.label().to_string();
        let mut records = reader.into_records();

        for record in records.by_ref() {
            let record = record?;
            let resolved: Vec<DisplayHop> = record
                .hops
                .iter()
                .map(|hop| display::display_hop(hop, &mut self.resolution, &self.unknown_marker))
                .collect();

            let line = JsonRecord {
                source: &source,
                record: &record,
                resolved,
            };
            serde_json::to_writer(&mut *out, &line).context("Failed to write JSON record")?;
            writeln!(out)?;
        }

        Ok(records.reader().stats())
    }
}

/// Walks the whole file without rendering anything
pub fn summarize<R: Read>(mut reader: TraceFileReader<R>) -> Result<ReaderStats> {
    while let Some(mut records) = reader.next_block()? {
        // Unread hops are consumed by the next advance
        while records.next_record()?.is_some() {}
    }

    let stats = reader.stats();
    info!(
        source = reader.label(),
        blocks = stats.blocks,
        records = stats.records,
        hops = stats.hops,
        "summarized trace file"
    );
    Ok(stats)
}
