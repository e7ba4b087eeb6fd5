mod display;
mod dump;
mod lookup;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use display::OutputFormat;
use dump::{summarize, Dumper, Pager};
use humansize::{format_size, BINARY};
use iplane::{ReaderConfig, TraceFileReader};
use lookup::Resolution;
use std::path::PathBuf;
use tracing::{debug, error};

/// Dump iPlane traceroute files
#[derive(Parser, Debug)]
#[command(name = "iplane-dump")]
#[command(about = "Dump iPlane traceroute files", long_about = None)]
struct Args {
    /// Trace file to read (e.g. trace.out.planetlab1.dojima.wide.ad.jp)
    file: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Vantage point shown as the origin of every path (defaults to the file name)
    #[arg(short, long)]
    source: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Largest ttl accepted before a trace entry is treated as corrupt
    #[arg(long)]
    max_ttl: Option<i32>,

    /// `<ipv4> <hostname>` table used for reverse resolution
    #[arg(long)]
    hosts: Option<String>,

    /// `<ipv4> <AS>` table used for AS lookups
    #[arg(long)]
    asn: Option<String>,

    /// Wait for Enter after every record
    #[arg(short, long)]
    pause: bool,

    /// Only print block, record and hop totals
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    // Initialize tracing subscriber with environment filter
    // Set RUST_LOG environment variable to control log level
    // Example: RUST_LOG=debug or RUST_LOG=iplane=trace
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    debug!(?config, "loaded configuration");

    let reader_config = ReaderConfig {
        source_label: config.reader.source_label.clone(),
        max_ttl: config.reader.max_ttl,
    };
    let reader = TraceFileReader::open(&args.file, reader_config)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    let result = if args.summary {
        summarize(reader)
    } else {
        let format = match args.format {
            Some(format) => format,
            None => OutputFormat::parse(&config.display.format)?,
        };
        let resolution = Resolution::from_settings(&config.resolve)?;
        let pager = if config.display.pause {
            Pager::interactive()?
        } else {
            Pager::disabled()
        };

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        Dumper::new(resolution, pager, config.display.unknown_marker.as_str())
            .dump(format, reader, &mut out)
    };

    match result {
        Ok(stats) => {
            if args.summary {
                println!(
                    "blocks={} records={} hops={} bytes={}",
                    stats.blocks,
                    stats.records,
                    stats.hops,
                    format_size(stats.bytes_read, BINARY)
                );
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to read {}: {:#}", args.file.display(), e);
            Err(e)
        }
    }
}

/// Layers command-line flags over the configuration file and environment
fn load_config(args: &Args) -> Result<Config> {
    let config_file = args.config.clone().or_else(|| {
        Config::default_path()
            .filter(|path| path.exists())
            .map(|path| path.display().to_string())
    });

    let mut config = Config::load(config_file.as_deref())?;

    if let Some(source) = &args.source {
        config.reader.source_label = Some(source.clone());
    }
    if let Some(max_ttl) = args.max_ttl {
        config.reader.max_ttl = max_ttl;
    }
    if let Some(hosts) = &args.hosts {
        config.resolve.hosts_file = Some(hosts.clone());
    }
    if let Some(asn) = &args.asn {
        config.resolve.asn_file = Some(asn.clone());
    }
    if args.pause {
        config.display.pause = true;
    }

    config.validate()?;
    Ok(config)
}
