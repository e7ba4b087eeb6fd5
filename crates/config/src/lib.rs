use anyhow::{Context, Result};
use config_rs::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Trace file decoding settings
    #[serde(default)]
    pub reader: ReaderSettings,

    /// Output settings
    #[serde(default)]
    pub display: DisplaySettings,

    /// Offline address resolution tables
    #[serde(default)]
    pub resolve: ResolveSettings,
}

/// Settings passed through to the trace file reader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderSettings {
    /// Vantage point name shown instead of the file name (e.g. "planetlab1.dojima.wide.ad.jp")
    #[serde(default)]
    pub source_label: Option<String>,

    /// Trace entries with a larger ttl are treated as corruption (default: 512)
    #[serde(default = "default_max_ttl")]
    pub max_ttl: i32,
}

/// Settings for rendering decoded records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// One of "text", "table" or "json" (default: "text")
    #[serde(default = "default_format")]
    pub format: String,

    /// Placeholder shown for hops with ttl 0
    #[serde(default = "default_unknown_marker")]
    pub unknown_marker: String,

    /// Wait for Enter between records
    #[serde(default)]
    pub pause: bool,
}

/// Paths of the `<ipv4> <value>` mapping files
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResolveSettings {
    /// Address to hostname table
    #[serde(default)]
    pub hosts_file: Option<String>,

    /// Address to AS number table
    #[serde(default)]
    pub asn_file: Option<String>,
}

/// Output formats understood by the dumper
pub const FORMATS: [&str; 3] = ["text", "table", "json"];

// Default value functions
fn default_max_ttl() -> i32 {
    512
}

fn default_format() -> String {
    "text".to_string()
}

fn default_unknown_marker() -> String {
    "===UNKNOWN===".to_string()
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            source_label: None,
            max_ttl: default_max_ttl(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            unknown_marker: default_unknown_marker(),
            pause: false,
        }
    }
}

impl Config {
    /// Load Config with layered configuration priority:
    /// 1. Default values
    /// 2. TOML file (if provided)
    /// 3. Environment variables with the IPLANE_ prefix, sections separated by
    ///    a double underscore (e.g. IPLANE_READER__MAX_TTL=64)
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            // Reader defaults
            .set_default("reader.max_ttl", default_max_ttl())?
            // Display defaults
            .set_default("display.format", default_format())?
            .set_default("display.unknown_marker", default_unknown_marker())?
            .set_default("display.pause", false)?;

        // Add TOML file if provided
        if let Some(file_path) = config_file {
            let path = Path::new(file_path);
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("IPLANE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load Config from a TOML file
    ///
    /// Environment variables can still override values from the file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path = path
            .to_str()
            .with_context(|| format!("Configuration path is not UTF-8: {}", path.display()))?;
        Self::load(Some(path))
    }

    /// Create a new Config from environment variables with defaults
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Per-user configuration file, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("iplane").join("config.toml"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.reader.validate()?;
        self.display.validate()?;
        Ok(())
    }
}

impl ReaderSettings {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_ttl > 0, "reader.max_ttl must be positive, got {}", self.max_ttl);
        if let Some(label) = &self.source_label {
            anyhow::ensure!(!label.trim().is_empty(), "reader.source_label cannot be blank");
        }
        Ok(())
    }
}

impl DisplaySettings {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            FORMATS.contains(&self.format.as_str()),
            "display.format must be one of {:?}, got {:?}",
            FORMATS,
            self.format
        );
        Ok(())
    }
}
