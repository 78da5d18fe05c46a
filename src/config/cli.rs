use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "currency-etl")]
#[command(about = "Fetch currency rate snapshots and turn them into partitioned Parquet")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory of the local object store (overrides storage.base_path)
    #[arg(long, global = true)]
    pub storage_root: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log per-stage timing and memory")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch the latest snapshot and store the raw JSON
    Ingest {
        /// Also write a pretty-printed copy into this directory
        #[arg(long)]
        save_local: Option<PathBuf>,
    },
    /// Transform a stored raw snapshot into partitioned Parquet files
    Transform {
        /// Storage key of the raw snapshot
        #[arg(long)]
        source: String,

        /// Key prefix for the Parquet output (overrides storage.output_prefix)
        #[arg(long)]
        output_prefix: Option<String>,
    },
}

impl CliConfig {
    /// Loads the TOML file (or defaults) and applies command-line overrides.
    pub fn settings(&self) -> Result<TomlConfig> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(root) = &self.storage_root {
            settings.storage.base_path = root.clone();
        }
        if let Command::Transform {
            output_prefix: Some(prefix),
            ..
        } = &self.command
        {
            settings.storage.output_prefix = prefix.clone();
        }

        Ok(settings.resolve_api_key())
    }
}
