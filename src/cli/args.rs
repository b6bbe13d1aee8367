//! Command line argument parsing for the Phalanx CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::AggregatorConfig;
use crate::error::{PhalanxError, Result};
use crate::search::{SearchKey, UseCache};

/// Phalanx - query a cluster of corpus search nodes as one
#[derive(Parser, Debug, Clone)]
#[command(name = "phalanx")]
#[command(about = "Distributed hits aggregator for corpus search nodes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct PhalanxArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "json")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl PhalanxArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Get a window of hits (or groups) from all nodes
    Hits(HitsArgs),

    /// Print the effective configuration
    Config(ClusterArgs),
}

/// Where to find the nodes.
#[derive(Parser, Debug, Clone)]
pub struct ClusterArgs {
    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "PHALANX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Node base URL; may be repeated. Added to the nodes from the config file.
    #[arg(short, long = "node", value_name = "URL")]
    pub nodes: Vec<String>,

    /// Node request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl ClusterArgs {
    /// Build the aggregator configuration.
    pub fn load_config(&self) -> Result<AggregatorConfig> {
        let mut config = match &self.config {
            Some(path) => AggregatorConfig::from_file(path)?,
            None => AggregatorConfig::default(),
        };
        config.nodes.extend(self.nodes.iter().cloned());
        if let Some(seconds) = self.timeout {
            config = config.with_request_timeout(std::time::Duration::from_secs(seconds));
        }
        if config.nodes.is_empty() {
            return Err(PhalanxError::invalid_config(
                "no nodes given; use --node or --config",
            ));
        }
        config.validate()?;
        Ok(config)
    }
}

/// Arguments for a hits request
#[derive(Parser, Debug, Clone)]
pub struct HitsArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Corpus to search
    #[arg(long)]
    pub corpus: String,

    /// Query pattern
    #[arg(long)]
    pub patt: String,

    /// Sort spec, e.g. "(field:year,hitposition)"
    #[arg(long, default_value = "")]
    pub sort: String,

    /// Group spec
    #[arg(long, default_value = "")]
    pub group: String,

    /// Group to view the hits of
    #[arg(long = "viewgroup", default_value = "")]
    pub view_group: String,

    /// First hit of the window
    #[arg(long, default_value = "0")]
    pub first: i64,

    /// Size of the window
    #[arg(long, default_value = "20")]
    pub number: i64,

    /// Cache policy (yes, no or nodes)
    #[arg(long = "usecache", default_value = "yes")]
    pub use_cache: String,
}

impl HitsArgs {
    /// The search these arguments describe.
    pub fn search_key(&self) -> SearchKey {
        SearchKey::new(self.corpus.clone(), self.patt.clone())
            .with_sort(self.sort.clone())
            .with_group(self.group.clone())
            .with_view_group(self.view_group.clone())
    }

    /// The requested cache policy.
    pub fn use_cache(&self) -> UseCache {
        UseCache::from_param(&self.use_cache)
    }
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable concordance
    Human,
    /// JSON
    Json,
}
