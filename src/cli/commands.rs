//! Command implementations for the Phalanx CLI.

use log::debug;
use tokio::runtime::Runtime;

use crate::aggregator::{Aggregator, HitsQuery};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::Result;

/// Execute a CLI command.
pub fn execute_command(args: PhalanxArgs) -> Result<()> {
    match &args.command {
        Command::Hits(hits_args) => run_hits(hits_args, &args),
        Command::Config(cluster_args) => show_config(cluster_args, &args),
    }
}

/// Run one hits request against the cluster.
fn run_hits(hits_args: &HitsArgs, cli_args: &PhalanxArgs) -> Result<()> {
    let config = hits_args.cluster.load_config()?;
    let query = HitsQuery {
        key: hits_args.search_key(),
        first: hits_args.first,
        number: hits_args.number,
        use_cache: hits_args.use_cache(),
    };
    debug!("Running {query:?} on {} nodes", config.nodes.len());

    let runtime = Runtime::new()?;
    let results = runtime.block_on(async {
        let aggregator = Aggregator::new(config)?;
        aggregator.hits(query).await
    })?;

    output_hits(&results, cli_args)
}

/// Print the effective configuration.
fn show_config(cluster_args: &ClusterArgs, cli_args: &PhalanxArgs) -> Result<()> {
    let config = cluster_args.load_config()?;
    output_json(&config, cli_args)
}
