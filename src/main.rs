//! Phalanx CLI binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use phalanx::cli::args::*;
use phalanx::cli::commands::*;

/// Log to stderr as `[time level module] message`. Library messages name the
/// search id or node they concern.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .filter_level(level)
        // Dependencies (reqwest, hyper) only when debugging
        .filter_module("hyper", level.min(LevelFilter::Warn))
        .filter_module("reqwest", level.min(LevelFilter::Info))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                log_module(record.target()),
                record.args()
            )
        })
        .init();
}

/// Crate-relative module path of a log target, e.g. `search::distributed`.
fn log_module(target: &str) -> &str {
    target.strip_prefix("phalanx::").unwrap_or(target)
}

fn main() {
    let args = PhalanxArgs::parse();
    init_logging(args.verbosity());

    if let Err(e) = execute_command(args) {
        match e.node_url() {
            Some(node) => eprintln!("Error (node {node}): {e}"),
            None => eprintln!("Error: {e}"),
        }
        process::exit(1);
    }
}
