//! ThreatSleuth: local host-security dashboard.
//!
//! Thin binary entry point. All logic lives in the `threatsleuth-core` crate.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use threatsleuth_core::config::DashboardConfig;
use threatsleuth_core::dashboard::DashboardState;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean.
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("ThreatSleuth starting");

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if !cli.denylist.is_empty() {
        config.denylist = cli.denylist.clone();
    }

    let mut state = DashboardState::new(config);

    match &cli.command {
        Commands::Scan(args) => cli::run_scan(&mut state, args, cli.json),
        Commands::FullScan(args) => cli::run_full_scan(&mut state, args, cli.json),
        Commands::Processes(args) => cli::run_processes(&mut state, args, cli.json),
        Commands::Connections(args) => cli::run_connections(&mut state, args, cli.json),
        Commands::Stats => cli::run_stats(&mut state, cli.json),
    }
}
