//! Command-line argument definitions and command handlers.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use threatsleuth_core::dashboard::DashboardState;
use threatsleuth_core::model::ThreatRecord;
use threatsleuth_core::registry::TIMESTAMP_FORMAT;
use threatsleuth_core::scanner::ScanOutcome;

/// Local host-security dashboard.
///
/// Flags files with suspicious extensions, and samples running processes
/// and network connections. All state lives in memory for one invocation.
#[derive(Parser, Debug)]
#[command(name = "threatsleuth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// JSON config file (or set THREATSLEUTH_CONFIG)
    #[arg(short, long, env = "THREATSLEUTH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override the suspicious-extension list, e.g. `.exe,.scr`
    #[arg(long, global = true, value_delimiter = ',')]
    pub denylist: Vec<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan one or more directories (default: Downloads)
    Scan(ScanArgs),

    /// Scan Downloads, Desktop and Documents
    FullScan(ExportArgs),

    /// List running processes
    Processes(LimitArgs),

    /// List network connections with a remote peer
    Connections(LimitArgs),

    /// Scan the default path, poll processes and connections, print counters
    Stats,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directories to scan
    pub paths: Vec<PathBuf>,

    /// Scan the same paths this many times (later passes report only new threats)
    #[arg(long, default_value_t = 1)]
    pub repeat: usize,

    /// Run the scan on a worker thread and stream progress
    #[arg(long)]
    pub background: bool,

    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write all detected threats to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LimitArgs {
    /// Maximum rows to print (default: configured display limit)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

pub fn run_scan(state: &mut DashboardState, args: &ScanArgs, json: bool) -> anyhow::Result<()> {
    let paths = if args.paths.is_empty() {
        vec![state.config().default_scan_path.clone()]
    } else {
        args.paths.clone()
    };

    for pass in 1..=args.repeat.max(1) {
        let outcome = if args.background {
            scan_in_background(state, paths.clone())?
        } else {
            state.scan_paths(&paths)?
        };
        if !json {
            print_outcome(pass, &outcome);
        }
    }

    finish(state, args.export.export.as_ref(), json)
}

pub fn run_full_scan(
    state: &mut DashboardState,
    args: &ExportArgs,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = state.full_scan()?;
    if !json {
        print_outcome(1, &outcome);
    }
    finish(state, args.export.as_ref(), json)
}

fn scan_in_background(
    state: &mut DashboardState,
    paths: Vec<PathBuf>,
) -> anyhow::Result<ScanOutcome> {
    state.start_background_scan(paths)?;
    while state.is_scanning() {
        state.process_scan_messages();
        std::thread::sleep(Duration::from_millis(20));
    }
    Ok(state.last_outcome.clone().unwrap_or_default())
}

fn finish(
    state: &mut DashboardState,
    export: Option<&PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(path) = export {
        let rows = state
            .export_results(path)
            .with_context(|| format!("exporting to {}", path.display()))?;
        if !json {
            println!("Exported {rows} records to {}", path.display());
        }
    }

    if json {
        let report = serde_json::json!({
            "snapshot": state.snapshot(),
            "recent_threats": state.recent_threats(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_threats(&state.recent_threats());
        print_snapshot(state);
    }
    Ok(())
}

pub fn run_processes(state: &mut DashboardState, args: &LimitArgs, json: bool) -> anyhow::Result<()> {
    state.refresh_processes();
    let limit = args.limit.unwrap_or(state.config().sample_display_limit);
    let rows = &state.processes()[..state.processes().len().min(limit)];

    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    println!("{:>8}  {:<20} {:>7} {:>9}", "PID", "Name", "CPU %", "Memory %");
    for p in rows {
        println!(
            "{:>8}  {:<20} {:>7.1} {:>9.1}",
            p.pid,
            truncate(&p.name, 20),
            p.cpu_percent,
            p.memory_percent
        );
    }
    println!(
        "{} processes ({} skipped)",
        state.processes().len(),
        state.process_skips
    );
    Ok(())
}

pub fn run_connections(
    state: &mut DashboardState,
    args: &LimitArgs,
    json: bool,
) -> anyhow::Result<()> {
    state.refresh_network();
    let limit = args.limit.unwrap_or(state.config().sample_display_limit);
    let rows = &state.connections()[..state.connections().len().min(limit)];

    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    println!("{:>8}  {:<45} {:<45} {}", "PID", "Local", "Remote", "Status");
    for c in rows {
        let pid = c.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:>8}  {:<45} {:<45} {}",
            pid, c.local_endpoint, c.remote_endpoint, c.status
        );
    }
    println!(
        "{} connections ({} skipped)",
        state.connections().len(),
        state.connection_skips
    );
    Ok(())
}

pub fn run_stats(state: &mut DashboardState, json: bool) -> anyhow::Result<()> {
    state.quick_scan(None)?;
    state.refresh_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
    } else {
        print_snapshot(state);
    }
    Ok(())
}

fn print_outcome(pass: usize, outcome: &ScanOutcome) {
    println!(
        "Pass {pass}: {} files visited, {} new, {} new threats, {} unreadable",
        outcome.files_visited,
        outcome.files_new,
        outcome.new_threat_count(),
        outcome.skipped
    );
    if outcome.root_missing {
        println!("  warning: a scan path does not exist");
    }
}

fn print_threats(threats: &[ThreatRecord]) {
    if threats.is_empty() {
        return;
    }
    println!();
    println!("{:<43} {:<6} {:<30} Detected", "File", "Type", "Reason");
    for t in threats {
        println!(
            "{:<43} {:<6} {:<30} {}",
            truncate(&t.file_name(), 40),
            t.category,
            t.reason,
            t.detected_at.format(TIMESTAMP_FORMAT)
        );
    }
}

fn print_snapshot(state: &DashboardState) {
    let snap = state.snapshot();
    println!();
    println!("Files scanned:  {}", snap.files_scanned);
    println!("Threats found:  {}", snap.threats_found);
    println!("Processes:      {}", snap.processes);
    println!("Connections:    {}", snap.connections);
}

/// Cut `s` to `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}
