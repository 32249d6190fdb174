/// End-to-end tests for `DashboardState`: the controller state object.
///
/// Real filesystem scans run against `tempfile` trees; the process and
/// connection sources are replaced by fixed fakes so the counters are
/// deterministic.
use compact_str::CompactString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use threatsleuth_core::collector::{ConnectionSource, PollOutcome, ProcessSource};
use threatsleuth_core::config::DashboardConfig;
use threatsleuth_core::dashboard::DashboardState;
use threatsleuth_core::error::{ExportError, ScanError};
use threatsleuth_core::model::{ConnectionSample, ConnectionStatus, ProcessSample, SystemSnapshot};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct FakeProcesses(usize);

impl ProcessSource for FakeProcesses {
    fn poll(&self) -> PollOutcome<ProcessSample> {
        let samples = (0..self.0)
            .map(|i| ProcessSample {
                pid: i as i32 + 1,
                name: CompactString::new(format!("proc{i}")),
                cpu_percent: 0.5,
                memory_percent: 1.0,
            })
            .collect();
        // One process "exited" mid-enumeration.
        PollOutcome::new(samples, 1)
    }
}

struct FakeConnections(usize);

impl ConnectionSource for FakeConnections {
    fn poll(&self) -> PollOutcome<ConnectionSample> {
        let samples = (0..self.0)
            .map(|i| ConnectionSample {
                pid: Some(100),
                local_endpoint: format!("10.0.0.2:{}", 40_000 + i),
                remote_endpoint: "93.184.216.34:443".to_string(),
                status: ConnectionStatus::Established,
            })
            .collect();
        PollOutcome::new(samples, 0)
    }
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

fn make_temp_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_bytes(&tmp.path().join("a.txt"), 10);
    write_bytes(&tmp.path().join("b.exe"), 20);
    tmp
}

fn config_for(root: &Path) -> DashboardConfig {
    DashboardConfig {
        default_scan_path: root.to_path_buf(),
        full_scan_paths: vec![root.to_path_buf()],
        walk_threads: 1,
        progress_interval: 1,
        ..DashboardConfig::default()
    }
}

fn state_for(root: &Path, processes: usize, connections: usize) -> DashboardState {
    DashboardState::with_sources(
        config_for(root),
        Box::new(FakeProcesses(processes)),
        Box::new(FakeConnections(connections)),
    )
}

/// Pump `process_scan_messages()` until the background scan finishes.
fn pump_until_done(state: &mut DashboardState) {
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    while state.is_scanning() {
        assert!(
            std::time::Instant::now() < deadline,
            "scan did not complete within 30 seconds"
        );
        state.process_scan_messages();
        std::thread::sleep(Duration::from_millis(10));
    }
}

// ── Scans ─────────────────────────────────────────────────────────────────────

#[test]
fn quick_scan_updates_snapshot() {
    let tmp = make_temp_tree();
    let mut state = state_for(tmp.path(), 0, 0);

    let outcome = state.quick_scan(None).unwrap();
    assert_eq!(outcome.new_threat_count(), 1);

    let snap = state.snapshot();
    assert_eq!(snap.files_scanned, 2);
    assert_eq!(snap.threats_found, 1);
}

#[test]
fn repeated_quick_scans_never_inflate_counts() {
    let tmp = make_temp_tree();
    let mut state = state_for(tmp.path(), 0, 0);

    state.quick_scan(Some(tmp.path())).unwrap();
    let first = state.snapshot();
    for _ in 0..3 {
        let outcome = state.quick_scan(Some(tmp.path())).unwrap();
        assert_eq!(outcome.new_threat_count(), 0);
    }
    assert_eq!(state.snapshot(), first);
}

#[test]
fn full_scan_walks_every_configured_root() {
    let one = make_temp_tree();
    let two = TempDir::new().unwrap();
    write_bytes(&two.path().join("macro.vbs"), 3);

    let mut config = config_for(one.path());
    config.full_scan_paths = vec![one.path().to_path_buf(), two.path().to_path_buf()];
    let mut state = DashboardState::with_sources(
        config,
        Box::new(FakeProcesses(0)),
        Box::new(FakeConnections(0)),
    );

    let outcome = state.full_scan().unwrap();
    assert_eq!(outcome.new_threat_count(), 2);
    assert_eq!(state.snapshot().files_scanned, 3);
    assert!(state
        .activity()
        .latest()
        .unwrap()
        .message
        .starts_with("Full scan complete"));
}

#[test]
fn missing_scan_path_is_logged_not_failed() {
    let tmp = TempDir::new().unwrap();
    let mut state = state_for(tmp.path(), 0, 0);

    let outcome = state.quick_scan(Some(tmp.path().join("gone").as_path())).unwrap();
    assert!(outcome.root_missing);
    assert!(state
        .activity()
        .entries()
        .any(|e| e.message.contains("does not exist")));
}

#[test]
fn background_scan_completes_and_sets_outcome() {
    let tmp = make_temp_tree();
    let mut state = state_for(tmp.path(), 0, 0);

    state
        .start_background_scan(vec![tmp.path().to_path_buf()])
        .unwrap();
    assert!(state.is_scanning());
    assert!(matches!(
        state.quick_scan(None),
        Err(ScanError::Busy)
    ));

    pump_until_done(&mut state);

    let outcome = state.last_outcome.as_ref().expect("outcome recorded");
    assert_eq!(outcome.new_threat_count(), 1);
    assert_eq!(state.snapshot().threats_found, 1);
}

#[test]
fn cancelling_background_scan_returns_to_idle() {
    let tmp = make_temp_tree();
    let mut state = state_for(tmp.path(), 0, 0);

    state
        .start_background_scan(vec![tmp.path().to_path_buf()])
        .unwrap();
    state.cancel_scan();
    pump_until_done(&mut state);

    assert!(!state.is_scanning());
    assert!(state.last_outcome.is_some());
}

// ── Clear / export ────────────────────────────────────────────────────────────

#[test]
fn clear_resets_counts_and_allows_redetection() {
    let tmp = make_temp_tree();
    let mut state = state_for(tmp.path(), 0, 0);

    state.quick_scan(None).unwrap();
    state.clear_results().unwrap();
    let snap = state.snapshot();
    assert_eq!((snap.files_scanned, snap.threats_found), (0, 0));
    assert!(state.recent_threats().is_empty());

    let outcome = state.quick_scan(None).unwrap();
    assert_eq!(outcome.new_threat_count(), 1);
}

#[test]
fn clear_is_refused_while_background_scan_runs() {
    let tmp = TempDir::new().unwrap();
    for i in 0..50 {
        write_bytes(&tmp.path().join(format!("t{i}.exe")), 1);
    }
    let mut state = state_for(tmp.path(), 0, 0);

    state
        .start_background_scan(vec![tmp.path().to_path_buf()])
        .unwrap();
    assert!(matches!(state.clear_results(), Err(ScanError::Busy)));

    pump_until_done(&mut state);

    // Registry and reported outcome agree once the worker has finished.
    let reported = state.last_outcome.as_ref().unwrap().new_threat_count();
    assert_eq!(reported, 50);
    assert_eq!(state.snapshot().threats_found, reported);

    state.clear_results().unwrap();
    assert_eq!(state.snapshot().threats_found, 0);
}

#[test]
fn export_with_no_threats_is_refused() {
    let tmp = TempDir::new().unwrap();
    let mut state = state_for(tmp.path(), 0, 0);
    let dest = tmp.path().join("out.csv");

    assert!(matches!(
        state.export_results(&dest),
        Err(ExportError::NothingToExport)
    ));
    assert!(!dest.exists());
}

#[test]
fn export_writes_all_threats() {
    let tmp = make_temp_tree();
    write_bytes(&tmp.path().join("c.bat"), 5);
    let mut state = state_for(tmp.path(), 0, 0);
    state.quick_scan(None).unwrap();

    let out = TempDir::new().unwrap();
    let dest: PathBuf = out.path().join("threats.csv");
    assert_eq!(state.export_results(&dest).unwrap(), 2);

    let mut rdr = csv::Reader::from_path(&dest).unwrap();
    assert_eq!(rdr.records().count(), state.snapshot().threats_found);
}

#[test]
fn recent_threats_respects_window() {
    let tmp = TempDir::new().unwrap();
    for i in 0..5 {
        write_bytes(&tmp.path().join(format!("t{i}.exe")), 1);
    }
    let mut config = config_for(tmp.path());
    config.recent_threats_window = 3;
    let mut state = DashboardState::with_sources(
        config,
        Box::new(FakeProcesses(0)),
        Box::new(FakeConnections(0)),
    );
    state.quick_scan(None).unwrap();

    let recent = state.recent_threats();
    let names: Vec<_> = recent.iter().map(|t| t.file_name()).collect();
    assert_eq!(names, vec!["t2.exe", "t3.exe", "t4.exe"]);
}

// ── Snapshots ─────────────────────────────────────────────────────────────────

#[test]
fn polls_feed_snapshot_and_skip_counts() {
    let tmp = make_temp_tree();
    let mut state = state_for(tmp.path(), 150, 7);

    state.refresh_all();
    state.quick_scan(None).unwrap();

    assert_eq!(
        state.snapshot(),
        SystemSnapshot {
            files_scanned: 2,
            threats_found: 1,
            processes: 150,
            connections: 7,
        }
    );
    assert_eq!(state.process_skips, 1);
    assert_eq!(state.connection_skips, 0);
}

#[test]
fn refresh_replaces_previous_samples() {
    let tmp = TempDir::new().unwrap();
    let mut state = state_for(tmp.path(), 4, 2);
    state.refresh_all();
    state.refresh_all();
    assert_eq!(state.snapshot().processes, 4);
    assert_eq!(state.snapshot().connections, 2);
}

#[test]
fn visible_windows_cap_display_but_not_counts() {
    let tmp = TempDir::new().unwrap();
    let mut state = state_for(tmp.path(), 150, 120);
    state.refresh_all();

    assert_eq!(state.visible_processes().len(), 100);
    assert_eq!(state.visible_connections().len(), 100);
    assert_eq!(state.processes().len(), 150);
    assert_eq!(state.snapshot().connections, 120);
}

#[test]
fn scan_paths_covers_each_listed_root() {
    let one = make_temp_tree();
    let two = TempDir::new().unwrap();
    write_bytes(&two.path().join("run.ps1"), 4);
    let mut state = state_for(one.path(), 0, 0);

    let roots = vec![one.path().to_path_buf(), two.path().to_path_buf()];
    let outcome = state.scan_paths(&roots).unwrap();
    assert_eq!(outcome.new_threat_count(), 2);
    assert_eq!(outcome.files_visited, 3);

    let again = state.scan_paths(&roots).unwrap();
    assert_eq!(again.new_threat_count(), 0);
    assert_eq!(state.snapshot().files_scanned, 3);
}
