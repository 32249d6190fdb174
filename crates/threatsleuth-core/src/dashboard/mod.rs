/// Dashboard controller state.
///
/// Centralises all mutable state a front end reads and writes: the threat
/// registry, the latest process and connection samples, and the activity
/// log. Counters are never stored here; [`DashboardState::snapshot`]
/// derives them on demand.
///
/// Scans can run inline ([`quick_scan`](DashboardState::quick_scan),
/// [`full_scan`](DashboardState::full_scan)) or on a worker thread
/// ([`start_background_scan`](DashboardState::start_background_scan)),
/// whose messages are drained by
/// [`process_scan_messages`](DashboardState::process_scan_messages).
pub mod activity;

use crate::collector::{
    default_connection_source, default_process_source, ConnectionSource, ProcessSource,
};
use crate::config::DashboardConfig;
use crate::error::{ExportError, ScanError};
use crate::model::{ConnectionSample, ProcessSample, SystemSnapshot, ThreatRecord};
use crate::registry::{SharedRegistry, ThreatRegistry};
use crate::scanner::progress::ScanProgress;
use crate::scanner::{self, CancelToken, Denylist, ScanHandle, ScanOutcome};
use crate::stats;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use activity::{ActivityEntry, ActivityLog};

/// Maximum number of scan-progress messages drained per call.
///
/// Prevents a backlog from stalling the caller's thread for a
/// perceptible duration.
const MAX_MESSAGES_PER_CALL: usize = 300;

pub struct DashboardState {
    registry: SharedRegistry,
    processes: Vec<ProcessSample>,
    connections: Vec<ConnectionSample>,
    /// Records skipped by the latest process poll.
    pub process_skips: usize,
    /// Tables or records skipped by the latest connection poll.
    pub connection_skips: usize,
    activity: ActivityLog,
    config: DashboardConfig,
    denylist: Denylist,
    process_source: Box<dyn ProcessSource>,
    connection_source: Box<dyn ConnectionSource>,
    scan_handle: Option<ScanHandle>,
    /// Result of the most recent finished scan, inline or background.
    pub last_outcome: Option<ScanOutcome>,
}

impl DashboardState {
    /// State backed by the platform's process and connection collectors.
    pub fn new(config: DashboardConfig) -> Self {
        Self::with_sources(config, default_process_source(), default_connection_source())
    }

    pub fn with_sources(
        config: DashboardConfig,
        process_source: Box<dyn ProcessSource>,
        connection_source: Box<dyn ConnectionSource>,
    ) -> Self {
        Self {
            registry: ThreatRegistry::shared(),
            processes: Vec::new(),
            connections: Vec::new(),
            process_skips: 0,
            connection_skips: 0,
            activity: ActivityLog::new(config.activity_log_capacity),
            denylist: config.denylist(),
            config,
            process_source,
            connection_source,
            scan_handle: None,
            last_outcome: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Handle to the registry, e.g. for a display layer reading it directly.
    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    // ── Scanning ────────────────────────────────────────────────────────

    /// Scan one root on the calling thread (the configured default when
    /// `path` is `None`).
    pub fn quick_scan(&mut self, path: Option<&Path>) -> Result<ScanOutcome, ScanError> {
        self.ensure_idle()?;
        let root = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.default_scan_path.clone());
        self.activity
            .push(format!("Starting quick scan: {}", root.display()));
        let outcome = self.scan_inline(std::slice::from_ref(&root));
        self.activity.push(format!(
            "Scan complete. New threats found: {}",
            outcome.new_threat_count()
        ));
        Ok(outcome)
    }

    /// Scan every configured full-scan root on the calling thread.
    pub fn full_scan(&mut self) -> Result<ScanOutcome, ScanError> {
        self.ensure_idle()?;
        self.activity.push("Starting full system scan");
        let roots = self.config.full_scan_paths.clone();
        let outcome = self.scan_inline(&roots);
        self.activity.push(format!(
            "Full scan complete. New threats found: {}",
            outcome.new_threat_count()
        ));
        Ok(outcome)
    }

    /// Scan an explicit list of roots on the calling thread.
    pub fn scan_paths(&mut self, roots: &[PathBuf]) -> Result<ScanOutcome, ScanError> {
        self.ensure_idle()?;
        self.activity
            .push(format!("Starting scan of {} path(s)", roots.len()));
        let outcome = self.scan_inline(roots);
        self.activity.push(format!(
            "Scan complete. New threats found: {}",
            outcome.new_threat_count()
        ));
        Ok(outcome)
    }

    fn ensure_idle(&self) -> Result<(), ScanError> {
        if self.is_scanning() {
            return Err(ScanError::Busy);
        }
        Ok(())
    }

    fn scan_inline(&mut self, roots: &[PathBuf]) -> ScanOutcome {
        let outcome = {
            let mut registry = self.registry.write();
            scanner::scan_many(
                &mut *registry,
                roots,
                &self.denylist,
                &CancelToken::new(),
                &self.config.scan_options(),
            )
        };
        self.note_outcome(&outcome);
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Start scanning `roots` on a worker thread.
    pub fn start_background_scan(&mut self, roots: Vec<PathBuf>) -> Result<(), ScanError> {
        self.ensure_idle()?;
        self.activity
            .push(format!("Starting background scan of {} root(s)", roots.len()));
        let handle = scanner::start_scan(
            self.registry.clone(),
            roots,
            self.denylist.clone(),
            self.config.scan_options(),
        )
        .map_err(ScanError::Spawn)?;
        self.scan_handle = Some(handle);
        Ok(())
    }

    /// Request the running background scan to stop.
    pub fn cancel_scan(&self) {
        if let Some(ref handle) = self.scan_handle {
            handle.cancel();
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_handle.is_some()
    }

    /// Drain pending background-scan messages.
    ///
    /// Returns `true` if anything changed. Once the terminal message
    /// arrives the handle is dropped and [`Self::last_outcome`] is set.
    pub fn process_scan_messages(&mut self) -> bool {
        let Some(handle) = self.scan_handle.as_ref() else {
            return false;
        };

        let mut changed = false;
        let mut finished: Option<(ScanOutcome, bool)> = None;

        for _ in 0..MAX_MESSAGES_PER_CALL {
            let msg = match handle.progress_rx.try_recv() {
                Ok(m) => m,
                Err(crossbeam_channel::TryRecvError::Empty) => break,
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    // Worker exited without a terminal message.
                    finished = Some((ScanOutcome::default(), true));
                    break;
                }
            };
            changed = true;

            match msg {
                ScanProgress::Started { root } => {
                    debug!("Background scan entered {}", root.display());
                }
                ScanProgress::Update {
                    files_visited,
                    current_path,
                    ..
                } => {
                    debug!("Scanned {files_visited} files, at {current_path}");
                }
                ScanProgress::ThreatDetected(record) => {
                    debug!("Threat detected: {}", record.file_path.display());
                }
                ScanProgress::Error { path, message } => {
                    debug!("Scan error at {path}: {message}");
                }
                ScanProgress::Complete { outcome, .. } => {
                    finished = Some((outcome, false));
                    break;
                }
                ScanProgress::Cancelled { outcome } => {
                    finished = Some((outcome, true));
                    break;
                }
            }
        }

        if let Some((outcome, cancelled)) = finished {
            self.scan_handle = None;
            self.note_outcome(&outcome);
            self.activity.push(if cancelled {
                format!(
                    "Scan cancelled. New threats found before stopping: {}",
                    outcome.new_threat_count()
                )
            } else {
                format!(
                    "Background scan complete. New threats found: {}",
                    outcome.new_threat_count()
                )
            });
            self.last_outcome = Some(outcome);
            changed = true;
        }

        changed
    }

    fn note_outcome(&mut self, outcome: &ScanOutcome) {
        if outcome.root_missing {
            self.activity.push("Warning: a scan path does not exist");
        }
        if outcome.skipped > 0 {
            self.activity
                .push(format!("{} entries could not be read", outcome.skipped));
        }
    }

    // ── Registry operations ─────────────────────────────────────────────

    /// Forget all scanned files and threats.
    ///
    /// Refused while a background scan is running: the worker is the only
    /// writer until it reports a terminal message.
    pub fn clear_results(&mut self) -> Result<(), ScanError> {
        self.ensure_idle()?;
        self.registry.write().clear();
        self.last_outcome = None;
        self.activity.push("Scan results cleared");
        Ok(())
    }

    /// Export all threats as CSV to `path`.
    pub fn export_results(&mut self, path: &Path) -> Result<usize, ExportError> {
        let result = {
            let registry = self.registry.read();
            if registry.threats_found() == 0 {
                return Err(ExportError::NothingToExport);
            }
            registry.export_to_path(path)
        };
        match &result {
            Ok(rows) => self
                .activity
                .push(format!("Exported {rows} records to {}", path.display())),
            Err(e) => self.activity.push(format!("Export failed: {e}")),
        }
        result
    }

    /// The most recent threats, up to the configured display window.
    pub fn recent_threats(&self) -> Vec<ThreatRecord> {
        self.registry
            .read()
            .recent(self.config.recent_threats_window)
            .to_vec()
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    /// Replace the process samples with a fresh poll.
    pub fn refresh_processes(&mut self) -> usize {
        let outcome = self.process_source.poll();
        self.process_skips = outcome.skipped;
        self.processes = outcome.samples;
        if self.process_skips > 0 {
            debug!("{} processes skipped during poll", self.process_skips);
        }
        self.processes.len()
    }

    /// Replace the connection samples with a fresh poll.
    pub fn refresh_network(&mut self) -> usize {
        let outcome = self.connection_source.poll();
        self.connection_skips = outcome.skipped;
        self.connections = outcome.samples;
        if self.connection_skips > 0 {
            debug!("{} connection records skipped during poll", self.connection_skips);
        }
        self.connections.len()
    }

    /// Refresh both snapshot sources.
    pub fn refresh_all(&mut self) {
        self.refresh_processes();
        self.refresh_network();
    }

    pub fn processes(&self) -> &[ProcessSample] {
        &self.processes
    }

    pub fn connections(&self) -> &[ConnectionSample] {
        &self.connections
    }

    /// Leading window of the latest process poll.
    pub fn visible_processes(&self) -> &[ProcessSample] {
        let n = self.processes.len().min(self.config.sample_display_limit);
        &self.processes[..n]
    }

    /// Leading window of the latest connection poll.
    pub fn visible_connections(&self) -> &[ConnectionSample] {
        let n = self.connections.len().min(self.config.sample_display_limit);
        &self.connections[..n]
    }

    /// The four dashboard counters for the current state.
    pub fn snapshot(&self) -> SystemSnapshot {
        stats::recompute(&self.registry.read(), &self.processes, &self.connections)
    }
}
