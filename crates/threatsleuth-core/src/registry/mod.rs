/// Threat registry: the process-lifetime record of what has been scanned
/// and what was flagged.
///
/// Holds two collections:
/// - `seen`: every [`FileIdentity`] observed since the last [`clear`](ThreatRegistry::clear).
/// - `threats`: detected [`ThreatRecord`]s in detection order, at most one per path.
///
/// The registry is the single source of truth for the `files_scanned` and
/// `threats_found` counters; nothing else counts files or threats.
pub mod export;

use crate::model::{FileIdentity, ThreatRecord};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use export::{EXPORT_HEADER, EXPORT_STATUS, TIMESTAMP_FORMAT};

/// A registry shared between the controller and a background scan worker.
///
/// The worker holds the write lock briefly per file; readers (stats, display)
/// take the read lock.
pub type SharedRegistry = Arc<RwLock<ThreatRegistry>>;

#[derive(Debug, Default)]
pub struct ThreatRegistry {
    seen: HashSet<FileIdentity>,
    threats: Vec<ThreatRecord>,
    /// Paths present in `threats`, for O(1) duplicate checks.
    threat_paths: HashSet<PathBuf>,
}

impl ThreatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh registry for sharing with a scan worker.
    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Mark `identity` as scanned. Returns `true` if it had not been seen before.
    pub fn register_scan(&mut self, identity: FileIdentity) -> bool {
        self.seen.insert(identity)
    }

    /// Store `record` unless a record for the same path already exists.
    /// Returns `true` if the record was stored.
    pub fn record_threat(&mut self, record: ThreatRecord) -> bool {
        if !self.threat_paths.insert(record.file_path.clone()) {
            return false;
        }
        self.threats.push(record);
        true
    }

    /// The last `n` threats in detection order (all of them if fewer exist).
    pub fn recent(&self, n: usize) -> &[ThreatRecord] {
        let start = self.threats.len().saturating_sub(n);
        &self.threats[start..]
    }

    /// Forget every identity and threat.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.threats.clear();
        self.threat_paths.clear();
    }

    pub fn threats(&self) -> &[ThreatRecord] {
        &self.threats
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.threat_paths.contains(path)
    }

    /// Number of distinct identities observed.
    pub fn files_scanned(&self) -> usize {
        self.seen.len()
    }

    pub fn threats_found(&self) -> usize {
        self.threats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty() && self.threats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threat(path: &str) -> ThreatRecord {
        ThreatRecord::suspicious_extension(path, ".exe")
    }

    #[test]
    fn register_scan_is_idempotent() {
        let mut reg = ThreatRegistry::new();
        let id = FileIdentity::new("/dl/a.exe", 20);
        assert!(reg.register_scan(id.clone()));
        assert!(!reg.register_scan(id));
        assert_eq!(reg.files_scanned(), 1);
    }

    #[test]
    fn same_path_new_size_counts_as_new_identity() {
        let mut reg = ThreatRegistry::new();
        assert!(reg.register_scan(FileIdentity::new("/dl/a.exe", 20)));
        assert!(reg.register_scan(FileIdentity::new("/dl/a.exe", 30)));
        assert_eq!(reg.files_scanned(), 2);
    }

    #[test]
    fn record_threat_rejects_duplicate_path() {
        let mut reg = ThreatRegistry::new();
        assert!(reg.record_threat(threat("/dl/a.exe")));
        assert!(!reg.record_threat(threat("/dl/a.exe")));
        assert!(reg.record_threat(threat("/dl/b.exe")));
        assert_eq!(reg.threats_found(), 2);
        assert!(reg.contains_path(Path::new("/dl/a.exe")));
    }

    #[test]
    fn recent_returns_tail_in_detection_order() {
        let mut reg = ThreatRegistry::new();
        for i in 0..5 {
            reg.record_threat(threat(&format!("/dl/{i}.exe")));
        }
        let tail: Vec<_> = reg
            .recent(2)
            .iter()
            .map(|t| t.file_path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(tail, vec!["/dl/3.exe", "/dl/4.exe"]);

        assert_eq!(reg.recent(50).len(), 5);
        assert!(reg.recent(0).is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let mut reg = ThreatRegistry::new();
        let id = FileIdentity::new("/dl/a.exe", 20);
        reg.register_scan(id.clone());
        reg.record_threat(threat("/dl/a.exe"));

        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.files_scanned(), 0);
        assert_eq!(reg.threats_found(), 0);

        // Previously seen identity and path are accepted again.
        assert!(reg.register_scan(id));
        assert!(reg.record_threat(threat("/dl/a.exe")));
    }
}
