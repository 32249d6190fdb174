/// Scan progress reporting: lightweight messages sent from the scan
/// thread to the controller via a crossbeam channel.
use super::ScanOutcome;
use crate::model::ThreatRecord;
use std::path::PathBuf;
use std::time::Duration;

/// Progress updates sent from the scan thread.
///
/// The registry itself is shared; these messages carry counters, newly
/// detected threats, and the terminal outcome.
#[derive(Debug)]
pub enum ScanProgress {
    /// Walking of one root has begun.
    Started { root: PathBuf },
    /// Periodic update with running totals.
    Update {
        files_visited: u64,
        files_new: u64,
        threats_found: u64,
        current_path: String,
    },
    /// A file was flagged and accepted by the registry.
    ThreatDetected(ThreatRecord),
    /// A non-fatal error (e.g. permission denied on one directory).
    Error { path: String, message: String },
    /// All roots were walked.
    Complete {
        outcome: ScanOutcome,
        duration: Duration,
    },
    /// The scan stopped early; `outcome` holds the partial result.
    Cancelled { outcome: ScanOutcome },
}
