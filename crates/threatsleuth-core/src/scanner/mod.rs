/// Scanner module: walks directory trees and flags denylisted files.
///
/// Two entry points share one algorithm:
/// - [`scan`] / [`scan_with`] / [`scan_many`] run inline on the calling
///   thread against any [`ScanTarget`], usually a `&mut ThreatRegistry`.
/// - [`start_scan`] runs on a background thread against a
///   [`SharedRegistry`], reporting [`ScanProgress`] over a bounded channel
///   and honouring [`ScanHandle::cancel`].
///
/// A file's classification is evaluated exactly once, on the first
/// observation of its `(path, size)` identity. Rescanning an unchanged
/// tree therefore yields no new threats.
pub mod denylist;
pub mod progress;
mod walk;

use crate::model::{FileIdentity, ThreatRecord};
use crate::registry::{SharedRegistry, ThreatRegistry};
use crossbeam_channel::Receiver;
use progress::ScanProgress;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;

pub use denylist::{extension_of, Denylist, DEFAULT_SUSPICIOUS_EXTENSIONS};

/// Maximum number of progress messages that may queue up in the channel.
///
/// If the controller stops draining, the scanner blocks rather than
/// consuming unbounded heap.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Where scan results go. Implemented by the registry itself and by the
/// shared, lock-guarded registry used by the background worker.
pub trait ScanTarget {
    /// Returns `true` if `identity` had not been observed before.
    fn register_scan(&mut self, identity: FileIdentity) -> bool;
    /// Returns `true` if the record was stored (no record for its path yet).
    fn record_threat(&mut self, record: ThreatRecord) -> bool;
}

impl ScanTarget for ThreatRegistry {
    fn register_scan(&mut self, identity: FileIdentity) -> bool {
        ThreatRegistry::register_scan(self, identity)
    }

    fn record_threat(&mut self, record: ThreatRecord) -> bool {
        ThreatRegistry::record_threat(self, record)
    }
}

// The write lock is held per call, so readers are never blocked for a
// whole walk.
impl ScanTarget for SharedRegistry {
    fn register_scan(&mut self, identity: FileIdentity) -> bool {
        self.write().register_scan(identity)
    }

    fn record_threat(&mut self, record: ThreatRecord) -> bool {
        self.write().record_threat(record)
    }
}

/// Cooperative cancellation signal, polled between directory entries.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tuning knobs for the walker.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Threads in the jwalk pool. `0` or `1` walks serially on the caller.
    pub walk_threads: usize,
    /// Entries between `ScanProgress::Update` messages.
    pub progress_interval: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            walk_threads: num_cpus::get(),
            progress_interval: 1_000,
        }
    }
}

impl ScanOptions {
    fn parallelism(&self) -> jwalk::Parallelism {
        if self.walk_threads <= 1 {
            jwalk::Parallelism::Serial
        } else {
            jwalk::Parallelism::RayonNewPool(self.walk_threads)
        }
    }
}

/// Result of one scan call.
#[derive(Clone, Debug, Default)]
pub struct ScanOutcome {
    /// Threats first detected by this call, in detection order.
    pub new_threats: Vec<ThreatRecord>,
    /// File entries visited, including already-seen ones.
    pub files_visited: u64,
    /// File entries whose identity was new to the registry.
    pub files_new: u64,
    /// Entries the walker could not read (typically directories).
    pub skipped: u64,
    /// Files whose size could not be read and were recorded as 0 bytes.
    pub unsized_files: u64,
    /// At least one requested root did not exist.
    pub root_missing: bool,
    /// The scan stopped early on request.
    pub cancelled: bool,
}

impl ScanOutcome {
    pub fn new_threat_count(&self) -> usize {
        self.new_threats.len()
    }
}

/// Scan `root` into `registry` on the calling thread.
pub fn scan(registry: &mut ThreatRegistry, root: &Path, denylist: &Denylist) -> ScanOutcome {
    scan_with(
        registry,
        root,
        denylist,
        &CancelToken::new(),
        &ScanOptions::default(),
    )
}

/// Scan `root` into any [`ScanTarget`] with explicit cancellation and options.
pub fn scan_with<T: ScanTarget + ?Sized>(
    target: &mut T,
    root: &Path,
    denylist: &Denylist,
    cancel: &CancelToken,
    options: &ScanOptions,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    walk::scan_root(target, root, denylist, cancel, options, None, &mut outcome);
    outcome
}

/// Scan several roots in order, merging the results into one outcome.
pub fn scan_many<T, P>(
    target: &mut T,
    roots: &[P],
    denylist: &Denylist,
    cancel: &CancelToken,
    options: &ScanOptions,
) -> ScanOutcome
where
    T: ScanTarget + ?Sized,
    P: AsRef<Path>,
{
    let mut outcome = ScanOutcome::default();
    for root in roots {
        walk::scan_root(
            target,
            root.as_ref(),
            denylist,
            cancel,
            options,
            None,
            &mut outcome,
        );
        if outcome.cancelled {
            break;
        }
    }
    outcome
}

/// Handle to a running or completed background scan.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    cancel: CancelToken,
    thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `true` once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }
}

/// Start scanning `roots` into `registry` on a background thread.
///
/// The worker is the registry's only writer while it runs. It always ends
/// with exactly one `Complete` or `Cancelled` message.
pub fn start_scan(
    registry: SharedRegistry,
    roots: Vec<PathBuf>,
    denylist: Denylist,
    options: ScanOptions,
) -> io::Result<ScanHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel = CancelToken::new();
    let cancel_clone = cancel.clone();

    let thread = thread::Builder::new()
        .name("threatsleuth-scanner".into())
        .spawn(move || {
            let start = Instant::now();
            let mut target = registry;
            let mut outcome = ScanOutcome::default();

            for root in &roots {
                let _ = progress_tx.send(ScanProgress::Started { root: root.clone() });
                walk::scan_root(
                    &mut target,
                    root,
                    &denylist,
                    &cancel_clone,
                    &options,
                    Some(&progress_tx),
                    &mut outcome,
                );
                if outcome.cancelled {
                    break;
                }
            }

            let duration = start.elapsed();
            info!(
                "Background scan finished in {duration:?}: {} new threats",
                outcome.new_threats.len()
            );
            let msg = if outcome.cancelled {
                ScanProgress::Cancelled { outcome }
            } else {
                ScanProgress::Complete { outcome, duration }
            };
            let _ = progress_tx.send(msg);
        })?;

    Ok(ScanHandle {
        progress_rx,
        cancel,
        thread: Some(thread),
    })
}
