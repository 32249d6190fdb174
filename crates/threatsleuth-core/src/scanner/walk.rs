/// Directory walker using `jwalk`.
///
/// Visits every non-directory entry under a root, registers its
/// [`FileIdentity`] with the scan target, and classifies it against the
/// denylist the first time that identity is observed. Per-entry errors are
/// counted and reported, never fatal.
use super::{CancelToken, ScanOptions, ScanOutcome, ScanTarget};
use crate::model::{FileIdentity, ThreatRecord};
use crate::scanner::denylist::Denylist;
use crate::scanner::progress::ScanProgress;
use crossbeam_channel::Sender;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Walk `root` and fold the results into `outcome`.
///
/// Stops early, setting `outcome.cancelled`, as soon as `cancel` is
/// observed between two entries.
pub(crate) fn scan_root<T: ScanTarget + ?Sized>(
    target: &mut T,
    root: &Path,
    denylist: &Denylist,
    cancel: &CancelToken,
    options: &ScanOptions,
    progress_tx: Option<&Sender<ScanProgress>>,
    outcome: &mut ScanOutcome,
) {
    if !root.exists() {
        warn!("Scan root {} does not exist; nothing to scan", root.display());
        outcome.root_missing = true;
        return;
    }

    let start = Instant::now();
    let threats_before = outcome.new_threats.len();
    info!("Scanning {}", root.display());

    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .parallelism(options.parallelism());

    let mut entries: u64 = 0;

    for entry_result in walker {
        if cancel.is_cancelled() {
            debug!("Scan of {} cancelled after {entries} entries", root.display());
            outcome.cancelled = true;
            return;
        }
        entries += 1;

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                // jwalk errors are typically access-denied on directories.
                report_skip(&err, progress_tx, outcome);
                continue;
            }
        };

        // An unreadable directory is still yielded; only its children are lost.
        if let Some(err) = entry.read_children_error.as_ref() {
            report_skip(err, progress_tx, outcome);
        }

        let path = entry.path();
        let file_type = entry.file_type();
        if path == root || file_type.is_dir() {
            continue;
        }
        // Links are not followed, so a link to a directory is neither walked
        // nor classified.
        if file_type.is_symlink() && fs::metadata(&path).is_ok_and(|m| m.is_dir()) {
            debug!("Skipping directory link {}", path.display());
            continue;
        }

        outcome.files_visited += 1;
        let (identity, readable) = FileIdentity::observe(&path);
        if !readable {
            outcome.unsized_files += 1;
            debug!("Could not stat {}; recording size 0", path.display());
        }

        if target.register_scan(identity) {
            outcome.files_new += 1;
            if let Some(ext) = denylist.matches(&path) {
                let record = ThreatRecord::suspicious_extension(path.clone(), &ext);
                if target.record_threat(record.clone()) {
                    debug!("Flagged {} ({})", path.display(), record.reason);
                    if let Some(tx) = progress_tx {
                        let _ = tx.send(ScanProgress::ThreatDetected(record.clone()));
                    }
                    outcome.new_threats.push(record);
                }
            }
        }

        if let Some(tx) = progress_tx {
            if entries.is_multiple_of(options.progress_interval) {
                let _ = tx.send(ScanProgress::Update {
                    files_visited: outcome.files_visited,
                    files_new: outcome.files_new,
                    threats_found: outcome.new_threats.len() as u64,
                    current_path: path.to_string_lossy().into_owned(),
                });
            }
        }
    }

    info!(
        "Scan of {} complete: {} new threats in {:?}",
        root.display(),
        outcome.new_threats.len() - threats_before,
        start.elapsed()
    );
}

fn report_skip(
    err: &jwalk::Error,
    progress_tx: Option<&Sender<ScanProgress>>,
    outcome: &mut ScanOutcome,
) {
    outcome.skipped += 1;
    let err_path = err
        .path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("Skipping unreadable entry {err_path}: {err}");
    if let Some(tx) = progress_tx {
        let _ = tx.send(ScanProgress::Error {
            path: err_path,
            message: err.to_string(),
        });
    }
}
