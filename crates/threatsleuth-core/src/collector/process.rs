/// Process table collector backed by `/proc`.
use super::{PollOutcome, ProcessSource};
use crate::error::CollectError;
use crate::model::ProcessSample;
use compact_str::CompactString;
use procfs::prelude::*;
use tracing::{debug, warn};

/// Reads `/proc/<pid>/stat` for every process.
///
/// `cpu_percent` is the lifetime average (total CPU time over wall time
/// since the process started), so a single poll gives a meaningful value
/// without sleeping between two samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcfsProcessCollector;

impl ProcessSource for ProcfsProcessCollector {
    fn poll(&self) -> PollOutcome<ProcessSample> {
        let mut outcome = PollOutcome::default();

        let ctx = match SystemContext::read() {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(error = %e, "cannot read system context; process poll is empty");
                return outcome;
            }
        };

        let all_procs = match procfs::process::all_processes() {
            Ok(iter) => iter,
            Err(e) => {
                warn!(error = %e, "cannot enumerate /proc; process poll is empty");
                return outcome;
            }
        };

        for entry in all_procs {
            let proc = match entry {
                Ok(p) => p,
                Err(e) => {
                    debug!(error = %e, "skipping inaccessible process");
                    outcome.skipped += 1;
                    continue;
                }
            };

            match sample_process(&proc, &ctx) {
                Ok(sample) => outcome.samples.push(sample),
                Err(e) => {
                    debug!(error = %e, "skipping process");
                    outcome.skipped += 1;
                }
            }
        }

        outcome
    }
}

/// System-wide values needed to turn raw counters into percentages.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SystemContext {
    pub uptime_secs: f64,
    pub ticks_per_sec: u64,
    pub page_size: u64,
    pub mem_total: u64,
}

impl SystemContext {
    fn read() -> Result<Self, CollectError> {
        let uptime = procfs::Uptime::current().map_err(|e| CollectError::SystemInfo {
            table: "/proc/uptime",
            message: e.to_string(),
        })?;
        let meminfo = procfs::Meminfo::current().map_err(|e| CollectError::SystemInfo {
            table: "/proc/meminfo",
            message: e.to_string(),
        })?;
        Ok(Self {
            uptime_secs: uptime.uptime,
            ticks_per_sec: procfs::ticks_per_second(),
            page_size: procfs::page_size(),
            mem_total: meminfo.mem_total,
        })
    }

    /// Lifetime-average CPU usage in percent of one core.
    #[allow(clippy::cast_precision_loss)]
    pub fn cpu_percent(&self, utime: u64, stime: u64, starttime: u64) -> f32 {
        if self.ticks_per_sec == 0 {
            return 0.0;
        }
        let ticks = self.ticks_per_sec as f64;
        let elapsed = self.uptime_secs - starttime as f64 / ticks;
        if elapsed <= 0.0 {
            return 0.0;
        }
        let cpu_secs = (utime + stime) as f64 / ticks;
        (cpu_secs / elapsed * 100.0) as f32
    }

    /// Resident set size in percent of physical memory.
    #[allow(clippy::cast_precision_loss)]
    pub fn memory_percent(&self, rss_pages: u64) -> f32 {
        if self.mem_total == 0 {
            return 0.0;
        }
        let rss_bytes = rss_pages.saturating_mul(self.page_size);
        (rss_bytes as f64 / self.mem_total as f64 * 100.0) as f32
    }
}

fn sample_process(
    proc: &procfs::process::Process,
    ctx: &SystemContext,
) -> Result<ProcessSample, CollectError> {
    let stat = proc.stat().map_err(|e| CollectError::ProcessAccess {
        pid: proc.pid,
        message: e.to_string(),
    })?;

    Ok(ProcessSample {
        pid: stat.pid,
        name: CompactString::new(&stat.comm),
        cpu_percent: ctx.cpu_percent(stat.utime, stat.stime, stat.starttime),
        memory_percent: ctx.memory_percent(stat.rss),
    })
}
