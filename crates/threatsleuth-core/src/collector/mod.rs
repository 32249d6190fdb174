/// Snapshot collectors for the process table and inet connections.
///
/// Collectors are stateless across calls: every [`poll`](ProcessSource::poll)
/// reads the OS tables afresh and returns a complete point-in-time sample.
/// A record that disappears or cannot be read mid-enumeration is skipped
/// and counted in [`PollOutcome::skipped`]; it never fails the whole poll.
///
/// On Linux both sources read `/proc` through the `procfs` crate. Other
/// platforms get [`UnsupportedPlatform`], which always returns an empty
/// outcome.
#[cfg(target_os = "linux")]
pub mod network;
#[cfg(target_os = "linux")]
pub mod process;

use crate::model::{ConnectionSample, ProcessSample};
#[cfg(not(target_os = "linux"))]
use tracing::warn;

/// Samples from one poll plus the number of records that had to be skipped.
#[derive(Clone, Debug)]
pub struct PollOutcome<T> {
    pub samples: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for PollOutcome<T> {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> PollOutcome<T> {
    pub fn new(samples: Vec<T>, skipped: usize) -> Self {
        Self { samples, skipped }
    }
}

/// Anything that can enumerate running processes.
pub trait ProcessSource: Send {
    fn poll(&self) -> PollOutcome<ProcessSample>;
}

/// Anything that can enumerate inet connections with a remote peer.
pub trait ConnectionSource: Send {
    fn poll(&self) -> PollOutcome<ConnectionSample>;
}

/// Placeholder source for platforms without a collector implementation.
#[cfg(not(target_os = "linux"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedPlatform;

#[cfg(not(target_os = "linux"))]
impl ProcessSource for UnsupportedPlatform {
    fn poll(&self) -> PollOutcome<ProcessSample> {
        warn!("{}", crate::error::CollectError::Unsupported);
        PollOutcome::default()
    }
}

#[cfg(not(target_os = "linux"))]
impl ConnectionSource for UnsupportedPlatform {
    fn poll(&self) -> PollOutcome<ConnectionSample> {
        warn!("{}", crate::error::CollectError::Unsupported);
        PollOutcome::default()
    }
}

/// The process source for the current platform.
pub fn default_process_source() -> Box<dyn ProcessSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(process::ProcfsProcessCollector)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(UnsupportedPlatform)
    }
}

/// The connection source for the current platform.
pub fn default_connection_source() -> Box<dyn ConnectionSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(network::ProcfsConnectionCollector)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(UnsupportedPlatform)
    }
}
