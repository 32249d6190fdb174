/// The four counters shown on the dashboard.
///
/// Never stored between refreshes: always rebuilt by
/// [`crate::stats::recompute`] from the registry and the latest samples.
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SystemSnapshot {
    /// Distinct `(path, size)` identities observed since the last clear.
    pub files_scanned: usize,
    /// Threat records currently held by the registry.
    pub threats_found: usize,
    /// Processes in the latest process poll.
    pub processes: usize,
    /// Peer-connected sockets in the latest connection poll.
    pub connections: usize,
}
