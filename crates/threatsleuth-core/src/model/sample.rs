/// Point-in-time samples returned by the snapshot collectors.
///
/// Samples are ephemeral: each poll builds a fresh `Vec` and the dashboard
/// replaces its previous one wholesale.
use compact_str::CompactString;
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;

/// One row of the process table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessSample {
    pub pid: i32,
    pub name: CompactString,
    /// CPU usage in percent of one core.
    pub cpu_percent: f32,
    /// Resident memory in percent of total physical memory.
    pub memory_percent: f32,
}

/// Socket state as reported by the OS.
///
/// `None` is used for connectionless sockets (UDP) that nevertheless have a
/// fixed peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    None,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Established => "ESTABLISHED",
            Self::SynSent => "SYN_SENT",
            Self::SynRecv => "SYN_RECV",
            Self::FinWait1 => "FIN_WAIT1",
            Self::FinWait2 => "FIN_WAIT2",
            Self::TimeWait => "TIME_WAIT",
            Self::Close => "CLOSE",
            Self::CloseWait => "CLOSE_WAIT",
            Self::LastAck => "LAST_ACK",
            Self::Listen => "LISTEN",
            Self::Closing => "CLOSING",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// One socket with a remote peer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConnectionSample {
    /// Owning process, when it could be resolved.
    pub pid: Option<i32>,
    pub local_endpoint: String,
    pub remote_endpoint: String,
    pub status: ConnectionStatus,
}

impl ConnectionSample {
    /// Build a sample from raw socket addresses.
    ///
    /// Returns `None` when `remote` has no peer (unspecified address and
    /// port 0), which is how listening and unbound sockets appear.
    pub fn from_addrs(
        pid: Option<i32>,
        local: SocketAddr,
        remote: SocketAddr,
        status: ConnectionStatus,
    ) -> Option<Self> {
        if !has_peer(&remote) {
            return None;
        }
        Some(Self {
            pid,
            local_endpoint: local.to_string(),
            remote_endpoint: remote.to_string(),
            status,
        })
    }
}

/// `true` if the address names an actual remote endpoint.
pub fn has_peer(addr: &SocketAddr) -> bool {
    !(addr.ip().is_unspecified() && addr.port() == 0)
}
