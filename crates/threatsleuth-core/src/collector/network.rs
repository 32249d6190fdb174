/// Inet connection collector backed by `/proc/net`.
use super::{ConnectionSource, PollOutcome};
use crate::error::CollectError;
use crate::model::{ConnectionSample, ConnectionStatus};
use procfs::net::TcpState;
use std::collections::HashMap;
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Reads the TCP and UDP tables (IPv4 and IPv6).
///
/// Owning pids are resolved by matching socket inodes against
/// `/proc/<pid>/fd`. Sockets owned by processes we may not inspect keep
/// `pid = None`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcfsConnectionCollector;

/// One raw socket row, independent of protocol.
struct RawSocket {
    local: SocketAddr,
    remote: SocketAddr,
    status: ConnectionStatus,
    inode: u64,
}

impl ConnectionSource for ProcfsConnectionCollector {
    fn poll(&self) -> PollOutcome<ConnectionSample> {
        let mut outcome = PollOutcome::default();
        let mut raw = Vec::new();

        for (table, rows) in [
            ("tcp", read_tcp(procfs::net::tcp())),
            ("tcp6", read_tcp(procfs::net::tcp6())),
            ("udp", read_udp(procfs::net::udp())),
            ("udp6", read_udp(procfs::net::udp6())),
        ] {
            match rows {
                Ok(mut rows) => raw.append(&mut rows),
                Err(message) => {
                    let err = CollectError::ConnectionAccess { table, message };
                    debug!(error = %err, "skipping connection table");
                    outcome.skipped += 1;
                }
            }
        }

        if outcome.skipped == 4 {
            warn!("no connection table could be read; connection poll is empty");
            return outcome;
        }

        let owners = socket_owners();
        outcome.samples = raw
            .into_iter()
            .filter_map(|s| {
                let pid = owners.get(&s.inode).copied();
                ConnectionSample::from_addrs(pid, s.local, s.remote, s.status)
            })
            .collect();
        outcome
    }
}

fn read_tcp(
    rows: procfs::ProcResult<Vec<procfs::net::TcpNetEntry>>,
) -> Result<Vec<RawSocket>, String> {
    let rows = rows.map_err(|e| e.to_string())?;
    Ok(rows
        .into_iter()
        .map(|e| RawSocket {
            local: e.local_address,
            remote: e.remote_address,
            status: tcp_status(&e.state),
            inode: e.inode,
        })
        .collect())
}

// UDP is connectionless; sockets with a fixed peer report no state.
fn read_udp(
    rows: procfs::ProcResult<Vec<procfs::net::UdpNetEntry>>,
) -> Result<Vec<RawSocket>, String> {
    let rows = rows.map_err(|e| e.to_string())?;
    Ok(rows
        .into_iter()
        .map(|e| RawSocket {
            local: e.local_address,
            remote: e.remote_address,
            status: ConnectionStatus::None,
            inode: e.inode,
        })
        .collect())
}

fn tcp_status(state: &TcpState) -> ConnectionStatus {
    match state {
        TcpState::Established => ConnectionStatus::Established,
        TcpState::SynSent => ConnectionStatus::SynSent,
        TcpState::SynRecv => ConnectionStatus::SynRecv,
        TcpState::FinWait1 => ConnectionStatus::FinWait1,
        TcpState::FinWait2 => ConnectionStatus::FinWait2,
        TcpState::TimeWait => ConnectionStatus::TimeWait,
        TcpState::Close => ConnectionStatus::Close,
        TcpState::CloseWait => ConnectionStatus::CloseWait,
        TcpState::LastAck => ConnectionStatus::LastAck,
        TcpState::Listen => ConnectionStatus::Listen,
        TcpState::Closing => ConnectionStatus::Closing,
        // NEW_SYN_RECV
        _ => ConnectionStatus::SynRecv,
    }
}

/// Map socket inode -> owning pid, for every process whose fds we can read.
fn socket_owners() -> HashMap<u64, i32> {
    let mut owners = HashMap::new();
    let Ok(all_procs) = procfs::process::all_processes() else {
        return owners;
    };

    for proc in all_procs.flatten() {
        let Ok(fds) = proc.fd() else {
            continue;
        };
        for fd in fds.flatten() {
            if let procfs::process::FDTarget::Socket(inode) = fd.target {
                owners.entry(inode).or_insert(proc.pid);
            }
        }
    }
    owners
}
