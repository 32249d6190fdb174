/// Error types for the detection engine.
///
/// Per-item errors (`ScanError`, `CollectError`) are recovered where they
/// occur and surface only as skip counts and `debug!` logs. `ExportError`
/// and `ConfigError` are operation-level failures returned to the caller.
use std::path::PathBuf;
use thiserror::Error;

/// A filesystem entry that could not be read during a scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot access {path}: {source}")]
    PathAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan root not found: {0}")]
    PathNotFound(PathBuf),

    #[error("a background scan is already running")]
    Busy,

    #[error("failed to start scanner thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A single OS record (process or socket table) that could not be read.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("process {pid} unavailable: {message}")]
    ProcessAccess { pid: i32, message: String },

    #[error("connection table {table} unavailable: {message}")]
    ConnectionAccess { table: &'static str, message: String },

    #[error("system table {table} unavailable: {message}")]
    SystemInfo { table: &'static str, message: String },

    #[error("snapshot collection is not supported on this platform")]
    Unsupported,
}

/// Failure while writing the threat export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("no threats to export")]
    NothingToExport,
}

/// Failure while loading the dashboard configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
