/// CSV export of the threat registry.
///
/// One header row followed by one row per threat in detection order:
///
/// ```text
/// File,Type,Reason,Timestamp,Status
/// /home/u/Downloads/b.exe,FILE,Suspicious extension .exe,2026-10-18 14:02:11,Detected
/// ```
///
/// Export only reads the registry; a failed export leaves it untouched.
use super::ThreatRegistry;
use crate::error::ExportError;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Column names of the export, in order.
pub const EXPORT_HEADER: [&str; 5] = ["File", "Type", "Reason", "Timestamp", "Status"];

/// Constant value of the `Status` column.
pub const EXPORT_STATUS: &str = "Detected";

/// `chrono` format string for the `Timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl ThreatRegistry {
    /// Stream every threat as CSV into `sink`.
    ///
    /// Returns the number of data rows written (the header is not counted).
    pub fn export<W: io::Write>(&self, sink: W) -> Result<usize, ExportError> {
        let mut wtr = csv::Writer::from_writer(sink);
        wtr.write_record(EXPORT_HEADER)?;

        for threat in &self.threats {
            let timestamp = threat.detected_at.format(TIMESTAMP_FORMAT).to_string();
            let file = threat.file_path.to_string_lossy();
            wtr.write_record([
                &*file,
                threat.category.label(),
                threat.reason.as_str(),
                timestamp.as_str(),
                EXPORT_STATUS,
            ])?;
        }

        wtr.flush().map_err(csv::Error::from)?;
        Ok(self.threats.len())
    }

    /// Write the export to `path`, replacing any existing file.
    ///
    /// Rows go to a temporary sibling first, which is renamed over `path`
    /// only after the whole export has been written and synced. On failure
    /// the temporary file is removed and `path` is left as it was.
    pub fn export_to_path(&self, path: &Path) -> Result<usize, ExportError> {
        let tmp = temp_sibling(path);
        debug!("Writing export to temporary file {}", tmp.display());

        let result = self.write_file(&tmp).and_then(|rows| {
            fs::rename(&tmp, path).map_err(|source| ExportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(rows)
        });

        match result {
            Ok(rows) => {
                info!("Exported {rows} threat records to {}", path.display());
                Ok(rows)
            }
            Err(err) => {
                let _ = fs::remove_file(&tmp);
                Err(err)
            }
        }
    }

    fn write_file(&self, tmp: &Path) -> Result<usize, ExportError> {
        let io_err = |source: io::Error| ExportError::Io {
            path: tmp.to_path_buf(),
            source,
        };
        let mut file = File::create(tmp).map_err(io_err)?;
        let rows = self.export(&mut file)?;
        file.sync_all().map_err(io_err)?;
        Ok(rows)
    }
}

/// `dir/.name.tmp` next to the destination so the final rename stays on
/// one filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
