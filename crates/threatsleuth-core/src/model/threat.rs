/// A single detected suspicious file.
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What kind of artefact a threat was raised for.
///
/// Only filesystem detections exist today; the enum leaves room for other
/// sources without changing the export format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatCategory {
    File,
}

impl ThreatCategory {
    /// Label used in the `Type` column of the export.
    pub fn label(self) -> &'static str {
        match self {
            Self::File => "FILE",
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// One detection. The registry keeps at most one record per `file_path`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThreatRecord {
    pub file_path: PathBuf,
    pub category: ThreatCategory,
    /// Human-readable cause, e.g. `Suspicious extension .exe`.
    pub reason: String,
    pub detected_at: DateTime<Local>,
}

impl ThreatRecord {
    /// A file flagged because its extension is on the denylist.
    ///
    /// `ext` is the dotted, lower-cased extension that matched.
    pub fn suspicious_extension(file_path: impl Into<PathBuf>, ext: &str) -> Self {
        Self {
            file_path: file_path.into(),
            category: ThreatCategory::File,
            reason: format!("Suspicious extension {ext}"),
            detected_at: Local::now(),
        }
    }

    /// The final path component, for compact display.
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspicious_extension_reason_text() {
        let rec = ThreatRecord::suspicious_extension("/dl/setup.exe", ".exe");
        assert_eq!(rec.reason, "Suspicious extension .exe");
        assert_eq!(rec.category, ThreatCategory::File);
        assert_eq!(rec.file_name(), "setup.exe");
    }

    #[test]
    fn category_label_is_upper_case() {
        assert_eq!(ThreatCategory::File.to_string(), "FILE");
    }

    #[test]
    fn category_display_honours_width() {
        assert_eq!(format!("[{:<6}]", ThreatCategory::File), "[FILE  ]");
        assert_eq!(format!("[{:>6}]", ThreatCategory::File), "[  FILE]");
    }
}
