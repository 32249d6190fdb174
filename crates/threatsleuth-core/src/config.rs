/// Dashboard configuration.
///
/// Every field has a default, so a config file only needs the keys it wants
/// to override:
///
/// ```json
/// { "denylist": [".exe", ".scr"], "walk_threads": 1 }
/// ```
use crate::error::ConfigError;
use crate::scanner::{Denylist, ScanOptions, DEFAULT_SUSPICIOUS_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Suspicious extensions, dotted or not, any case.
    pub denylist: Vec<String>,
    /// Root used when a scan is requested without a path.
    pub default_scan_path: PathBuf,
    /// Roots walked by a full scan.
    pub full_scan_paths: Vec<PathBuf>,
    /// How many of the most recent threats to surface for display.
    pub recent_threats_window: usize,
    /// Leading window of process/connection samples surfaced for display.
    pub sample_display_limit: usize,
    /// Maximum entries kept in the activity log.
    pub activity_log_capacity: usize,
    /// Threads in the directory walker pool; `0` or `1` walks serially.
    pub walk_threads: usize,
    /// Entries between scan progress updates.
    pub progress_interval: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let downloads = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
        let full_scan_paths = [dirs::download_dir(), dirs::desktop_dir(), dirs::document_dir()]
            .into_iter()
            .flatten()
            .collect();

        Self {
            denylist: DEFAULT_SUSPICIOUS_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            default_scan_path: downloads,
            full_scan_paths,
            recent_threats_window: 50,
            sample_display_limit: 100,
            activity_log_capacity: 200,
            walk_threads: num_cpus::get(),
            progress_interval: 1_000,
        }
    }
}

impl DashboardConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn denylist(&self) -> Denylist {
        Denylist::new(&self.denylist)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            walk_threads: self.walk_threads,
            progress_interval: self.progress_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.recent_threats_window, 50);
        assert_eq!(cfg.sample_display_limit, 100);
        assert_eq!(cfg.denylist(), Denylist::default());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "denylist": ["SCR"], "walk_threads": 1 }"#).unwrap();

        let cfg = DashboardConfig::load(&path).unwrap();
        assert_eq!(cfg.denylist().sorted(), vec![".scr"]);
        assert_eq!(cfg.scan_options().walk_threads, 1);
        assert_eq!(cfg.recent_threats_window, 50);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            DashboardConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            DashboardConfig::load(&tmp.path().join("nope.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
