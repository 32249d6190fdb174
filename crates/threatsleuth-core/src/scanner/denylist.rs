/// Extension denylist: the classification rule for suspicious files.
///
/// Extensions are stored dotted and lower-cased (`.exe`), so `payload.EXE`
/// and `payload.exe` classify identically.
use compact_str::{format_compact, CompactString};
use std::collections::HashSet;
use std::path::Path;

/// Extensions flagged when no custom denylist is configured.
pub const DEFAULT_SUSPICIOUS_EXTENSIONS: [&str; 5] = [".exe", ".bat", ".vbs", ".ps1", ".js"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Denylist {
    extensions: HashSet<CompactString>,
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(DEFAULT_SUSPICIOUS_EXTENSIONS)
    }
}

impl Denylist {
    /// Build a denylist from arbitrary extension strings.
    ///
    /// Accepts `exe`, `.exe` or `.EXE` alike. Blank entries are ignored.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalise(ext.as_ref()))
            .collect();
        Self { extensions }
    }

    /// Whether the dotted extension `ext` is on the list (case-insensitive).
    pub fn contains(&self, ext: &str) -> bool {
        normalise(ext).is_some_and(|e| self.extensions.contains(&e))
    }

    /// Classify `path`. Returns the matched dotted, lower-cased extension.
    pub fn matches(&self, path: &Path) -> Option<CompactString> {
        extension_of(path).filter(|ext| self.extensions.contains(ext))
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// The extensions in sorted order, for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.extensions.iter().map(|e| e.as_str()).collect();
        v.sort_unstable();
        v
    }
}

/// The dotted, lower-cased extension of `path`'s file name.
///
/// Follows [`Path::extension`]: the text after the last `.`, with dot-files
/// such as `.bashrc` having no extension.
pub fn extension_of(path: &Path) -> Option<CompactString> {
    let ext = path.extension()?.to_string_lossy();
    if ext.is_empty() {
        return None;
    }
    Some(format_compact!(".{}", ext.to_lowercase()))
}

fn normalise(ext: &str) -> Option<CompactString> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format_compact!(".{}", trimmed.to_lowercase()))
}
