//! Path and content rules: exclusion patterns, self-protection and
//! classification markers.

use crate::codec;
use crate::config::ShieldConfig;
use std::char::REPLACEMENT_CHARACTER;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Characters inspected when filtering a scan by classification
pub const SCAN_WINDOW_CHARS: usize = 500;
/// Characters inspected when detecting which classification a file carries
pub const DETECT_WINDOW_CHARS: usize = 1000;

// Names under which this tool itself may appear in a tree
const SELF_FILE_NAMES: &[&str] = &["artifact-shield", "artifact-shield.exe"];

#[derive(Debug, Clone)]
pub struct Classifier {
    exclude_patterns: Vec<String>,
    classifications: Vec<String>,
}

impl Classifier {
    pub fn new(config: &ShieldConfig) -> Self {
        Self {
            exclude_patterns: config.exclude_patterns.clone(),
            classifications: config.classifications.clone(),
        }
    }

    /// True if any exclude pattern occurs in the path, or the path is this tool
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        if self
            .exclude_patterns
            .iter()
            .any(|pattern| path_str.contains(pattern.as_str()))
        {
            return true;
        }

        is_self(path)
    }

    /// True if `label` occurs in the leading text of the file
    pub fn has_classification(&self, path: &Path, label: &str) -> bool {
        match leading_text(path, SCAN_WINDOW_CHARS) {
            Some(text) => text.contains(label),
            None => false,
        }
    }

    /// First configured classification found in the leading text of the file
    pub fn detect_classification(&self, path: &Path) -> Option<&str> {
        let text = leading_text(path, DETECT_WINDOW_CHARS)?;
        self.classifications
            .iter()
            .find(|label| text.contains(label.as_str()))
            .map(String::as_str)
    }
}

fn is_self(path: &Path) -> bool {
    if path.ends_with(codec::SOURCE_PATH) {
        return true;
    }

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if SELF_FILE_NAMES.contains(&name) {
        return true;
    }

    match (std::env::current_exe(), path.canonicalize()) {
        (Ok(exe), Ok(path)) => exe == path,
        _ => false,
    }
}

/// Decode up to `max_chars` characters from the start of a file, dropping
/// invalid UTF-8 instead of failing.
fn leading_text(path: &Path, max_chars: usize) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut buf = Vec::new();
    // Each char is at most 4 bytes; extra headroom covers dropped invalid bytes
    file.take((max_chars * 8) as u64)
        .read_to_end(&mut buf)
        .ok()?;

    Some(
        String::from_utf8_lossy(&buf)
            .chars()
            .filter(|c| *c != REPLACEMENT_CHARACTER)
            .take(max_chars)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn classifier() -> Classifier {
        Classifier::new(&ShieldConfig::default())
    }

    #[test]
    fn test_exclude_patterns() {
        let c = classifier();
        assert!(c.should_exclude(Path::new("project/.git/config")));
        assert!(c.should_exclude(Path::new("web/node_modules/pkg/index.js")));
        assert!(c.should_exclude(Path::new("backups/shield-backup-1.zip")));
        assert!(c.should_exclude(Path::new("scripts/shield/tool.py")));
        assert!(!c.should_exclude(Path::new("secrets/a.txt")));
    }

    #[test]
    fn test_pattern_is_plain_substring() {
        // ".git" also matches ".github" and ".gitignore"
        let c = classifier();
        assert!(c.should_exclude(Path::new(".github/workflows/ci.yml")));
        assert!(c.should_exclude(Path::new("docs/.gitignore")));
    }

    #[test]
    fn test_self_exclusion() {
        let mut config = ShieldConfig::default();
        config.exclude_patterns.clear();
        let c = Classifier::new(&config);

        assert!(c.should_exclude(Path::new("repo/src/codec.rs")));
        assert!(c.should_exclude(Path::new("target/release/artifact-shield")));
        assert!(!c.should_exclude(Path::new("repo/src/other.rs")));
    }

    #[test]
    fn test_has_classification_within_window() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("memo.txt");
        fs::write(&path, "CLASSIFICATION: TOP_SECRET\nbody").unwrap();

        assert!(classifier().has_classification(&path, "TOP_SECRET"));
        assert!(!classifier().has_classification(&path, "RESTRICTED"));
    }

    #[test]
    fn test_has_classification_outside_window() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("memo.txt");
        let mut content = "x".repeat(SCAN_WINDOW_CHARS);
        content.push_str("TOP_SECRET");
        fs::write(&path, content).unwrap();

        assert!(!classifier().has_classification(&path, "TOP_SECRET"));
    }

    #[test]
    fn test_window_counts_characters_not_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("memo.txt");
        // 490 two-byte characters, then the label ends at char 500
        let mut content = "é".repeat(490);
        content.push_str("RESTRICTED");
        fs::write(&path, content).unwrap();

        assert!(classifier().has_classification(&path, "RESTRICTED"));
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");
        let mut content = vec![0xFF, 0xFE, 0x80];
        content.extend_from_slice(b"CONFIDENTIAL");
        fs::write(&path, content).unwrap();

        assert!(classifier().has_classification(&path, "CONFIDENTIAL"));
    }

    #[test]
    fn test_unreadable_file_has_no_classification() {
        assert!(!classifier().has_classification(Path::new("/nonexistent/file"), "TOP_SECRET"));
    }

    #[test]
    fn test_detect_classification_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("memo.txt");
        fs::write(&path, "RESTRICTED and also CONFIDENTIAL").unwrap();

        // Configured order wins, not position in the file
        assert_eq!(classifier().detect_classification(&path), Some("CONFIDENTIAL"));
    }

    #[test]
    fn test_detect_classification_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("memo.txt");
        fs::write(&path, "public notes").unwrap();

        assert_eq!(classifier().detect_classification(&path), None);
    }
}
