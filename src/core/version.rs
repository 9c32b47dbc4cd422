//! Version folders - scanning and labeling `vNN` directories

use serde::{Serialize, Serializer};
use std::fmt;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// A version folder label
///
/// Displays as `v01`, `v02`, ... zero-padded to two digits; larger
/// numbers widen naturally (`v100`). Parsing accepts any digit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionLabel(u32);

impl VersionLabel {
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:02}", self.0)
    }
}

impl Serialize for VersionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a directory name of the form `v<digits>`
///
/// Anything else (`ver4`, `v1a`, `V2`, bare `v`) is not a version folder.
pub fn parse_version_dir(name: &str) -> Option<u32> {
    let digits = name.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Version numbers present under a CAD directory, ascending
///
/// Only first-level directories count; a file named like `v03` does not.
/// A missing directory reads as empty.
pub fn existing_versions(cad_dir: &Path) -> io::Result<Vec<u32>> {
    if !cad_dir.exists() {
        return Ok(Vec::new());
    }
    let mut versions = Vec::new();
    for entry in WalkDir::new(cad_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(n) = entry.file_name().to_str().and_then(parse_version_dir) {
            versions.push(n);
        }
    }
    versions.sort_unstable();
    Ok(versions)
}

/// Next version to write: one past the highest existing, or `v01`
///
/// No locking; two simultaneous exports into the same folder could
/// compute the same number, which is out of scope for a per-user tool.
pub fn next_version(cad_dir: &Path) -> io::Result<VersionLabel> {
    let versions = existing_versions(cad_dir)?;
    Ok(VersionLabel::new(versions.last().map_or(1, |max| max + 1)))
}

/// Versioned base name for exported files: `<project>_v03`
pub fn versioned_name(project: &str, label: VersionLabel) -> String {
    format!("{}_{}", project, label)
}
