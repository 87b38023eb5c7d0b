//! Project name extraction from `Cargo.toml`.
//!
//! Only the first `name = "..."` line counts, the same way a line-oriented
//! grep over the manifest would see it. Hyphens become underscores because
//! that is how rustc names the artifacts and instrumentation files.

use crate::errors::{CcovError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;

static NAME_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*name\s*=\s*"([^"]*)""#).unwrap());

/// Normalized crate name used as the artifact prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName(String);

impl ProjectName {
    /// Normalize a raw package name. Returns `None` for blank names.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.replace('-', "_")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Glob prefix for stale build artifacts: `<name>-*`.
    pub fn artifact_pattern(&self) -> String {
        format!("{}-*", self.0)
    }

    /// Whether `file_name` is instrumentation data belonging to this project.
    pub fn owns_instrumentation_file(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.0)
            && (file_name.ends_with(".gcda") || file_name.ends_with(".gcno"))
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Find the first `name = "..."` line in manifest text (pure function)
pub fn find_name_line(contents: &str) -> Option<&str> {
    contents
        .lines()
        .find_map(|line| NAME_LINE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extract and normalize the project name from manifest text.
///
/// `path` is only used for the error message.
pub fn extract_project_name(contents: &str, path: &Path) -> Result<ProjectName> {
    find_name_line(contents)
        .and_then(ProjectName::new)
        .ok_or_else(|| CcovError::ProjectNameMissing {
            path: path.to_path_buf(),
        })
}

/// Read the manifest at `path` and extract the project name.
pub fn read_project_name(path: &Path) -> Result<ProjectName> {
    let contents = fs::read_to_string(path).map_err(|source| CcovError::ManifestUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let name = extract_project_name(&contents, path)?;
    tracing::debug!(project = %name, manifest = %path.display(), "resolved project name");
    Ok(name)
}
