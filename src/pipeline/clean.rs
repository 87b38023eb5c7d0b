//! Removal of stale `<project>-*` build artifacts.

use crate::errors::{CcovError, Result};
use crate::manifest::ProjectName;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Paths under `build_dir` matching `<project>-*`, sorted.
pub fn stale_artifacts(build_dir: &Path, project: &ProjectName) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&build_dir.to_string_lossy()),
        project.artifact_pattern()
    );
    let paths = glob::glob(&pattern).map_err(|e| CcovError::Config {
        path: build_dir.to_path_buf(),
        message: format!("invalid artifact pattern {pattern}: {e}"),
    })?;

    let mut matches = paths
        .map(|entry| entry.map_err(|e| CcovError::io(e.path().to_path_buf(), e.into_error())))
        .collect::<Result<Vec<_>>>()?;
    matches.sort();
    Ok(matches)
}

/// Force-delete stale artifacts. No match, or a path that vanished in the
/// meantime, is not an error.
pub fn remove_stale_artifacts(build_dir: &Path, project: &ProjectName) -> Result<Vec<PathBuf>> {
    let stale = stale_artifacts(build_dir, project)?;
    for path in &stale {
        remove_path(path).map_err(|source| CcovError::Cleanup {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "removed stale artifact");
    }
    Ok(stale)
}

fn remove_path(path: &Path) -> io::Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> ProjectName {
        ProjectName::new("my-crate").unwrap()
    }

    #[test]
    fn test_removes_only_project_artifacts() {
        let temp = TempDir::new().unwrap();
        let deps = temp.path().join("target/debug/deps");
        fs::create_dir_all(deps.join("my_crate-dir")).unwrap();
        fs::write(deps.join("my_crate-abc123"), b"bin").unwrap();
        fs::write(deps.join("my_crate-abc123.gcda"), b"data").unwrap();
        fs::write(deps.join("serde-0011.rlib"), b"lib").unwrap();
        fs::write(deps.join("my_crate_other"), b"keep").unwrap();

        let removed = remove_stale_artifacts(&deps, &project()).unwrap();

        assert_eq!(removed.len(), 3);
        assert!(!deps.join("my_crate-abc123").exists());
        assert!(!deps.join("my_crate-dir").exists());
        assert!(deps.join("serde-0011.rlib").exists());
        assert!(deps.join("my_crate_other").exists());
    }

    #[test]
    fn test_no_matches_and_missing_dir_are_fine() {
        let temp = TempDir::new().unwrap();
        let removed = remove_stale_artifacts(&temp.path().join("target/debug/deps"), &project())
            .unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn test_glob_metacharacters_in_root_are_escaped() {
        let temp = TempDir::new().unwrap();
        let deps = temp.path().join("[weird]").join("deps");
        fs::create_dir_all(&deps).unwrap();
        fs::write(deps.join("my_crate-1"), b"x").unwrap();

        let stale = stale_artifacts(&deps, &project()).unwrap();
        assert_eq!(stale, vec![deps.join("my_crate-1")]);
    }
}
