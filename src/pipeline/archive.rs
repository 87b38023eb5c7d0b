//! Bundling raw instrumentation data into one archive.
//!
//! Discovery and archiving are two separate steps: if a discovered file is
//! gone by the time the archiver runs, the archiver fails and so does the run.

use crate::errors::{CcovError, Result};
use crate::exec::Invocation;
use crate::manifest::ProjectName;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every `<project>*.gcda` and `<project>*.gcno` under `root`, relative to
/// `root` and sorted.
pub fn find_instrumentation_files(root: &Path, project: &ProjectName) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            CcovError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let owned = entry
            .file_name()
            .to_str()
            .is_some_and(|name| project.owns_instrumentation_file(name));
        if owned {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            files.push(relative.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Like [`find_instrumentation_files`], but an empty result is an error.
pub fn require_instrumentation_files(root: &Path, project: &ProjectName) -> Result<Vec<PathBuf>> {
    let files = find_instrumentation_files(root, project)?;
    if files.is_empty() {
        return Err(CcovError::NoInstrumentationData {
            root: root.to_path_buf(),
            project: project.to_string(),
        });
    }
    Ok(files)
}

/// `zip -0 <archive> <files...>`: store-only, no compression.
pub fn archive_invocation<I, S>(archive: &Path, files: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Invocation::new("zip")
        .arg("-0")
        .path_arg(archive)
        .args(files)
}

/// Placeholder file list for plans made before any data exists.
pub fn planned_patterns(project: &ProjectName) -> Vec<String> {
    vec![format!("{project}*.gcda"), format!("{project}*.gcno")]
}
