//! Correctness pass over the converted lcov report.
//!
//! The converter reports counters for lines that cannot execute on their own
//! (closing braces, `else`, comments, test-only code), which drags line and
//! branch rates around. This pass drops those records, then rewrites the
//! report in place so summary totals are recomputed from what is left.
//!
//! Architecture follows the "pure core, imperative shell" split:
//! - [`fix_report`] works on an in-memory [`lcov::Report`] and a source lookup
//! - [`fix_report_file`] does the reading and writing around it

pub mod rules;

use crate::errors::{CcovError, Result};
use crate::summary::CoverageSummary;
use lcov::{Reader, Report};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub use rules::{non_executable_lines, NonExecutable, Rule};

/// What the pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixStats {
    pub sections: usize,
    pub sections_fixed: usize,
    /// Sections whose source could not be read and were left as-is
    pub sections_skipped: usize,
    pub lines_removed: usize,
    pub branches_removed: usize,
}

/// Result of fixing a report on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub stats: FixStats,
    pub summary: CoverageSummary,
}

/// Drop records for non-executable lines from every section (pure core).
///
/// `read_source` maps a section's source path to its contents; `None` leaves
/// the section untouched.
pub fn fix_report<F>(report: &mut Report, read_source: F) -> FixStats
where
    F: Fn(&Path) -> Option<String>,
{
    let mut stats = FixStats::default();

    for (key, section) in report.sections.iter_mut() {
        stats.sections += 1;

        let Some(source) = read_source(&key.source_file) else {
            tracing::debug!(file = %key.source_file.display(), "source unavailable, section kept");
            stats.sections_skipped += 1;
            continue;
        };
        let dead = non_executable_lines(&source);
        if dead.is_empty() {
            continue;
        }

        let lines_before = section.lines.len();
        let branches_before = section.branches.len();
        section.lines.retain(|line, _| !dead.contains(line.line));
        section.branches.retain(|branch, _| !dead.contains(branch.line));

        let lines_removed = lines_before - section.lines.len();
        let branches_removed = branches_before - section.branches.len();
        if lines_removed > 0 || branches_removed > 0 {
            stats.sections_fixed += 1;
        }
        stats.lines_removed += lines_removed;
        stats.branches_removed += branches_removed;
    }

    stats
}

/// Parse an lcov report from disk.
pub fn read_report(path: &Path) -> Result<Report> {
    let reader = Reader::open_file(path).map_err(|e| CcovError::io(path, e))?;
    Report::from_reader(reader).map_err(|e| CcovError::Report {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a report, replacing `path` only once the new content is complete.
pub fn write_report(report: Report, path: &Path) -> Result<()> {
    let tmp = temp_path(path);
    let file = fs::File::create(&tmp).map_err(|e| CcovError::io(&tmp, e))?;
    let mut writer = BufWriter::new(file);
    for record in report.into_records() {
        writeln!(writer, "{record}").map_err(|e| CcovError::io(&tmp, e))?;
    }
    writer.flush().map_err(|e| CcovError::io(&tmp, e))?;
    drop(writer);
    fs::rename(&tmp, path).map_err(|e| CcovError::io(path, e))
}

/// Run the builtin pass over the report at `report_path`, in place.
///
/// Relative source paths in the report resolve against `source_root`.
pub fn fix_report_file(report_path: &Path, source_root: &Path) -> Result<FixOutcome> {
    let mut report = read_report(report_path)?;
    let stats = fix_report(&mut report, |file| {
        fs::read_to_string(source_root.join(file)).ok()
    });
    let summary = CoverageSummary::from_report(&report);
    write_report(report, report_path)?;

    tracing::info!(
        lines_removed = stats.lines_removed,
        branches_removed = stats.branches_removed,
        sections_fixed = stats.sections_fixed,
        "fixed coverage report"
    );
    Ok(FixOutcome { stats, summary })
}

/// Totals for a report on disk without modifying it.
pub fn summarize_report_file(report_path: &Path) -> Result<CoverageSummary> {
    read_report(report_path).map(|report| CoverageSummary::from_report(&report))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const SOURCE: &str = indoc! {"
        pub fn pick(flag: bool) -> u8 {
            if flag {
                1
            } else {
                2
            }
        }
    "};

    const REPORT: &str = indoc! {"
        TN:
        SF:src/lib.rs
        FN:1,pick
        FNDA:1,pick
        DA:1,1
        DA:2,1
        DA:3,1
        DA:4,0
        DA:5,0
        DA:6,1
        DA:7,1
        BRDA:2,0,0,1
        BRDA:2,0,1,0
        BRDA:4,0,0,0
        LF:7
        LH:5
        end_of_record
        TN:
        SF:src/missing.rs
        DA:1,0
        end_of_record
    "};

    fn parse(text: &str) -> Report {
        Report::from_reader(Reader::new(text.as_bytes())).unwrap()
    }

    #[test]
    fn test_fix_drops_closing_and_else_lines() {
        let mut report = parse(REPORT);
        let sources: HashMap<PathBuf, String> =
            [(PathBuf::from("src/lib.rs"), SOURCE.to_string())].into();

        let stats = fix_report(&mut report, |path| sources.get(path).cloned());

        assert_eq!(
            stats,
            FixStats {
                sections: 2,
                sections_fixed: 1,
                sections_skipped: 1,
                lines_removed: 3,
                branches_removed: 1,
            }
        );
        // src/missing.rs keeps its single unhit line
        let summary = CoverageSummary::from_report(&report);
        assert_eq!(summary.files, 2);
        assert_eq!(summary.lines_found, 5);
        assert_eq!(summary.lines_hit, 3);
        assert_eq!(summary.branches_found, 2);
    }

    #[test]
    fn test_fix_report_file_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), SOURCE).unwrap();
        let report_path = dir.path().join("lcov.info");
        fs::write(&report_path, REPORT).unwrap();

        let outcome = fix_report_file(&report_path, dir.path()).unwrap();
        assert_eq!(outcome.stats.lines_removed, 3);

        let rewritten = fs::read_to_string(&report_path).unwrap();
        assert!(!rewritten.contains("DA:4,"));
        assert!(!rewritten.contains("DA:6,"));
        assert!(rewritten.contains("LF:4"));
        assert!(rewritten.contains("LH:3"));
        assert!(!dir.path().join("lcov.info.tmp").exists());

        // a second pass finds nothing left to drop
        let again = fix_report_file(&report_path, dir.path()).unwrap();
        assert_eq!(again.stats.lines_removed, 0);
        assert_eq!(again.summary, outcome.summary);
    }

    #[test]
    fn test_malformed_report_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("lcov.info");
        fs::write(&report_path, "DA:not-a-number\n").unwrap();

        let err = fix_report_file(&report_path, dir.path()).unwrap_err();
        assert!(matches!(err, CcovError::Report { .. }));
    }
}
