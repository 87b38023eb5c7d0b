//! Run and coverage summaries.

use crate::pipeline::Stage;
use lcov::Report;
use serde::Serialize;
use std::path::PathBuf;

/// Totals over an lcov report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageSummary {
    pub files: usize,
    pub lines_found: usize,
    pub lines_hit: usize,
    pub branches_found: usize,
    pub branches_hit: usize,
    pub functions_found: usize,
    pub functions_hit: usize,
}

impl CoverageSummary {
    /// Count every section's records (pure function)
    pub fn from_report(report: &Report) -> Self {
        report
            .sections
            .values()
            .fold(Self::default(), |mut summary, section| {
                summary.files += 1;
                summary.lines_found += section.lines.len();
                summary.lines_hit += section.lines.values().filter(|v| v.count > 0).count();
                summary.branches_found += section.branches.len();
                summary.branches_hit += section
                    .branches
                    .values()
                    .filter(|v| v.taken.is_some_and(|taken| taken > 0))
                    .count();
                summary.functions_found += section.functions.len();
                summary.functions_hit += section.functions.values().filter(|v| v.count > 0).count();
                summary
            })
    }

    pub fn line_rate(&self) -> f64 {
        percentage(self.lines_hit, self.lines_found)
    }

    pub fn branch_rate(&self) -> f64 {
        percentage(self.branches_hit, self.branches_found)
    }

    pub fn function_rate(&self) -> f64 {
        percentage(self.functions_hit, self.functions_found)
    }
}

fn percentage(hit: usize, found: usize) -> f64 {
    if found == 0 {
        0.0
    } else {
        hit as f64 * 100.0 / found as f64
    }
}

/// What a pipeline run did, for terminal and JSON output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub project: String,
    pub dry_run: bool,
    pub executed: Vec<Stage>,
    pub skipped: Vec<Stage>,
    /// Every external command, rendered with secrets masked
    pub commands: Vec<String>,
    pub removed_artifacts: Vec<PathBuf>,
    pub archived_files: usize,
    pub report: Option<PathBuf>,
    pub html_dir: Option<PathBuf>,
    pub uploaded: bool,
    pub lines_removed_by_fix: usize,
    pub coverage: Option<CoverageSummary>,
}
