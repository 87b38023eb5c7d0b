use crate::summary::{CoverageSummary, RunSummary};
use colored::*;
use std::env;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,   // Detect based on terminal
    Always, // Force colors on
    Never,  // Force colors off
}

impl ColorMode {
    pub fn should_use_color(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => detect_color_support(),
        }
    }

    /// Apply `NO_COLOR`, `CLICOLOR` and `CLICOLOR_FORCE` on top of `self`
    pub fn with_env_overrides(self) -> Self {
        let mut mode = self;

        // Check NO_COLOR environment variable (per no-color.org standard)
        if env::var("NO_COLOR").is_ok() {
            mode = ColorMode::Never;
        }

        if let Ok(val) = env::var("CLICOLOR") {
            if val == "0" {
                mode = ColorMode::Never;
            }
        }

        if let Ok(val) = env::var("CLICOLOR_FORCE") {
            if val == "1" {
                mode = ColorMode::Always;
            }
        }

        mode
    }
}

pub trait OutputFormatter {
    fn success(&self, text: &str) -> String;
    fn error(&self, text: &str) -> String;
    fn warning(&self, text: &str) -> String;
    fn header(&self, text: &str) -> String;
    fn dim(&self, text: &str) -> String;
}

pub struct ColoredFormatter;

impl ColoredFormatter {
    pub fn new(color: ColorMode) -> Self {
        colored::control::set_override(color.should_use_color());
        Self
    }
}

impl OutputFormatter for ColoredFormatter {
    fn success(&self, text: &str) -> String {
        text.green().to_string()
    }

    fn error(&self, text: &str) -> String {
        text.red().bold().to_string()
    }

    fn warning(&self, text: &str) -> String {
        text.yellow().to_string()
    }

    fn header(&self, text: &str) -> String {
        text.blue().bold().to_string()
    }

    fn dim(&self, text: &str) -> String {
        text.dimmed().to_string()
    }
}

pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn success(&self, text: &str) -> String {
        text.to_string()
    }

    fn error(&self, text: &str) -> String {
        text.to_string()
    }

    fn warning(&self, text: &str) -> String {
        text.to_string()
    }

    fn header(&self, text: &str) -> String {
        text.to_string()
    }

    fn dim(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Pick a formatter for the requested color mode.
pub fn formatter_for(color: ColorMode) -> Box<dyn OutputFormatter> {
    if color.should_use_color() {
        Box::new(ColoredFormatter::new(color))
    } else {
        Box::new(PlainFormatter)
    }
}

fn detect_color_support() -> bool {
    // Check if we're in a dumb terminal
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    // Progress and summaries go to stderr
    std::io::stderr().is_terminal()
}

/// Pure function: rate with a color tier
fn format_rate(formatter: &dyn OutputFormatter, rate: f64) -> String {
    let text = format!("{rate:.1}%");
    if rate >= 80.0 {
        formatter.success(&text)
    } else if rate >= 50.0 {
        formatter.warning(&text)
    } else {
        formatter.error(&text)
    }
}

fn format_coverage(formatter: &dyn OutputFormatter, coverage: &CoverageSummary) -> Vec<String> {
    vec![
        format!(
            "  lines:     {} ({}/{})",
            format_rate(formatter, coverage.line_rate()),
            coverage.lines_hit,
            coverage.lines_found
        ),
        format!(
            "  branches:  {} ({}/{})",
            format_rate(formatter, coverage.branch_rate()),
            coverage.branches_hit,
            coverage.branches_found
        ),
        format!(
            "  functions: {} ({}/{})",
            format_rate(formatter, coverage.function_rate()),
            coverage.functions_hit,
            coverage.functions_found
        ),
    ]
}

/// Render the end-of-run summary as terminal lines (pure function)
pub fn render_run_summary(formatter: &dyn OutputFormatter, summary: &RunSummary) -> String {
    let mut lines = Vec::new();

    if summary.dry_run {
        lines.push(formatter.header(&format!("Planned coverage run for {}", summary.project)));
        lines.extend(summary.commands.iter().map(|c| format!("  {c}")));
        if !summary.removed_artifacts.is_empty() {
            lines.push(formatter.dim(&format!(
                "  would remove {} stale artifact(s)",
                summary.removed_artifacts.len()
            )));
        }
        return lines.join("\n");
    }

    lines.push(formatter.header(&format!("Coverage for {}", summary.project)));
    if let Some(coverage) = &summary.coverage {
        lines.extend(format_coverage(formatter, coverage));
    }
    if summary.lines_removed_by_fix > 0 {
        lines.push(formatter.dim(&format!(
            "  {} non-executable line(s) dropped from the report",
            summary.lines_removed_by_fix
        )));
    }
    if let Some(report) = &summary.report {
        lines.push(format!("  report:    {}", report.display()));
    }
    if let Some(html) = &summary.html_dir {
        lines.push(format!("  html:      {}", html.display()));
    }
    if summary.uploaded {
        lines.push(formatter.success("  uploaded"));
    }

    lines.join("\n")
}
