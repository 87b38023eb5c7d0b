//! The coverage pipeline: manifest → clean → build → test → archive →
//! convert → fix → html → upload.
//!
//! Stages run strictly in order and the first failure ends the run, leaving
//! whatever earlier stages produced on disk. External programs go through a
//! [`CommandRunner`] and the uploader download through a [`ScriptFetcher`],
//! so the sequencing can be exercised without a toolchain or network.

pub mod archive;
pub mod cargo;
pub mod clean;
pub mod convert;
pub mod html;
pub mod upload;

use crate::config::CcovConfig;
use crate::errors::{CcovError, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::fix;
use crate::manifest::{self, ProjectName};
use crate::observability;
use crate::summary::RunSummary;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use upload::{HttpFetcher, ScriptFetcher};

/// First positional argument that skips HTML rendering.
pub const SKIP_HTML_SENTINEL: &str = "nohtml";
/// Second positional argument that triggers the upload.
pub const UPLOAD_SENTINEL: &str = "upload";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Manifest,
    Clean,
    Build,
    Test,
    Archive,
    Convert,
    Fix,
    Html,
    Upload,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Manifest,
        Stage::Clean,
        Stage::Build,
        Stage::Test,
        Stage::Archive,
        Stage::Convert,
        Stage::Fix,
        Stage::Html,
        Stage::Upload,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Manifest => "manifest",
            Stage::Clean => "clean",
            Stage::Build => "build",
            Stage::Test => "test",
            Stage::Archive => "archive",
            Stage::Convert => "convert",
            Stage::Fix => "fix",
            Stage::Html => "html",
            Stage::Upload => "upload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlMode {
    #[default]
    Render,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    Upload,
    #[default]
    Skip,
}

/// Optional branches of a run, decided by the positional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub html: HtmlMode,
    pub upload: UploadMode,
}

impl RunOptions {
    /// Interpret positional arguments (pure function).
    ///
    /// The upload sentinel only counts in second position, so it needs a
    /// first argument in front of it.
    pub fn from_args(html_arg: Option<&str>, upload_arg: Option<&str>) -> Self {
        let html = match html_arg {
            Some(SKIP_HTML_SENTINEL) => HtmlMode::Skip,
            _ => HtmlMode::Render,
        };
        let upload = match (html_arg, upload_arg) {
            (Some(_), Some(UPLOAD_SENTINEL)) => UploadMode::Upload,
            _ => UploadMode::Skip,
        };
        Self { html, upload }
    }

    /// Stages this run goes through, in order (pure function)
    pub fn stages(&self, fix_enabled: bool) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| match stage {
                Stage::Fix => fix_enabled,
                Stage::Html => self.html == HtmlMode::Render,
                Stage::Upload => self.upload == UploadMode::Upload,
                _ => true,
            })
            .collect()
    }
}

/// Sequencer for one project root.
pub struct Pipeline<R, F> {
    root: PathBuf,
    config: CcovConfig,
    runner: R,
    fetcher: F,
    dry_run: bool,
    echo: bool,
}

impl<R: CommandRunner, F: ScriptFetcher> Pipeline<R, F> {
    pub fn new(root: impl Into<PathBuf>, config: CcovConfig, runner: R, fetcher: F) -> Self {
        Self {
            root: root.into(),
            config,
            runner,
            fetcher,
            dry_run: false,
            echo: true,
        }
    }

    /// Plan only: no deletion, no child process, no download.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Print each command to stderr before it runs, like `set -x`.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &CcovConfig {
        &self.config
    }

    fn path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Ordered stages a run with `options` goes through.
    pub fn plan(&self, options: &RunOptions) -> Vec<Stage> {
        options.stages(self.config.fix.enabled)
    }

    pub fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let stages = self.plan(options);
        let mut summary = RunSummary {
            dry_run: self.dry_run,
            skipped: Stage::ALL
                .into_iter()
                .filter(|s| !stages.contains(s))
                .collect(),
            ..RunSummary::default()
        };

        let project = self.stage(Stage::Manifest, &mut summary, |_| {
            manifest::read_project_name(&self.path(&self.config.manifest))
        })?;
        summary.project = project.to_string();

        self.stage(Stage::Clean, &mut summary, |summary| {
            self.clean(&project, summary)
        })?;
        self.stage(Stage::Build, &mut summary, |summary| {
            self.execute(Stage::Build, cargo::build_invocation(&self.config), summary)
        })?;
        self.stage(Stage::Test, &mut summary, |summary| {
            self.execute(Stage::Test, cargo::test_invocation(&self.config), summary)
        })?;
        self.stage(Stage::Archive, &mut summary, |summary| {
            self.archive(&project, summary)
        })?;
        self.stage(Stage::Convert, &mut summary, |summary| self.convert(summary))?;

        if stages.contains(&Stage::Fix) {
            self.stage(Stage::Fix, &mut summary, |summary| self.fix(summary))?;
        } else if !self.dry_run {
            summary.coverage = Some(fix::summarize_report_file(&self.path(&self.config.report))?);
        }

        if stages.contains(&Stage::Html) {
            self.stage(Stage::Html, &mut summary, |summary| {
                self.execute(Stage::Html, html::html_invocation(&self.config), summary)?;
                summary.html_dir = Some(self.config.html_dir.clone());
                Ok(())
            })?;
        }
        if stages.contains(&Stage::Upload) {
            self.stage(Stage::Upload, &mut summary, |summary| self.upload(summary))?;
        }

        Ok(summary)
    }

    /// Run one stage inside its tracing span and record it as executed.
    fn stage<T>(
        &self,
        stage: Stage,
        summary: &mut RunSummary,
        body: impl FnOnce(&mut RunSummary) -> Result<T>,
    ) -> Result<T> {
        let span = tracing::info_span!("stage", name = stage.name());
        let _enter = span.enter();
        let _context = observability::enter_stage(stage);
        tracing::debug!("starting");

        let result = body(summary);
        match &result {
            Ok(_) => summary.executed.push(stage),
            Err(e) => tracing::debug!(error = %e, "stage failed"),
        }
        result
    }

    /// Trace, then run (or just record, in a dry run) one invocation.
    fn execute(&self, stage: Stage, invocation: Invocation, summary: &mut RunSummary) -> Result<()> {
        let invocation = invocation.current_dir(&self.root);
        let rendered = invocation.to_string();
        if self.echo {
            eprintln!("+ {rendered}");
        }
        tracing::info!(command = %rendered, "running");
        summary.commands.push(rendered.clone());

        if self.dry_run {
            return Ok(());
        }

        let _context = observability::enter_command(rendered.clone());
        let status = self.runner.run(&invocation)?;
        if status.success() {
            Ok(())
        } else {
            Err(CcovError::CommandFailed {
                stage,
                command: rendered,
                code: status.code,
            })
        }
    }

    fn clean(&self, project: &ProjectName, summary: &mut RunSummary) -> Result<()> {
        let build_dir = self.path(&self.config.build_dir);
        if self.dry_run {
            summary.removed_artifacts = clean::stale_artifacts(&build_dir, project)?;
        } else {
            summary.removed_artifacts = clean::remove_stale_artifacts(&build_dir, project)?;
            // outputs of an earlier run must not outlive a failed build
            remove_if_exists(&self.path(&self.config.archive))?;
            remove_if_exists(&self.path(&self.config.report))?;
            remove_dir_if_exists(&self.path(&self.config.html_dir))?;
        }
        if self.echo && !summary.removed_artifacts.is_empty() {
            eprintln!(
                "+ rm -rf {}/{}",
                self.config.build_dir.display(),
                project.artifact_pattern()
            );
        }
        Ok(())
    }

    fn archive(&self, project: &ProjectName, summary: &mut RunSummary) -> Result<()> {
        if self.dry_run {
            let invocation =
                archive::archive_invocation(&self.config.archive, archive::planned_patterns(project));
            return self.execute(Stage::Archive, invocation, summary);
        }

        let files = archive::require_instrumentation_files(&self.root, project)?;
        // zip updates an existing archive in place; start from an empty one
        remove_if_exists(&self.path(&self.config.archive))?;

        summary.archived_files = files.len();
        let invocation = archive::archive_invocation(
            &self.config.archive,
            files.iter().map(|f| f.to_string_lossy().into_owned()),
        );
        self.execute(Stage::Archive, invocation, summary)
    }

    fn convert(&self, summary: &mut RunSummary) -> Result<()> {
        let report = self.path(&self.config.report);
        if !self.dry_run {
            remove_if_exists(&report)?;
        }
        self.execute(Stage::Convert, convert::convert_invocation(&self.config), summary)?;
        if !self.dry_run {
            convert::verify_report(&report)?;
        }
        summary.report = Some(self.config.report.clone());
        Ok(())
    }

    fn fix(&self, summary: &mut RunSummary) -> Result<()> {
        let report = self.path(&self.config.report);

        if let Some(command) = &self.config.fix.command {
            let invocation = external_fix_invocation(command, &self.config.report)?;
            self.execute(Stage::Fix, invocation, summary)?;
            if !self.dry_run {
                summary.coverage = Some(fix::summarize_report_file(&report)?);
            }
            return Ok(());
        }

        if self.echo {
            eprintln!("+ fix {}", self.config.report.display());
        }
        if self.dry_run {
            return Ok(());
        }
        let outcome = fix::fix_report_file(&report, &self.root)?;
        summary.lines_removed_by_fix = outcome.stats.lines_removed;
        summary.coverage = Some(outcome.summary);
        Ok(())
    }

    fn upload(&self, summary: &mut RunSummary) -> Result<()> {
        let token = upload::read_token(&self.config.upload);
        if token.is_none() {
            tracing::warn!(
                "{} is not set; uploading without a token",
                self.config.upload.token_env
            );
        }

        let script = if self.dry_run {
            None
        } else {
            Some(self.fetcher.fetch(&self.config.upload.script_url)?)
        };
        if self.echo {
            eprintln!("+ curl -s {}", self.config.upload.script_url);
        }

        let invocation = upload::upload_invocation(&self.config.report, token.as_deref(), script);
        self.execute(Stage::Upload, invocation, summary)?;
        summary.uploaded = !self.dry_run;
        Ok(())
    }
}

/// Build the configured external fixer, substituting `{report}`.
pub fn external_fix_invocation(command: &[String], report: &Path) -> Result<Invocation> {
    let report = report.to_string_lossy();
    let mut parts = command.iter().map(|part| part.replace("{report}", &report));
    let program = parts.next().ok_or_else(|| CcovError::Config {
        path: PathBuf::from(crate::config::CONFIG_FILE_NAME),
        message: "fix.command must name a program".to_string(),
    })?;
    Ok(Invocation::new(program).args(parts))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(CcovError::io(path, e)),
        _ => Ok(()),
    }
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(CcovError::io(path, e)),
        _ => Ok(()),
    }
}
