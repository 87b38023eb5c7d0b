use crate::cli::output_formatter;
use crate::config::{load_config, load_config_from, CcovConfig};
use crate::exec::SystemRunner;
use crate::formatting::render_run_summary;
use crate::pipeline::{HttpFetcher, Pipeline, RunOptions};
use crate::summary::RunSummary;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Everything the default command needs, lifted out of the parsed CLI.
#[derive(Debug, Clone, Default)]
pub struct RunCommandConfig {
    pub html_mode: Option<String>,
    pub upload_mode: Option<String>,
    pub root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
    pub quiet: bool,
    pub plain: bool,
}

impl RunCommandConfig {
    pub fn options(&self) -> RunOptions {
        RunOptions::from_args(self.html_mode.as_deref(), self.upload_mode.as_deref())
    }
}

/// Resolve the project root: `--root` if given, otherwise the current directory.
pub fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root.to_path_buf()),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// An explicit `--config` must load; a discovered one falls back to defaults.
pub fn resolve_config(root: &Path, explicit: Option<&Path>) -> Result<CcovConfig> {
    match explicit {
        Some(path) => Ok(load_config_from(path)?),
        None => Ok(load_config(root)),
    }
}

pub fn handle_run(config: RunCommandConfig) -> Result<RunSummary> {
    let root = resolve_root(config.root.as_deref())?;
    let ccov_config = resolve_config(&root, config.config.as_deref())?;
    let options = config.options();

    tracing::debug!(root = %root.display(), ?options, "starting coverage run");

    let pipeline = Pipeline::new(root, ccov_config, SystemRunner, HttpFetcher)
        .dry_run(config.dry_run)
        .echo(!config.quiet && !config.dry_run);
    let summary = pipeline.run(&options)?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let formatter = output_formatter(config.plain);
        let rendered = render_run_summary(formatter.as_ref(), &summary);
        if config.dry_run {
            println!("{rendered}");
        } else {
            eprintln!("{rendered}");
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{HtmlMode, UploadMode};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_options_from_positionals() {
        let config = RunCommandConfig {
            html_mode: Some("nohtml".into()),
            upload_mode: Some("upload".into()),
            ..RunCommandConfig::default()
        };
        let options = config.options();
        assert_eq!(options.html, HtmlMode::Skip);
        assert_eq!(options.upload, UploadMode::Upload);
    }

    #[test]
    fn test_explicit_config_must_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "toolchain = [").unwrap();
        assert!(resolve_config(dir.path(), Some(&path)).is_err());

        fs::write(&path, "toolchain = \"nightly-2020-01-01\"\n").unwrap();
        let config = resolve_config(dir.path(), Some(&path)).unwrap();
        assert_eq!(config.toolchain, "nightly-2020-01-01");
    }

    #[test]
    fn test_explicit_root_is_kept() {
        let root = resolve_root(Some(Path::new("/srv/project"))).unwrap();
        assert_eq!(root, PathBuf::from("/srv/project"));
    }
}
