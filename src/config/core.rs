use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for ccov.
///
/// Every path is relative to the project root the pipeline runs in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CcovConfig {
    /// Manifest the project name is read from
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Toolchain passed to cargo as `+<toolchain>`
    #[serde(default = "default_toolchain")]
    pub toolchain: String,

    /// Directory holding `<project>-*` build artifacts
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Bundle of raw instrumentation files
    #[serde(default = "default_archive")]
    pub archive: PathBuf,

    /// lcov report written by the converter
    #[serde(default = "default_report")]
    pub report: PathBuf,

    /// HTML output directory
    #[serde(default = "default_html_dir")]
    pub html_dir: PathBuf,

    #[serde(default)]
    pub instrument: InstrumentConfig,

    #[serde(default)]
    pub convert: ConvertConfig,

    #[serde(default)]
    pub fix: FixConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

impl Default for CcovConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            toolchain: default_toolchain(),
            build_dir: default_build_dir(),
            archive: default_archive(),
            report: default_report(),
            html_dir: default_html_dir(),
            instrument: InstrumentConfig::default(),
            convert: ConvertConfig::default(),
            fix: FixConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

/// Compiler flags for the instrumented build and test runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentConfig {
    #[serde(default = "default_rustflags")]
    pub rustflags: Vec<String>,

    /// Appended after `rustflags`
    #[serde(default)]
    pub extra_rustflags: Vec<String>,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            rustflags: default_rustflags(),
            extra_rustflags: Vec::new(),
        }
    }
}

impl InstrumentConfig {
    /// Space-joined value for the `RUSTFLAGS` variable
    pub fn rustflags_value(&self) -> String {
        self.rustflags
            .iter()
            .chain(self.extra_rustflags.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    /// Path globs the converter drops from the report
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// External fixer to run instead of the builtin pass.
    /// `{report}` is replaced with the report path.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    #[serde(default = "default_script_url")]
    pub script_url: String,

    /// Environment variable holding the upload token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            script_url: default_script_url(),
            token_env: default_token_env(),
        }
    }
}

pub fn default_manifest() -> PathBuf {
    PathBuf::from("Cargo.toml")
}

pub fn default_toolchain() -> String {
    "nightly".to_string()
}

pub fn default_build_dir() -> PathBuf {
    PathBuf::from("target/debug/deps")
}

pub fn default_archive() -> PathBuf {
    PathBuf::from("ccov.zip")
}

pub fn default_report() -> PathBuf {
    PathBuf::from("lcov.info")
}

pub fn default_html_dir() -> PathBuf {
    PathBuf::from("target/cov")
}

pub fn default_rustflags() -> Vec<String> {
    [
        "-Zprofile",
        "-Ccodegen-units=1",
        "-Copt-level=0",
        "-Clink-dead-code",
        "-Coverflow-checks=off",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_ignore() -> Vec<String> {
    vec!["/*".to_string(), "tests/*".to_string()]
}

pub fn default_script_url() -> String {
    "https://codecov.io/bash".to_string()
}

pub fn default_token_env() -> String {
    "CODECOV_TOKEN".to_string()
}

fn default_true() -> bool {
    true
}
