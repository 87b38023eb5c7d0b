//! Error types for coverage pipeline runs.
//!
//! The library reports failures through [`CcovError`]; the binary wraps it
//! in `anyhow` at the edge and turns it into a process exit code with
//! [`CcovError::exit_code`].
//!
//! # Example
//!
//! ```rust
//! use ccov::errors::CcovError;
//! use ccov::pipeline::Stage;
//!
//! let err = CcovError::CommandFailed {
//!     stage: Stage::Build,
//!     command: "cargo +nightly build --verbose".into(),
//!     code: Some(101),
//! };
//! assert_eq!(err.exit_code(), 101);
//! ```

use crate::pipeline::Stage;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, CcovError>;

/// Everything that can stop a pipeline run.
#[derive(Debug, Error)]
pub enum CcovError {
    /// The manifest could not be read at all.
    #[error("failed to read manifest {}: {source}", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The manifest has no usable `name = "..."` line.
    #[error("no package name found in {}", path.display())]
    ProjectNameMissing { path: PathBuf },

    /// A stale build artifact could not be removed.
    #[error("failed to remove stale artifact {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required external program is not on `PATH`.
    #[error("`{program}` not found in PATH")]
    ToolNotFound { program: String },

    /// The external program exists but could not be started.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// An external program exited unsuccessfully.
    #[error("{stage} failed ({}): {command}", describe_code(*code))]
    CommandFailed {
        stage: Stage,
        command: String,
        code: Option<i32>,
    },

    /// The test run left no `.gcda`/`.gcno` files to archive.
    #[error("no instrumentation data for `{project}` under {}", root.display())]
    NoInstrumentationData { root: PathBuf, project: String },

    /// The converter finished but wrote no report.
    #[error("no coverage data produced in {}", report.display())]
    NoCoverageData { report: PathBuf },

    /// The lcov report could not be parsed or written.
    #[error("invalid coverage report {}: {message}", path.display())]
    Report { path: PathBuf, message: String },

    /// The uploader script could not be downloaded.
    #[error("failed to fetch uploader from {url}: {message}")]
    Fetch { url: String, message: String },

    /// The configuration file is malformed.
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Generic filesystem failure with the offending path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CcovError {
    /// Process exit code for this error.
    ///
    /// A failed child propagates its own status so callers observe the same
    /// code they would get from running the tool by hand. Children killed by
    /// a signal, and every other error, map to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CcovError::CommandFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CcovError::Io {
            path: path.into(),
            source,
        }
    }

    /// The stage a failure belongs to, when it came from an external tool.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CcovError::CommandFailed { stage, .. } => Some(*stage),
            CcovError::NoInstrumentationData { .. } => Some(Stage::Archive),
            CcovError::NoCoverageData { .. } => Some(Stage::Convert),
            CcovError::Report { .. } => Some(Stage::Fix),
            CcovError::Fetch { .. } => Some(Stage::Upload),
            CcovError::Cleanup { .. } => Some(Stage::Clean),
            CcovError::ManifestUnreadable { .. } | CcovError::ProjectNameMissing { .. } => {
                Some(Stage::Manifest)
            }
            _ => None,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
