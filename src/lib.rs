// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fix;
pub mod formatting;
pub mod manifest;
pub mod observability;
pub mod pipeline;
pub mod summary;

// Re-export commonly used types
pub use crate::config::CcovConfig;
pub use crate::errors::{CcovError, Result};
pub use crate::exec::{CommandRunner, ExitStatus, Invocation, SystemRunner};
pub use crate::manifest::ProjectName;
pub use crate::pipeline::{
    HtmlMode, HttpFetcher, Pipeline, RunOptions, ScriptFetcher, Stage, UploadMode,
};
pub use crate::summary::{CoverageSummary, RunSummary};
