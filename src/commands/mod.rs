//! CLI command implementations.
//!
//! Available commands:
//! - **run** (default): the full coverage pipeline
//! - **init**: write a default `.ccov.toml`

pub mod init;
pub mod run;

pub use init::init_config;
pub use run::{handle_run, resolve_config, resolve_root, RunCommandConfig};
