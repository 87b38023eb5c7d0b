use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ccov")]
#[command(
    about = "Build, test and collect gcov-based coverage for a Cargo project",
    long_about = None
)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// "nohtml" skips HTML rendering; any other value renders it.
    /// "init" is reserved for the subcommand and cannot be used here.
    #[arg(value_name = "HTML_MODE")]
    pub html_mode: Option<String>,

    /// "upload" sends the report to Codecov (needs HTML_MODE in front of it)
    #[arg(value_name = "UPLOAD_MODE")]
    pub upload_mode: Option<String>,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Configuration file (defaults to the nearest .ccov.toml)
    #[arg(short, long, value_name = "FILE", env = "CCOV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the planned commands without running anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Do not echo commands before running them
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub plain: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Directory to write .ccov.toml into
        #[arg(short = 'C', long = "root", value_name = "DIR")]
        root: Option<PathBuf>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
