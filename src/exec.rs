//! External command invocation.
//!
//! Every tool the pipeline drives is described as an [`Invocation`] first and
//! handed to a [`CommandRunner`] second. Keeping the description separate from
//! the execution lets dry runs print the exact commands and lets tests record
//! them without spawning anything.

use crate::errors::{CcovError, Result};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const REDACTED: &str = "***";

/// One external program call with its scoped environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables set for this child only; the parent environment is untouched.
    pub envs: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
    /// Bytes written to the child's stdin before waiting on it.
    pub stdin: Option<Vec<u8>>,
    secret_args: Vec<usize>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
            stdin: None,
            secret_args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Argument that must never show up in logs or dry-run output.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }

    /// Look up a scoped environment variable.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the argument following `flag`, e.g. `-o <path>`.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    fn display_arg(&self, index: usize) -> String {
        if self.secret_args.contains(&index) {
            REDACTED.to_string()
        } else {
            shell_quote(&self.args[index])
        }
    }
}

impl fmt::Display for Invocation {
    /// Shell-equivalent rendering, secrets masked.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{}={} ", key, shell_quote(value))?;
        }
        f.write_str(&shell_quote(&self.program))?;
        for index in 0..self.args.len() {
            write!(f, " {}", self.display_arg(index))?;
        }
        if let Some(input) = &self.stdin {
            write!(f, " (stdin: {} bytes)", input.len())?;
        }
        Ok(())
    }
}

/// Quote a word for display the way `set -x` would (pure function)
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+:,@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Exit status of a finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus { code: Some(0) };

    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs invocations to completion.
///
/// Implementations block until the child exits. A spawn problem is an
/// `Err`; a child that ran and failed is an `Ok` with a non-zero status.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<ExitStatus>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ExitStatus> {
        (**self).run(invocation)
    }
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn resolve(program: &str) -> Result<PathBuf> {
        which::which(program).map_err(|_| CcovError::ToolNotFound {
            program: program.to_string(),
        })
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ExitStatus> {
        let program = Self::resolve(&invocation.program)?;
        let spawn_error = |source| CcovError::Spawn {
            program: invocation.program.clone(),
            source,
        };

        let mut cmd = Command::new(&program);
        cmd.args(&invocation.args);
        for (key, value) in &invocation.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }
        // stdout belongs to ccov's own report (`--json`)
        cmd.stdout(Stdio::from(io::stderr()));

        let status = match &invocation.stdin {
            None => cmd.status().map_err(spawn_error)?,
            Some(input) => {
                cmd.stdin(Stdio::piped());
                let mut child = cmd.spawn().map_err(spawn_error)?;
                let written = match child.stdin.take() {
                    // dropping the handle closes the pipe before the wait
                    Some(mut stdin) => stdin.write_all(input),
                    None => Ok(()),
                };
                let status = child.wait().map_err(spawn_error)?;
                written.map_err(spawn_error)?;
                status
            }
        };

        Ok(ExitStatus {
            code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_renders_env_and_quotes() {
        let inv = Invocation::new("cargo")
            .args(["+nightly", "build", "--verbose"])
            .env("CARGO_INCREMENTAL", "0")
            .env("RUSTFLAGS", "-Zprofile -Clink-dead-code");
        assert_eq!(
            inv.to_string(),
            "CARGO_INCREMENTAL=0 RUSTFLAGS='-Zprofile -Clink-dead-code' cargo +nightly build --verbose"
        );
    }

    #[test]
    fn test_secret_args_are_masked() {
        let inv = Invocation::new("bash")
            .args(["-s", "--", "-t"])
            .secret_arg("s3cr3t");
        let rendered = inv.to_string();
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.ends_with("-t ***"));
        assert_eq!(inv.args.last().map(String::as_str), Some("s3cr3t"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("tests/*"), "'tests/*'");
        assert_eq!(shell_quote("lcov.info"), "lcov.info");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_flag_value_lookup() {
        let inv = Invocation::new("grcov").args(["ccov.zip", "-o", "lcov.info"]);
        assert_eq!(inv.flag_value("-o"), Some("lcov.info"));
        assert_eq!(inv.flag_value("-s"), None);
    }

    #[test]
    fn test_missing_program_is_tool_not_found() {
        let inv = Invocation::new("ccov-definitely-not-a-real-tool");
        let err = SystemRunner.run(&inv).unwrap_err();
        assert!(matches!(err, CcovError::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_code_and_feeds_stdin() {
        let failing = Invocation::new("sh").args(["-c", "exit 7"]);
        assert_eq!(SystemRunner.run(&failing).unwrap(), ExitStatus::from_code(7));

        let reads_stdin = Invocation::new("sh")
            .args(["-c", "read line; test \"$line\" = hello"])
            .stdin(b"hello\n".to_vec());
        assert!(SystemRunner.run(&reads_stdin).unwrap().success());
    }

    #[cfg(unix)]
    #[test]
    fn test_child_exiting_before_reading_stdin_is_reaped_and_reported() {
        // far larger than a pipe buffer, so the write fails once sh is gone
        let inv = Invocation::new("sh")
            .args(["-c", "exit 3"])
            .stdin(vec![b'x'; 8 * 1024 * 1024]);
        let err = SystemRunner.run(&inv).unwrap_err();
        assert!(matches!(err, CcovError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_scoped_env_reaches_child_only() {
        let inv = Invocation::new("sh")
            .args(["-c", "test \"$CCOV_SCOPED\" = yes"])
            .env("CCOV_SCOPED", "yes");
        assert!(SystemRunner.run(&inv).unwrap().success());
        assert!(std::env::var("CCOV_SCOPED").is_err());
    }
}
