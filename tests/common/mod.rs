// Test utilities for ccov integration tests
#![allow(dead_code)]

use ccov::errors::Result;
use ccov::exec::{CommandRunner, ExitStatus, Invocation};
use ccov::pipeline::ScriptFetcher;
use indoc::indoc;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const LIB_SOURCE: &str = indoc! {r#"
    pub fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    #[cfg(test)]
    mod tests {
        #[test]
        fn it_adds() {
            assert_eq!(super::add(1, 2), 3);
        }
    }
"#};

/// What the fake grcov writes: two real lines, one closing brace and two
/// lines inside the test module.
pub const CONVERTED_REPORT: &str = indoc! {"
    TN:
    SF:src/lib.rs
    FN:1,add
    FNDA:1,add
    DA:1,1
    DA:2,1
    DA:3,1
    DA:8,1
    DA:9,1
    LF:5
    LH:5
    end_of_record
"};

/// A throwaway Cargo project named `my-crate`.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"my-crate\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), LIB_SOURCE).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Leave a file behind as an earlier run would have.
    pub fn touch(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"stale").unwrap();
        path
    }
}

/// Records every invocation and imitates the side effects of the real tools.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: RefCell<Vec<Invocation>>,
    /// Exit code returned by `cargo build`
    pub build_exit: Option<i32>,
    /// Exit code returned by `cargo test`
    pub test_exit: Option<i32>,
    /// When false, `grcov` exits 0 without writing a report
    pub skip_report: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_build(code: i32) -> Self {
        Self {
            build_exit: Some(code),
            ..Self::default()
        }
    }

    pub fn failing_tests(code: i32) -> Self {
        Self {
            test_exit: Some(code),
            ..Self::default()
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.program.clone())
            .collect()
    }

    pub fn find(&self, program: &str) -> Option<Invocation> {
        self.calls
            .borrow()
            .iter()
            .find(|call| call.program == program)
            .cloned()
    }

    fn cargo(&self, dir: &Path, invocation: &Invocation) -> ExitStatus {
        let subcommand = invocation.args.get(1).map(String::as_str);
        match subcommand {
            Some("build") => ExitStatus::from_code(self.build_exit.unwrap_or(0)),
            Some("test") => {
                if let Some(code) = self.test_exit {
                    return ExitStatus::from_code(code);
                }
                let deps = dir.join("target/debug/deps");
                fs::create_dir_all(&deps).unwrap();
                fs::write(deps.join("my_crate-abc123.gcda"), b"gcda").unwrap();
                fs::write(deps.join("my_crate-abc123.gcno"), b"gcno").unwrap();
                fs::write(deps.join("other_dep-ffff.gcda"), b"gcda").unwrap();
                ExitStatus::SUCCESS
            }
            _ => ExitStatus::from_code(101),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<ExitStatus> {
        self.calls.borrow_mut().push(invocation.clone());
        let dir = invocation
            .current_dir
            .clone()
            .expect("pipeline always sets the working directory");

        let status = match invocation.program.as_str() {
            "cargo" => self.cargo(&dir, invocation),
            "zip" => {
                fs::write(dir.join(&invocation.args[1]), b"PK").unwrap();
                ExitStatus::SUCCESS
            }
            "grcov" => {
                if !self.skip_report {
                    let report = invocation.flag_value("-o").unwrap();
                    fs::write(dir.join(report), CONVERTED_REPORT).unwrap();
                }
                ExitStatus::SUCCESS
            }
            "genhtml" => {
                let out = invocation.flag_value("-o").unwrap();
                fs::create_dir_all(dir.join(out)).unwrap();
                fs::write(dir.join(out).join("index.html"), "<html/>").unwrap();
                ExitStatus::SUCCESS
            }
            "bash" => ExitStatus::SUCCESS,
            _ => ExitStatus::from_code(127),
        };
        Ok(status)
    }
}

/// Counts downloads and hands back a fixed script.
#[derive(Default)]
pub struct CountingFetcher {
    pub fetches: Cell<usize>,
    pub urls: RefCell<Vec<String>>,
}

impl CountingFetcher {
    pub const SCRIPT: &'static [u8] = b"#!/bin/bash\necho uploading\n";

    pub fn count(&self) -> usize {
        self.fetches.get()
    }
}

impl ScriptFetcher for CountingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetches.set(self.fetches.get() + 1);
        self.urls.borrow_mut().push(url.to_string());
        Ok(Self::SCRIPT.to_vec())
    }
}
