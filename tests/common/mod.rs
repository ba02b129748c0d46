#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Test helper for running yearlight commands with less boilerplate
pub struct YearlightTest {
    cmd: Command,
}

pub fn yearlight_command() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("yearlight"))
}

impl YearlightTest {
    pub fn new() -> Self {
        Self {
            cmd: yearlight_command(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn arg<S: AsRef<std::ffi::OsStr>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg);
        self
    }

    pub fn assert_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    pub fn assert_success_contains(mut self, text: &str) -> assert_cmd::assert::Assert {
        self.cmd
            .assert()
            .success()
            .stdout(predicate::str::contains(text))
    }

    pub fn assert_success_contains_all(mut self, texts: &[&str]) -> assert_cmd::assert::Assert {
        let mut assertion = self.cmd.assert().success();
        for text in texts {
            assertion = assertion.stdout(predicate::str::contains(*text));
        }
        assertion
    }

    pub fn assert_failure_contains(mut self, text: &str) -> assert_cmd::assert::Assert {
        self.cmd
            .assert()
            .failure()
            .stderr(predicate::str::contains(text))
    }
}
