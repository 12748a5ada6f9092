// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Returns the path to the warden binary.
///
/// Resolves via CARGO_MANIFEST_DIR, falling back to the directory the test
/// binary itself was built into (target/debug/deps/..).
fn warden_binary() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug/warden");
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("warden");
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

/// An isolated warden installation: its own config dir, lock dir, and
/// stub-binary dir that fronts PATH.
pub struct Project {
    root: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let project = Self { root };
        std::fs::create_dir_all(project.bin_dir()).unwrap();
        std::fs::create_dir_all(project.config_dir()).unwrap();
        std::fs::create_dir_all(project.lock_dir()).unwrap();
        project.config(
            "pools.json",
            &format!(
                r#"{{"resource_pools": {{
                    "agents": {{"max": 3, "timeout": 300}},
                    "linting": {{"max": 2, "timeout": 120}},
                    "testing": {{"max": 1, "timeout": 600}},
                    "documentation": {{"max": 2, "timeout": 20}},
                    "validation": {{"max": 2, "timeout": 60}}
                }},
                "settings": {{"lock_dir": "{}", "stale_lock_timeout": 300}}}}"#,
                project.lock_dir().display()
            ),
        );
        // Keep every probe local and instant: no real npx/claude/tdd-guard.
        project.stub("npx", "#!/bin/sh\nexit 1\n");
        project.stub("claude", "#!/bin/sh\nexit 1\n");
        project
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.path().join("bin")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.path().join("config")
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.root.path().join("locks")
    }

    /// Install an executable stub on the spec's PATH.
    pub fn stub(&self, name: &str, body: &str) {
        let path = self.bin_dir().join(name);
        std::fs::write(&path, body).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    /// Write a file into the config directory.
    pub fn config(&self, name: &str, content: &str) {
        std::fs::write(self.config_dir().join(name), content).unwrap();
    }

    pub fn warden(&self) -> WardenCmd {
        WardenCmd {
            args: Vec::new(),
            stdin: None,
            project: self,
        }
    }
}

pub struct WardenCmd<'a> {
    args: Vec<String>,
    stdin: Option<String>,
    project: &'a Project,
}

impl WardenCmd<'_> {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }

    pub fn output(self) -> Output {
        let path = format!("{}:/usr/bin:/bin", self.project.bin_dir().display());
        let mut cmd = Command::new(warden_binary());
        cmd.args(&self.args)
            .env("PATH", path)
            .env("HOME", self.project.root.path())
            .env("WARDEN_CONFIG_DIR", self.project.config_dir())
            .env_remove("WARDEN_DEBUG")
            .env_remove("WARDEN_CONTEXT7_URL")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().unwrap();
        {
            use std::io::Write;
            let mut stdin = child.stdin.take().unwrap();
            stdin
                .write_all(self.stdin.as_deref().unwrap_or("").as_bytes())
                .unwrap();
        }
        child.wait_with_output().unwrap()
    }

    pub fn passes(self) -> Assertion {
        let output = self.output();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        Assertion { output }
    }

    pub fn fails(self) -> Assertion {
        let output = self.output();
        assert!(
            !output.status.success(),
            "expected failure, got success\nstdout: {}",
            String::from_utf8_lossy(&output.stdout),
        );
        Assertion { output }
    }
}

pub struct Assertion {
    output: Output,
}

impl Assertion {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).to_string()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).to_string()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout().contains(needle),
            "stdout missing {needle:?}\nstdout: {}",
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr().contains(needle),
            "stderr missing {needle:?}\nstderr: {}",
            self.stderr()
        );
        self
    }

    /// Parse stdout as the response envelope.
    pub fn response(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout().trim()).unwrap_or_else(|e| {
            panic!("stdout is not a response envelope: {e}\nstdout: {}", self.stdout())
        })
    }
}
