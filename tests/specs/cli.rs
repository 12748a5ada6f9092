// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI surface specs: help, status, tools, hooks.

use crate::prelude::*;

#[test]
fn help_names_the_subcommands() {
    let project = Project::new();
    project
        .warden()
        .args(&["--help"])
        .passes()
        .stdout_has("dispatch")
        .stdout_has("status")
        .stdout_has("tools")
        .stdout_has("hooks");
}

#[test]
fn status_renders_the_pool_table() {
    let project = Project::new();
    project
        .warden()
        .args(&["status"])
        .passes()
        .stdout_has("POOL")
        .stdout_has("agents")
        .stdout_has("permits in use");
}

#[test]
fn status_json_is_machine_readable() {
    let project = Project::new();
    let assertion = project.warden().args(&["status", "--json"]).passes();
    let status: serde_json::Value = serde_json::from_str(assertion.stdout().trim()).unwrap();
    assert_eq!(status["pools"]["agents"]["max"], 3);
    assert_eq!(status["pools"]["agents"]["current"], 0);
    assert_eq!(status["pools"]["testing"]["max"], 1);
}

#[test]
fn tools_reports_unavailable_stack() {
    let project = Project::new();
    project
        .warden()
        .args(&["tools"])
        .passes()
        .stdout_has("External tools:")
        .stdout_has("✗ context7")
        .stdout_has("✗ fix-agent");
}

#[test]
fn tools_reports_a_probed_validator() {
    let project = Project::new();
    project.stub("tdd-guard", "#!/bin/sh\necho 0.5.3\n");
    project
        .warden()
        .args(&["tools"])
        .passes()
        .stdout_has("✓ tdd-guard: available from global (0.5.3)");
}

#[test]
fn hooks_lists_the_builtin_registry() {
    let project = Project::new();
    project
        .warden()
        .args(&["hooks"])
        .passes()
        .stdout_has("tdd_guard")
        .stdout_has("context7_docs")
        .stdout_has("post_tool_linter");
}

#[test]
fn hooks_honors_a_custom_registry() {
    let project = Project::new();
    project.config(
        "registry.json",
        r#"{"version": "2.0.0", "hooks": {
            "post_tool_linter": {"entry_point": "lint", "description": "lint only", "enabled": false}
        }}"#,
    );
    project
        .warden()
        .args(&["hooks"])
        .passes()
        .stdout_has("registry version 2.0.0")
        .stdout_has("post_tool_linter")
        .stdout_has("(disabled)");
}

#[test]
fn unknown_subcommand_fails() {
    let project = Project::new();
    project.warden().args(&["frobnicate"]).fails();
}
