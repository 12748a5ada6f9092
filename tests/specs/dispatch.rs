// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end dispatch specs: event on stdin, decision on stdout.

use crate::prelude::*;

#[test]
fn clean_file_passes_all_linters() {
    let project = Project::new();
    project.stub("black", "#!/bin/sh\nexit 0\n");
    project.stub("flake8", "#!/bin/sh\nexit 0\n");
    project.stub("pyright", "#!/bin/sh\nexit 0\n");

    let assertion = project
        .warden()
        .stdin(r#"{"event_type":"PostToolUse","tool_name":"Edit","tool_input":{"file_path":"/tmp/clean.py"}}"#)
        .passes();
    let response = assertion.response();
    assert_eq!(response["continue"], true);
    assert_eq!(response["reasoning"], "✓ /tmp/clean.py — no linting issues");
}

#[test]
fn dirty_file_without_auto_fix_reports_the_issue() {
    let project = Project::new();
    project.stub(
        "flake8",
        "#!/bin/sh\necho '/tmp/dirty.py:1:1: E302 expected 2 blank lines'\nexit 1\n",
    );
    project.config(
        "post_tool_linter.json",
        r#"{"settings": {"enabled_linters": ["flake8"], "auto_fix": false}}"#,
    );

    let assertion = project
        .warden()
        .stdin(r#"{"event_type":"PostToolUse","tool_name":"Edit","tool_input":{"file_path":"/tmp/dirty.py"}}"#)
        .passes();
    let response = assertion.response();
    assert_eq!(response["continue"], true);
    let reasoning = response["reasoning"].as_str().unwrap();
    assert!(
        reasoning.starts_with("⚠ /tmp/dirty.py has linting issues:\n"),
        "got: {reasoning}"
    );
    assert!(reasoning.contains("E302"));
}

#[test]
fn strict_mode_validation_timeout_blocks() {
    let project = Project::new();
    // Answers the availability probe instantly, then hangs on real calls.
    project.stub(
        "tdd-guard",
        "#!/bin/sh\ncase \"$1\" in --version) echo 0.5.3; exit 0;; esac\nsleep 30\n",
    );
    project.config(
        "tdd_guard.json",
        r#"{"settings": {"strict_mode": true, "timeout": 1}}"#,
    );

    let assertion = project
        .warden()
        .stdin(r#"{"event_type":"PreToolUse","tool_name":"Write","tool_input":{"file_path":"/tmp/new.py","content":"x = 1"}}"#)
        .passes();
    let response = assertion.response();
    assert_eq!(response["continue"], false);
    assert!(
        response["reasoning"]
            .as_str()
            .unwrap()
            .contains("TDD validation timed out"),
        "got: {}",
        response["reasoning"]
    );
}

#[test]
fn lax_mode_validation_timeout_allows() {
    let project = Project::new();
    project.stub(
        "tdd-guard",
        "#!/bin/sh\ncase \"$1\" in --version) echo 0.5.3; exit 0;; esac\nsleep 30\n",
    );
    project.config("tdd_guard.json", r#"{"settings": {"timeout": 1}}"#);

    let assertion = project
        .warden()
        .stdin(r#"{"event_type":"PreToolUse","tool_name":"Write","tool_input":{"content":"x = 1"}}"#)
        .passes();
    let response = assertion.response();
    assert_eq!(response["continue"], true);
    assert!(response["reasoning"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}

#[test]
fn approving_validator_allows_the_edit() {
    let project = Project::new();
    project.stub(
        "tdd-guard",
        "#!/bin/sh\ncase \"$1\" in --version) echo 0.5.3; exit 0;; esac\ncat > /dev/null\nprintf '%s\\n' '{\"decision\":\"approve\"}'\n",
    );

    let assertion = project
        .warden()
        .stdin(r#"{"event_type":"PreToolUse","tool_name":"Edit","tool_input":{"file_path":"/tmp/ok.py","new_string":"y = 2"}}"#)
        .passes();
    let response = assertion.response();
    assert_eq!(response["continue"], true);
}

#[test]
fn blocking_validator_vetoes_the_edit() {
    let project = Project::new();
    project.stub(
        "tdd-guard",
        "#!/bin/sh\ncase \"$1\" in --version) echo 0.5.3; exit 0;; esac\ncat > /dev/null\nprintf '%s\\n' '{\"decision\":\"block\",\"stopReason\":\"No failing test\"}'\n",
    );

    let assertion = project
        .warden()
        .stdin(r#"{"event_type":"PreToolUse","tool_name":"Write","tool_input":{"content":"z = 3"}}"#)
        .passes();
    let response = assertion.response();
    assert_eq!(response["continue"], false);
    assert!(response["reasoning"]
        .as_str()
        .unwrap()
        .contains("No failing test"));
}

#[test]
fn empty_stdin_yields_a_silent_allow() {
    let project = Project::new();
    let assertion = project.warden().stdin("").passes();
    let response = assertion.response();
    assert_eq!(response["continue"], true);
    assert_eq!(response["reasoning"], "");
}

#[test]
fn malformed_stdin_yields_a_silent_allow() {
    let project = Project::new();
    let assertion = project.warden().stdin("{this is not json").passes();
    let response = assertion.response();
    assert_eq!(response["continue"], true);
}

#[test]
fn unknown_tools_pass_through_untouched() {
    let project = Project::new();
    let assertion = project
        .warden()
        .stdin(r#"{"event_type":"PostToolUse","tool_name":"Bash","tool_input":{}}"#)
        .passes();
    let response = assertion.response();
    assert_eq!(response["continue"], true);
    assert_eq!(response["reasoning"], "");
}

#[test]
fn malformed_pool_config_is_a_startup_error() {
    let project = Project::new();
    project.config("pools.json", "{broken");
    project
        .warden()
        .stdin(r#"{"event_type":"PostToolUse","tool_name":"Edit"}"#)
        .fails()
        .stderr_has("pool config");
}
