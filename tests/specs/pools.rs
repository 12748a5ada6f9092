// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process pool behavior observed through the CLI.

use crate::prelude::*;

#[test]
fn held_locks_show_up_in_status() {
    let project = Project::new();
    let pool_dir = project.lock_dir().join("agents");
    std::fs::create_dir_all(&pool_dir).unwrap();
    // A live lock: our own pid, fresh timestamp.
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    std::fs::write(
        pool_dir.join("11aa22bb.json"),
        format!(
            r#"{{"pool":"agents","id":"11aa22bb","pid":{},"timestamp":{now},"metadata":{{}}}}"#,
            std::process::id()
        ),
    )
    .unwrap();

    let assertion = project.warden().args(&["status", "--json"]).passes();
    let status: serde_json::Value = serde_json::from_str(assertion.stdout().trim()).unwrap();
    assert_eq!(status["pools"]["agents"]["current"], 1);
    assert_eq!(status["pools"]["agents"]["available"], 2);
}

#[test]
fn stale_locks_are_reclaimed_by_the_sweep() {
    let project = Project::new();
    let pool_dir = project.lock_dir().join("agents");
    std::fs::create_dir_all(&pool_dir).unwrap();
    // pid 1 is alive, but the timestamp is far past the stale window.
    std::fs::write(
        pool_dir.join("deadbeef.json"),
        r#"{"pool":"agents","id":"deadbeef","pid":1,"timestamp":1000,"metadata":{}}"#,
    )
    .unwrap();

    let assertion = project.warden().args(&["status", "--json"]).passes();
    let status: serde_json::Value = serde_json::from_str(assertion.stdout().trim()).unwrap();
    assert_eq!(status["pools"]["agents"]["current"], 0);
    assert!(!pool_dir.join("deadbeef.json").exists());
}

#[test]
fn dead_owner_locks_are_reclaimed() {
    let project = Project::new();
    let pool_dir = project.lock_dir().join("linting");
    std::fs::create_dir_all(&pool_dir).unwrap();

    let mut child = std::process::Command::new("true").spawn().unwrap();
    let dead_pid = child.id();
    child.wait().unwrap();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    std::fs::write(
        pool_dir.join("0badf00d.json"),
        format!(
            r#"{{"pool":"linting","id":"0badf00d","pid":{dead_pid},"timestamp":{now},"metadata":{{}}}}"#
        ),
    )
    .unwrap();

    let assertion = project.warden().args(&["status", "--json"]).passes();
    let status: serde_json::Value = serde_json::from_str(assertion.stdout().trim()).unwrap();
    assert_eq!(status["pools"]["linting"]["current"], 0);
}
