// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_minimal_envelope() {
    let event: HookEvent = serde_json::from_str(
        r#"{"event_type":"PostToolUse","tool_name":"Edit","tool_input":{"file_path":"/tmp/a.py"}}"#,
    )
    .unwrap();
    assert_eq!(event.event_type, EventType::PostToolUse);
    assert_eq!(event.tool_name, "Edit");
    assert_eq!(event.file_path(), Some("/tmp/a.py"));
    assert!(event.session_id.is_none());
}

#[test]
fn unknown_fields_are_ignored() {
    let event: HookEvent = serde_json::from_str(
        r#"{"event_type":"PreToolUse","tool_name":"Write","hook_event_name":"PreToolUse","cwd":"/x"}"#,
    )
    .unwrap();
    assert_eq!(event.event_type, EventType::PreToolUse);
    assert!(event.tool_input.file_path.is_none());
}

#[test]
fn extra_tool_input_fields_round_trip() {
    let event: HookEvent = serde_json::from_str(
        r#"{"event_type":"PreToolUse","tool_name":"NotebookEdit","tool_input":{"file_path":"/n.ipynb","cell_id":"3"}}"#,
    )
    .unwrap();
    assert_eq!(
        event.tool_input.extra.get("cell_id"),
        Some(&serde_json::json!("3"))
    );
    let back = serde_json::to_value(&event).unwrap();
    assert_eq!(back["tool_input"]["cell_id"], "3");
}

#[test]
fn missing_event_type_is_an_error() {
    let result = serde_json::from_str::<HookEvent>(r#"{"tool_name":"Edit"}"#);
    assert!(result.is_err());
}

#[test]
fn response_serializes_with_continue_key() {
    let response = Response::new(false, "blocked");
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["continue"], false);
    assert_eq!(json["reasoning"], "blocked");
}

#[test]
fn metadata_timestamp_accessor() {
    let event: HookEvent = serde_json::from_str(
        r#"{"event_type":"PostToolUse","tool_name":"Edit","metadata":{"timestamp":1700000000}}"#,
    )
    .unwrap();
    assert_eq!(event.timestamp(), Some(&serde_json::json!(1700000000)));
}
