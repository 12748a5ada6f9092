// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn spec_with_candidate(name: &str, candidate: Candidate) -> ToolSpec {
    ToolSpec {
        name: name.to_string(),
        candidates: vec![candidate],
        remote_url: None,
    }
}

fn plain_candidate(kind: ToolKind, command: String, requires_path: Option<PathBuf>) -> Candidate {
    Candidate {
        kind,
        command,
        args: Vec::new(),
        probe_args: vec!["--version".to_string()],
        requires_path,
        accept_json_marker: false,
        transport: Transport::Subprocess,
    }
}

#[tokio::test]
async fn clean_version_exit_marks_the_tool_available() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "fake-tool", "#!/bin/sh\necho 1.2.3\n");
    let spec = spec_with_candidate(
        "fake",
        plain_candidate(ToolKind::Global, script.display().to_string(), None),
    );

    let catalog = ToolCatalog::probe(vec![spec], Duration::from_secs(5)).await;
    assert!(catalog.is_available("fake"));
    let status = catalog.get("fake").unwrap();
    assert_eq!(status.kind, Some(ToolKind::Global));
    assert_eq!(status.version.as_deref(), Some("1.2.3"));
    let invocation = status.invocation.as_ref().unwrap();
    assert_eq!(invocation.transport, Transport::Subprocess);
}

#[tokio::test]
async fn missing_required_path_skips_the_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("node_modules/.bin/tool");
    let spec = spec_with_candidate(
        "fake",
        plain_candidate(ToolKind::Local, absent.display().to_string(), Some(absent)),
    );

    let catalog = ToolCatalog::probe(vec![spec], Duration::from_secs(5)).await;
    assert!(!catalog.is_available("fake"));
    let status = catalog.get("fake").unwrap();
    assert!(status.reason.as_deref().unwrap().contains("not found"));
}

#[tokio::test]
async fn first_matching_candidate_wins() {
    let dir = tempfile::tempdir().unwrap();
    let local = write_script(dir.path(), "local-tool", "#!/bin/sh\necho 0.1.0-local\n");
    let global = write_script(dir.path(), "global-tool", "#!/bin/sh\necho 9.9.9\n");
    let spec = ToolSpec {
        name: "fake".to_string(),
        candidates: vec![
            plain_candidate(
                ToolKind::Local,
                local.display().to_string(),
                Some(local.clone()),
            ),
            plain_candidate(ToolKind::Global, global.display().to_string(), None),
        ],
        remote_url: None,
    };

    let catalog = ToolCatalog::probe(vec![spec], Duration::from_secs(5)).await;
    let status = catalog.get("fake").unwrap();
    assert_eq!(status.kind, Some(ToolKind::Local));
    assert_eq!(status.version.as_deref(), Some("0.1.0-local"));
}

#[tokio::test]
async fn nonzero_exit_with_json_marker_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "marker-tool",
        "#!/bin/sh\ncat > /dev/null\necho '{\"decision\":\"approve\"}'\nexit 1\n",
    );
    let mut candidate = plain_candidate(ToolKind::Local, script.display().to_string(), None);
    candidate.accept_json_marker = true;
    let spec = spec_with_candidate("marker", candidate);

    let catalog = ToolCatalog::probe(vec![spec], Duration::from_secs(5)).await;
    assert!(catalog.is_available("marker"));
}

#[tokio::test]
async fn nonzero_exit_without_marker_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "broken-tool", "#!/bin/sh\nexit 2\n");
    let spec = spec_with_candidate(
        "broken",
        plain_candidate(ToolKind::Global, script.display().to_string(), None),
    );

    let catalog = ToolCatalog::probe(vec![spec], Duration::from_secs(5)).await;
    assert!(!catalog.is_available("broken"));
    let reason = catalog.get("broken").unwrap().reason.as_deref().unwrap();
    assert!(reason.contains("exited with 2"), "got: {reason}");
}

#[tokio::test]
async fn hung_probe_times_out_and_reports_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "hung-tool", "#!/bin/sh\nsleep 30\n");
    let spec = spec_with_candidate(
        "hung",
        plain_candidate(ToolKind::Global, script.display().to_string(), None),
    );

    let start = std::time::Instant::now();
    let catalog = ToolCatalog::probe(vec![spec], Duration::from_millis(200)).await;
    assert!(!catalog.is_available("hung"));
    assert!(start.elapsed() < Duration::from_secs(5));
    let reason = catalog.get("hung").unwrap().reason.as_deref().unwrap();
    assert!(reason.contains("timed out"), "got: {reason}");
}

#[tokio::test]
async fn remote_recipe_backstops_failed_candidates() {
    let spec = ToolSpec {
        name: "context7".to_string(),
        candidates: vec![plain_candidate(
            ToolKind::Local,
            "/nonexistent/context7".to_string(),
            Some(PathBuf::from("/nonexistent/context7")),
        )],
        remote_url: Some("https://mcp.example.com/mcp".to_string()),
    };

    let catalog = ToolCatalog::probe(vec![spec], Duration::from_secs(1)).await;
    let status = catalog.get("context7").unwrap();
    assert!(status.available);
    assert_eq!(status.kind, Some(ToolKind::Remote));
    let invocation = status.invocation.as_ref().unwrap();
    assert_eq!(invocation.transport, Transport::Http);
    assert_eq!(
        invocation.url.as_deref(),
        Some("https://mcp.example.com/mcp")
    );
}

#[tokio::test]
async fn report_lists_available_and_missing_tools() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "ok-tool", "#!/bin/sh\necho 2.0.0\n");
    let specs = vec![
        spec_with_candidate(
            "ok",
            plain_candidate(ToolKind::Global, script.display().to_string(), None),
        ),
        spec_with_candidate(
            "gone",
            plain_candidate(
                ToolKind::Local,
                "/nonexistent/gone".to_string(),
                Some(PathBuf::from("/nonexistent/gone")),
            ),
        ),
    ];

    let catalog = ToolCatalog::probe(specs, Duration::from_secs(5)).await;
    let report = catalog.report();
    assert!(report.contains("✓ ok: available from global (2.0.0)"));
    assert!(report.contains("✗ gone:"));
}

#[test]
fn default_specs_cover_the_shipped_tools() {
    let root = Path::new("/some/project");
    let tdd = ToolSpec::tdd_guard(root);
    assert_eq!(tdd.candidates.len(), 3);
    assert_eq!(tdd.candidates[0].kind, ToolKind::Local);
    assert_eq!(tdd.candidates[2].kind, ToolKind::Global);

    let context7 = ToolSpec::context7(root, Some("https://mcp.context7.com/mcp".to_string()));
    assert_eq!(context7.candidates[0].transport, Transport::Stdio);
    assert!(context7.remote_url.is_some());

    let agent = ToolSpec::fix_agent();
    assert_eq!(agent.candidates.last().unwrap().command, "claude");
}
