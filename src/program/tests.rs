// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;

use super::*;
use crate::net::Fetcher;

#[test]
fn test_load_str_rejects_garbage() {
    assert!(load_str("not json").is_err());
    assert!(load_str("{\"tasks\": 3}").is_err());
}

#[test]
fn test_load_file_missing() {
    assert!(load_file(Path::new("/definitely/not/here.json")).is_err());
}

#[tokio::test]
async fn test_assemble_local_include_prefixes_namespace() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("docker.json"),
        r#"{
            "project": {"name": "docker-lib", "settings": {"registry": "ghcr.io"}},
            "tasks": [
                {"name": "build", "body": []},
                {"name": "push", "dependencies": [{"task": "build"}], "body": []}
            ]
        }"#,
    )
    .unwrap();

    let program = load_str(
        r#"{
            "project": {"name": "app"},
            "includes": [{"namespace": "docker", "source": "docker.json"}],
            "tasks": [{"name": "main", "body": []}]
        }"#,
    )
    .unwrap();

    let (assembled, included) = assemble(program, dir.path(), &Fetcher::new())
        .await
        .unwrap();

    let names: Vec<&str> = assembled.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["main", "docker.build", "docker.push"]);

    // Included dependencies stay inside the namespace.
    let push = assembled
        .tasks
        .iter()
        .find(|t| t.name == "docker.push")
        .unwrap();
    assert_eq!(push.dependencies[0].task, "docker.build");

    // Fragment settings land in included settings.
    assert_eq!(included.get("registry").map(String::as_str), Some("ghcr.io"));

    // Includes are consumed.
    assert!(assembled.includes.is_empty());
}

#[tokio::test]
async fn test_assemble_missing_local_include_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let program = load_str(
        r#"{"includes": [{"namespace": "x", "source": "gone.json"}], "tasks": []}"#,
    )
    .unwrap();

    assert!(assemble(program, dir.path(), &Fetcher::new()).await.is_err());
}

#[test]
fn test_project_context_from_program() {
    let program = load_str(
        r#"{
            "project": {
                "name": "app", "version": "3.2.1",
                "settings": {"region": "eu"},
                "shell": {"linux": {"executable": "/bin/sh", "args": ["-c"]}}
            },
            "tasks": []
        }"#,
    )
    .unwrap();

    let included = BTreeMap::from([("channel".to_string(), "beta".to_string())]);
    let ctx = ProjectContext::from_program(&program, included);

    assert_eq!(ctx.name(), "app");
    assert_eq!(ctx.version(), "3.2.1");
    assert_eq!(ctx.setting("region"), Some("eu"));
    assert_eq!(ctx.included_setting("channel"), Some("beta"));
    assert!(ctx.setting("channel").is_none());
    assert!(ctx.shell_config().contains_key("linux"));
}

#[test]
fn test_project_context_without_project_header() {
    let program = load_str(r#"{"tasks": []}"#).unwrap();
    let ctx = ProjectContext::from_program(&program, BTreeMap::new());
    assert_eq!(ctx.name(), "");
    assert_eq!(ctx.version(), "");
}
