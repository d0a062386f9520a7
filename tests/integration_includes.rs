// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for program assembly with remote includes.
//!
//! A wiremock server plays the raw-download host; the fetcher's bases are
//! pointed at it so the `github:` protocol resolves locally.

use std::collections::BTreeMap;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use drun_rs::engine::output::Output;
use drun_rs::engine::{Engine, EngineOptions};
use drun_rs::net::Fetcher;
use drun_rs::program;

const FRAGMENT: &str = r#"{
    "project": {"name": "ci-lib", "settings": {"runner": "podman"}},
    "tasks": [
        {"name": "lint",
         "body": [{"type": "action", "kind": "echo", "message": "linting with {$globals.runner}"}]}
    ]
}"#;

#[tokio::test]
async fn test_remote_include_resolves_and_namespaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/ci-lib/main/tasks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FRAGMENT))
        .mount(&server)
        .await;

    let parsed = program::load_str(
        r#"{
            "project": {"name": "app"},
            "includes": [{"namespace": "ci", "source": "github:acme/ci-lib/tasks.json@main"}],
            "tasks": [
                {"name": "main", "dependencies": [{"task": "ci.lint"}],
                 "body": [{"type": "action", "kind": "echo", "message": "built"}]}
            ]
        }"#,
    )
    .unwrap();

    let fetcher = Fetcher::new().with_bases(server.uri(), server.uri());
    let dir = tempfile::tempdir().expect("tempdir");
    let (assembled, included) = program::assemble(parsed, dir.path(), &fetcher)
        .await
        .unwrap();

    // Included settings are visible through $globals.
    assert_eq!(included.get("runner").map(String::as_str), Some("podman"));

    let output = Output::buffer();
    let engine = Engine::new(EngineOptions::default()).with_output(output.clone());
    engine
        .execute(&assembled, included, "main", &BTreeMap::new(), "app.json")
        .await
        .unwrap();

    assert_eq!(
        output.captured_texts(),
        vec!["linting with podman", "built"]
    );
}

#[tokio::test]
async fn test_remote_include_elided_namespace_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/ci-lib/main/tasks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FRAGMENT))
        .mount(&server)
        .await;

    let parsed = program::load_str(
        r#"{
            "includes": [{"namespace": "ci", "source": "github:acme/ci-lib/tasks.json@main"}],
            "tasks": []
        }"#,
    )
    .unwrap();

    let fetcher = Fetcher::new().with_bases(server.uri(), server.uri());
    let dir = tempfile::tempdir().expect("tempdir");
    let (assembled, included) = program::assemble(parsed, dir.path(), &fetcher)
        .await
        .unwrap();

    // "lint" elides to "ci.lint" because it is unique.
    let output = Output::buffer();
    let engine = Engine::new(EngineOptions::default()).with_output(output.clone());
    engine
        .execute(&assembled, included, "lint", &BTreeMap::new(), "app.json")
        .await
        .unwrap();

    assert_eq!(output.captured_texts(), vec!["linting with podman"]);
}

#[tokio::test]
async fn test_failed_include_aborts_assembly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/ci-lib/main/tasks.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let parsed = program::load_str(
        r#"{
            "includes": [{"namespace": "ci", "source": "github:acme/ci-lib/tasks.json@main"}],
            "tasks": []
        }"#,
    )
    .unwrap();

    let fetcher = Fetcher::new().with_bases(server.uri(), server.uri());
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(program::assemble(parsed, dir.path(), &fetcher).await.is_err());
}
