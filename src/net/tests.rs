// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::*;
use crate::error::FetchError;

#[test]
fn test_plain_http_rejected() {
    let fetcher = Fetcher::new();
    assert!(matches!(
        fetcher.parse_source("http://example.com/tasks.json"),
        Err(FetchError::PlainHttpRejected(_))
    ));
}

#[test]
fn test_unknown_protocol_rejected() {
    let fetcher = Fetcher::new();
    assert!(matches!(
        fetcher.parse_source("ftp://example.com/x"),
        Err(FetchError::UnsupportedProtocol(_))
    ));
    assert!(matches!(
        fetcher.parse_source("just-a-name"),
        Err(FetchError::UnsupportedProtocol(_))
    ));
}

#[test]
fn test_github_source_parses_with_ref() {
    let fetcher = Fetcher::new();
    let parsed = fetcher
        .parse_source("github:acme/tools/deploy/tasks.json@v2")
        .unwrap();
    assert_eq!(
        parsed,
        Source::CodeHost {
            owner: "acme".to_string(),
            repo: "tools".to_string(),
            path: "deploy/tasks.json".to_string(),
            reference: Some("v2".to_string()),
        }
    );
}

#[test]
fn test_github_source_requires_owner_repo_path() {
    let fetcher = Fetcher::new();
    assert!(fetcher.parse_source("github:acme/tools").is_err());
}

#[test]
fn test_drunhub_expands_to_hub_repo() {
    let fetcher = Fetcher::new();
    let parsed = fetcher.parse_source("drunhub:docker/tasks.json").unwrap();
    match parsed {
        Source::CodeHost {
            owner,
            repo,
            path,
            reference,
        } => {
            assert_eq!(owner, "phillarmonic");
            assert_eq!(repo, "drun-hub");
            assert_eq!(path, "docker/tasks.json");
            assert_eq!(reference, None);
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn test_drunhub_denied_folder() {
    let fetcher = Fetcher::new().with_denied_folders(vec!["internal".to_string()]);
    assert!(matches!(
        fetcher.parse_source("drunhub:internal/secrets.json"),
        Err(FetchError::DeniedFolder(_))
    ));
}

#[tokio::test]
async fn test_https_fetch_via_mock_server() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"tasks\": []}"))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new();
    let body = fetcher
        .fetch(&format!("{}/tasks.json", server.uri().replace("http://", "https://")))
        .await;
    // wiremock serves plain http; the https rewrite cannot connect, but the
    // protocol gate must have accepted the URL shape before the transport
    // error.
    assert!(matches!(body, Err(FetchError::Reqwest(_))));

    // Direct download against the mock (bypassing the protocol gate)
    // succeeds.
    let body = fetcher
        .download(&format!("{}/tasks.json", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "{\"tasks\": []}");
}

#[tokio::test]
async fn test_default_branch_from_api_and_cache() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tools"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"default_branch\": \"trunk\"}")
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().with_bases(server.uri(), server.uri());
    assert_eq!(fetcher.default_branch("acme", "tools").await.unwrap(), "trunk");
    // Second call must come from the cache (expect(1) above enforces it).
    assert_eq!(fetcher.default_branch("acme", "tools").await.unwrap(), "trunk");
}

#[tokio::test]
async fn test_default_branch_probe_fallback() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    // API endpoint is down.
    Mock::given(method("GET"))
        .and(path("/repos/acme/tools"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // main does not exist, master does.
    Mock::given(method("HEAD"))
        .and(path("/acme/tools/main/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/acme/tools/master/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().with_bases(server.uri(), server.uri());
    assert_eq!(
        fetcher.default_branch("acme", "tools").await.unwrap(),
        "master"
    );
}

#[tokio::test]
async fn test_rate_limit_reported_verbatim() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/tools"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API rate limit exceeded"))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new().with_bases(server.uri(), server.uri());
    match fetcher.default_branch("acme", "tools").await {
        Err(FetchError::RateLimited(body)) => assert_eq!(body, "API rate limit exceeded"),
        other => panic!("expected rate limit error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_download_cap_enforced() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    let oversized = vec![b'x'; DOWNLOAD_CAP + 1];
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(oversized))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new();
    assert!(matches!(
        fetcher.download(&format!("{}/big", server.uri())).await,
        Err(FetchError::TooLarge { .. })
    ));
}
