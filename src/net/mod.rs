// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote include fetcher.
//!
//! ```text
//! Fetcher::new().fetch(source)
//!   drunhub:path[@ref]        --> hub owner/repo + deny-list check
//!   github:owner/repo/p[@ref] --> raw download at ref
//!   https://...               --> direct download
//!   http://                   --> rejected
//!
//! missing ref:
//!   GET api /repos/{owner}/{repo} --> default_branch  (cached 1 h)
//!   on API failure: HEAD probe main, then master
//!
//! Global client: OnceLock, 30 s timeout, descriptive UA
//! Caps: 10 MB per download; GITHUB_TOKEN bearer when present
//! Rate limits (403/429): body reported verbatim
//! ```
//!
//! The fetcher runs during program assembly, never during task execution.

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::FetchError;

/// Hard cap on downloaded include size.
pub const DOWNLOAD_CAP: usize = 10 * 1024 * 1024;

/// Timeout shared by all fetcher requests.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a probed default branch stays cached.
const BRANCH_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Fixed upstream expanded from the `drunhub:` alias.
const HUB_OWNER: &str = "phillarmonic";
const HUB_REPO: &str = "drun-hub";

/// Global HTTP client - initialized once, reused across all fetches.
/// Falls back to a basic client if custom configuration fails.
fn global_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(format!("drun-rs/{}", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Pre-validated spinner style for include downloads.
fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
        })
        .clone()
}

/// The process-wide client, shared with the HTTP statement executor.
pub(crate) fn shared_client() -> &'static Client {
    global_client()
}

/// A parsed include source.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    /// `github:owner/repo/path[@ref]` (also the expansion of `drunhub:`).
    CodeHost {
        owner: String,
        repo: String,
        path: String,
        reference: Option<String>,
    },
    /// Plain HTTPS URL.
    Https(String),
}

/// Remote include fetcher with a default-branch cache.
pub struct Fetcher {
    client: Client,
    api_base: String,
    raw_base: String,
    denied_folders: Vec<String>,
    branch_cache: Mutex<HashMap<String, (String, Instant)>>,
    show_progress: bool,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    /// Creates a fetcher with the shared global client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: global_client().clone(),
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            denied_folders: vec![".github".to_string(), "internal".to_string()],
            branch_cache: Mutex::new(HashMap::new()),
            show_progress: false,
        }
    }

    /// Overrides the API and raw-download hosts (test servers).
    #[must_use]
    pub fn with_bases(mut self, api_base: impl Into<String>, raw_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.raw_base = raw_base.into();
        self
    }

    /// Replaces the hub folder deny-list.
    #[must_use]
    pub fn with_denied_folders(mut self, folders: Vec<String>) -> Self {
        self.denied_folders = folders;
        self
    }

    /// Shows a spinner while downloading.
    #[must_use]
    pub const fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fetches an include source to a string.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for unsupported protocols, denied hub
    /// folders, oversized downloads, and transport failures.
    pub async fn fetch(&self, source: &str) -> Result<String, FetchError> {
        let parsed = self.parse_source(source)?;

        let spinner = if self.show_progress {
            let bar = ProgressBar::new_spinner().with_style(spinner_style());
            bar.set_message(format!("fetching {source}"));
            bar.enable_steady_tick(Duration::from_millis(100));
            Some(bar)
        } else {
            None
        };

        let result = match parsed {
            Source::Https(url) => self.download(&url).await,
            Source::CodeHost {
                owner,
                repo,
                path,
                reference,
            } => {
                let reference = match reference {
                    Some(r) => r,
                    None => self.default_branch(&owner, &repo).await?,
                };
                let url = format!("{}/{owner}/{repo}/{reference}/{path}", self.raw_base);
                self.download(&url).await
            }
        };

        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        result
    }

    /// Splits a source string into its protocol form.
    fn parse_source(&self, source: &str) -> Result<Source, FetchError> {
        if let Some(rest) = source.strip_prefix("drunhub:") {
            let (path, reference) = split_ref(rest);
            let folder = path.split('/').next().unwrap_or_default();
            if self.denied_folders.iter().any(|d| d == folder) {
                return Err(FetchError::DeniedFolder(path.to_string()));
            }
            return Ok(Source::CodeHost {
                owner: HUB_OWNER.to_string(),
                repo: HUB_REPO.to_string(),
                path: path.to_string(),
                reference,
            });
        }

        if let Some(rest) = source.strip_prefix("github:") {
            let (spec, reference) = split_ref(rest);
            let mut parts = spec.splitn(3, '/');
            let owner = parts.next().unwrap_or_default();
            let repo = parts.next().unwrap_or_default();
            let path = parts.next().unwrap_or_default();
            if owner.is_empty() || repo.is_empty() || path.is_empty() {
                return Err(FetchError::UnsupportedProtocol(source.to_string()));
            }
            return Ok(Source::CodeHost {
                owner: owner.to_string(),
                repo: repo.to_string(),
                path: path.to_string(),
                reference,
            });
        }

        if source.starts_with("https://") {
            return Ok(Source::Https(source.to_string()));
        }
        if source.starts_with("http://") {
            return Err(FetchError::PlainHttpRejected(source.to_string()));
        }
        Err(FetchError::UnsupportedProtocol(source.to_string()))
    }

    /// Resolves the default branch of a repository, caching hits for an
    /// hour. Falls back to HEAD-probing `main` then `master` when the API
    /// is unreachable.
    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, FetchError> {
        let cache_key = format!("{owner}/{repo}");
        {
            let cache = self
                .branch_cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some((branch, stored_at)) = cache.get(&cache_key)
                && stored_at.elapsed() < BRANCH_CACHE_TTL
            {
                return Ok(branch.clone());
            }
        }

        match self.query_default_branch(owner, repo).await {
            Ok(branch) => {
                let mut cache = self
                    .branch_cache
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                cache.insert(cache_key, (branch.clone(), Instant::now()));
                Ok(branch)
            }
            Err(FetchError::RateLimited(body)) => Err(FetchError::RateLimited(body)),
            Err(e) => {
                warn!(owner, repo, error = %e, "default branch query failed, probing");
                self.probe_branches(owner, repo).await
            }
        }
    }

    /// Asks the repository metadata endpoint for the default branch.
    async fn query_default_branch(&self, owner: &str, repo: &str) -> Result<String, FetchError> {
        let url = format!("{}/repos/{owner}/{repo}", self.api_base);
        let mut request = self.client.get(&url);
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::RateLimited(body));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        payload
            .get("default_branch")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| FetchError::DefaultBranch {
                repo: format!("{owner}/{repo}"),
            })
    }

    /// HEAD-probes `main` then `master` at the raw host.
    async fn probe_branches(&self, owner: &str, repo: &str) -> Result<String, FetchError> {
        for candidate in ["main", "master"] {
            let url = format!("{}/{owner}/{repo}/{candidate}/", self.raw_base);
            debug!(url = %url, "probing branch");
            match self.client.head(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    return Ok(candidate.to_string());
                }
                Ok(_) | Err(_) => {}
            }
        }
        Err(FetchError::DefaultBranch {
            repo: format!("{owner}/{repo}"),
        })
    }

    /// Downloads a URL to a string, enforcing the size cap while
    /// streaming.
    async fn download(&self, url: &str) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::RateLimited(body));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(length) = response.content_length()
            && length as usize > DOWNLOAD_CAP
        {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit: DOWNLOAD_CAP,
            });
        }

        let mut body: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > DOWNLOAD_CAP {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    limit: DOWNLOAD_CAP,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Splits `path@ref` into the path and optional ref.
fn split_ref(raw: &str) -> (&str, Option<String>) {
    raw.rsplit_once('@')
        .map_or((raw, None), |(path, reference)| {
            (path, Some(reference.to_string()))
        })
}

#[cfg(test)]
mod tests;
