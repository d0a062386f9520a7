// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git support: gix read probes and CLI lowering.
//!
//! ```text
//! probes (read)     --> gix, no subprocess
//!   current_branch, head_commit
//! statements (write) --> git CLI through the shell adapter
//! ```
//!
//! The interpolation built-ins `current git branch` / `current git commit`
//! use the probes; the `git` statement verbs spawn the CLI.

use std::path::Path;

use crate::error::{GitOpError, GixError};

/// Returns whether the path is inside a git work tree.
#[must_use]
pub fn is_git_repo(path: &Path) -> bool {
    gix::discover(path).is_ok()
}

/// Current branch name (`None` if HEAD is detached).
///
/// # Errors
///
/// Returns a [`GitOpError`] if repository discovery or head resolution
/// fails.
pub fn current_branch(path: &Path) -> Result<Option<String>, GitOpError> {
    let repo = gix::discover(path).map_err(|e| GixError::Discover(Box::new(e)))?;
    let head = repo.head_name().map_err(GixError::Head)?;
    Ok(head.map(|name| name.shorten().to_string()))
}

/// HEAD commit id as full hex, or the first 7 characters when `short`.
///
/// # Errors
///
/// Returns a [`GitOpError`] if repository discovery or head resolution
/// fails, or the repository has no commits.
pub fn head_commit(path: &Path, short: bool) -> Result<String, GitOpError> {
    let repo = gix::discover(path).map_err(|e| GixError::Discover(Box::new(e)))?;
    let head = repo.head().map_err(GixError::Head)?;
    let id = head.id().ok_or(GixError::Unborn)?;
    let hex = id.to_string();
    if short {
        Ok(hex.chars().take(7).collect())
    } else {
        Ok(hex)
    }
}

/// Builds the argument list a git statement verb lowers into.
///
/// The executor hands the arguments to the shell adapter; nothing is
/// spawned here.
///
/// # Errors
///
/// Returns [`GitOpError::UnknownVerb`] for verbs outside the catalogue.
pub fn statement_args(
    verb: &str,
    options: &std::collections::BTreeMap<String, String>,
) -> Result<Vec<String>, GitOpError> {
    let opt = |key: &str| options.get(key).cloned();

    let mut args: Vec<String> = match verb {
        "clone" => {
            let mut a = vec!["clone".to_string(), "--quiet".to_string()];
            if opt("shallow").is_some_and(|v| v == "true") {
                a.push("--depth".to_string());
                a.push("1".to_string());
            }
            if let Some(branch) = opt("branch") {
                a.push("--branch".to_string());
                a.push(branch);
            }
            if let Some(url) = opt("url") {
                a.push(url);
            }
            if let Some(dest) = opt("dest") {
                a.push(dest);
            }
            a
        }
        "pull" => vec!["pull".to_string(), "--quiet".to_string()],
        "fetch" => vec!["fetch".to_string(), "--quiet".to_string()],
        "checkout" => {
            let mut a = vec![
                "-c".to_string(),
                "advice.detachedHead=false".to_string(),
                "checkout".to_string(),
                "-q".to_string(),
            ];
            if let Some(what) = opt("ref").or_else(|| opt("branch")) {
                a.push(what);
            }
            a
        }
        "add" => {
            let mut a = vec!["add".to_string()];
            a.push(opt("path").unwrap_or_else(|| ".".to_string()));
            a
        }
        "commit" => {
            let mut a = vec!["commit".to_string()];
            if let Some(message) = opt("message") {
                a.push("-m".to_string());
                a.push(message);
            }
            a
        }
        "push" => {
            let mut a = vec!["push".to_string(), "--quiet".to_string()];
            if let Some(remote) = opt("remote") {
                a.push(remote);
                if let Some(branch) = opt("branch") {
                    a.push(branch);
                }
            }
            a
        }
        "tag" => {
            let mut a = vec!["tag".to_string()];
            if let Some(name) = opt("name") {
                a.push(name);
            }
            a
        }
        "status" => vec!["status".to_string(), "--short".to_string()],
        other => return Err(GitOpError::UnknownVerb(other.to_string())),
    };

    if let Some(remote) = options.get("remote")
        && matches!(verb, "pull" | "fetch")
    {
        args.push(remote.clone());
        if let Some(branch) = options.get("branch") {
            args.push(branch.clone());
        }
    }

    Ok(args)
}
