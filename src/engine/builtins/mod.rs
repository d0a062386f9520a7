// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Built-in functions callable from interpolation.
//!
//! ```text
//! Builtins::standard().call(name, ctx, args)
//!   current git commit [short]   gix probe
//!   current git branch           gix probe
//!   now('%Y-%m-%d')              chrono strftime
//!   file exists / dir exists
//!   env('NAME', 'default')
//!   pwd ['basename']  /  hostname
//!   progress('name','start'|'update'|'finish',...)   20-cell bar
//!   timer('name','start'|'stop'|'show')
//!   compose status               usable|unusable|partial|down|unavailable|error
//!   secret('key'[,'default'[,'ns']])
//!
//! BuiltinState: progress + timers in one struct behind one RwLock,
//! shared across all workers of the engine instance.
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{OnceLock, RwLock};
use std::time::{Duration, Instant};

use chrono::format::{Item, StrftimeItems};

use crate::engine::context::ExecutionContext;
use crate::error::{DrunError, DrunResult, SecretError};
use crate::git;
use crate::shell;

/// Cells in a rendered progress bar.
const PROGRESS_CELLS: u64 = 20;

/// Default layout for the `now` builtin.
const DEFAULT_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// One named progress indicator.
#[derive(Debug, Clone, Copy)]
struct Progress {
    current: u64,
    total: u64,
}

/// One named wall-clock timer.
#[derive(Debug, Clone, Copy)]
enum Timer {
    Running(Instant),
    Stopped(Duration),
}

#[derive(Debug, Default)]
struct StateInner {
    progress: BTreeMap<String, Progress>,
    timers: BTreeMap<String, Timer>,
}

/// Progress and timer state shared by every worker of an engine instance.
/// All mutations happen under the write lock.
#[derive(Debug, Default)]
pub struct BuiltinState {
    inner: RwLock<StateInner>,
}

impl BuiltinState {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn progress(&self, name: &str, action: &str, args: &[String]) -> DrunResult<String> {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let parse = |raw: Option<&String>| raw.and_then(|v| v.trim().parse::<u64>().ok());

        let entry = match action {
            "start" => {
                let total = parse(args.first()).unwrap_or(100).max(1);
                let fresh = Progress { current: 0, total };
                inner.progress.insert(name.to_string(), fresh);
                fresh
            }
            "update" => {
                let existing = inner
                    .progress
                    .get(name)
                    .copied()
                    .unwrap_or(Progress { current: 0, total: 100 });
                let updated = Progress {
                    current: parse(args.first()).unwrap_or(existing.current),
                    total: parse(args.get(1)).unwrap_or(existing.total).max(1),
                };
                inner.progress.insert(name.to_string(), updated);
                updated
            }
            "finish" => {
                let existing = inner
                    .progress
                    .remove(name)
                    .unwrap_or(Progress { current: 100, total: 100 });
                Progress {
                    current: existing.total,
                    total: existing.total,
                }
            }
            other => {
                return Err(DrunError::Other(
                    format!("unknown progress action '{other}'").into_boxed_str(),
                ));
            }
        };

        Ok(render_bar(entry))
    }

    fn timer(&self, name: &str, action: &str) -> DrunResult<String> {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match action {
            "start" => {
                inner
                    .timers
                    .insert(name.to_string(), Timer::Running(Instant::now()));
                Ok(String::new())
            }
            "stop" => {
                let elapsed = match inner.timers.get(name) {
                    Some(Timer::Running(started)) => started.elapsed(),
                    Some(Timer::Stopped(elapsed)) => *elapsed,
                    None => Duration::ZERO,
                };
                inner.timers.insert(name.to_string(), Timer::Stopped(elapsed));
                Ok(format_elapsed(elapsed))
            }
            "show" => {
                let elapsed = match inner.timers.get(name) {
                    Some(Timer::Running(started)) => started.elapsed(),
                    Some(Timer::Stopped(elapsed)) => *elapsed,
                    None => Duration::ZERO,
                };
                Ok(format_elapsed(elapsed))
            }
            other => Err(DrunError::Other(
                format!("unknown timer action '{other}'").into_boxed_str(),
            )),
        }
    }
}

fn render_bar(progress: Progress) -> String {
    let filled =
        ((progress.current.min(progress.total) * PROGRESS_CELLS) / progress.total).min(PROGRESS_CELLS);
    let empty = PROGRESS_CELLS - filled;
    let pct = (progress.current.min(progress.total) * 100) / progress.total;
    format!(
        "[{}{}] {pct}%",
        "█".repeat(filled as usize),
        "░".repeat(empty as usize)
    )
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

/// Signature of every builtin.
pub type BuiltinFn = fn(&ExecutionContext, &[String]) -> DrunResult<String>;

/// The builtin registry.
pub struct Builtins {
    table: BTreeMap<&'static str, BuiltinFn>,
}

impl Builtins {
    /// The process-wide standard table.
    #[must_use]
    pub fn standard() -> &'static Self {
        static TABLE: OnceLock<Builtins> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    fn build() -> Self {
        let mut table: BTreeMap<&'static str, BuiltinFn> = BTreeMap::new();
        table.insert("current git commit", git_commit);
        table.insert("current git commit short", git_commit_short);
        table.insert("git commit", git_commit);
        table.insert("current git branch", git_branch);
        table.insert("git branch", git_branch);
        table.insert("now", now);
        table.insert("file exists", file_exists);
        table.insert("dir exists", dir_exists);
        table.insert("env", env_read);
        table.insert("pwd", pwd);
        table.insert("hostname", host_name);
        table.insert("progress", progress);
        table.insert("timer", timer);
        table.insert("compose status", compose_status);
        table.insert("docker compose status", compose_status);
        table.insert("secret", secret);
        Self { table }
    }

    /// Whether a name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name.trim())
    }

    /// Calls a builtin by name.
    ///
    /// # Errors
    ///
    /// Returns the builtin's own error, or a generic error for unknown
    /// names.
    pub fn call(&self, name: &str, ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
        match self.table.get(name.trim()) {
            Some(f) => f(ctx, args),
            None => Err(DrunError::Other(
                format!("unknown builtin '{name}'").into_boxed_str(),
            )),
        }
    }

    /// Registered names, for listings.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

// --- implementations ---

fn git_commit(_ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let short = args.first().is_some_and(|a| a.trim() == "short");
    Ok(git::head_commit(Path::new("."), short)?)
}

fn git_commit_short(_ctx: &ExecutionContext, _args: &[String]) -> DrunResult<String> {
    Ok(git::head_commit(Path::new("."), true)?)
}

fn git_branch(_ctx: &ExecutionContext, _args: &[String]) -> DrunResult<String> {
    Ok(git::current_branch(Path::new("."))?.unwrap_or_else(|| "HEAD".to_string()))
}

fn now(_ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let layout = args
        .first()
        .map_or(DEFAULT_TIME_LAYOUT, |l| l.as_str());

    let items: Vec<Item<'_>> = StrftimeItems::new(layout).collect();
    let items = if items.iter().any(|i| matches!(i, Item::Error)) {
        StrftimeItems::new(DEFAULT_TIME_LAYOUT).collect()
    } else {
        items
    };

    Ok(chrono::Local::now()
        .format_with_items(items.iter())
        .to_string())
}

fn file_exists(_ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let path = required_arg(args, "file exists")?;
    Ok(Path::new(path).is_file().to_string())
}

fn dir_exists(_ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let path = required_arg(args, "dir exists")?;
    Ok(Path::new(path).is_dir().to_string())
}

fn env_read(_ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let name = required_arg(args, "env")?;
    Ok(std::env::var(name)
        .ok()
        .or_else(|| args.get(1).cloned())
        .unwrap_or_default())
}

fn pwd(_ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let cwd = std::env::current_dir().map_err(DrunError::from)?;
    if args.first().is_some_and(|a| a.trim() == "basename") {
        return Ok(cwd
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default());
    }
    Ok(cwd.display().to_string())
}

fn host_name(_ctx: &ExecutionContext, _args: &[String]) -> DrunResult<String> {
    Ok(hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string()))
}

fn progress(ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let name = required_arg(args, "progress")?;
    let action = args.get(1).map_or("update", |a| a.as_str());
    ctx.state().progress(name, action, args.get(2..).unwrap_or(&[]))
}

fn timer(ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let name = required_arg(args, "timer")?;
    let action = args.get(1).map_or("show", |a| a.as_str());
    ctx.state().timer(name, action)
}

/// Probes the docker-compose project state with the docker CLI. Never
/// fails: problems map onto the status vocabulary.
fn compose_status(ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    if !shell::tool_exists("docker") {
        return Ok("unavailable".to_string());
    }

    let mut command = std::process::Command::new("docker");
    command.arg("compose");
    let project = args
        .first()
        .cloned()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ctx.project().name().to_string());
    if !project.is_empty() {
        command.args(["-p", &project]);
    }
    command.args(["ps", "--format", "{{.State}}"]);

    let output = match command.output() {
        Ok(output) => output,
        Err(_) => return Ok("error".to_string()),
    };
    if !output.status.success() {
        return Ok("unusable".to_string());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let states: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if states.is_empty() {
        return Ok("down".to_string());
    }
    let running = states.iter().filter(|s| s.contains("running")).count();
    Ok(if running == states.len() {
        "usable".to_string()
    } else if running > 0 {
        "partial".to_string()
    } else {
        "down".to_string()
    })
}

/// `secret(key[, default[, namespace]])`. The project name is the default
/// namespace; with no manager attached, the supplied default is the only
/// way out.
fn secret(ctx: &ExecutionContext, args: &[String]) -> DrunResult<String> {
    let key = required_arg(args, "secret")?;
    let default = args.get(1).cloned();
    let namespace = args
        .get(2)
        .cloned()
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| ctx.project().name().to_string());

    let Some(manager) = ctx.secrets() else {
        return default.ok_or_else(|| {
            DrunError::from(SecretError::BackendUnavailable(
                "no secrets manager attached".to_string(),
            ))
        });
    };

    match manager.get(&namespace, key) {
        Ok(value) => Ok(value),
        Err(SecretError::NotFound { namespace, key }) => default.ok_or_else(|| {
            DrunError::from(SecretError::NotFound { namespace, key })
        }),
        Err(e) => Err(e.into()),
    }
}

fn required_arg<'a>(args: &'a [String], builtin: &str) -> DrunResult<&'a str> {
    args.first()
        .map(String::as_str)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| {
            DrunError::Other(format!("builtin '{builtin}' needs an argument").into_boxed_str())
        })
}
