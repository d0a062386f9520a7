// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shell adapter: platform shell selection and process execution.
//!
//! ```text
//! ShellInvocation::new(command)
//!   .with_shell(project config) .cwd() .env()
//!   .capture() / .quiet() / .inherit() / .allow_failure()
//!        |
//!        v
//!   resolve shell for host OS
//!     project shell config, else
//!     /bin/bash -l -i -c  (unix)
//!     pwsh -NoProfile -NonInteractive -Command  (windows)
//!        |
//!        v
//!   run() / run_with_cancellation(token)
//!     spawn, stream/capture, kill on cancel
//!        |
//!        v
//!   ShellOutput { exit_code, stdout, stderr, interrupted }
//!
//! StreamFlags: FORWARD_TO_LOG, BIT_BUCKET, KEEP_IN_STRING, INHERIT
//! ```

mod runner;

use bitflags::bitflags;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};

use crate::ast::ShellConfig;

/// Static cache for executable paths resolved via `which`.
static TOOL_CACHE: OnceLock<RwLock<BTreeMap<String, Option<PathBuf>>>> = OnceLock::new();

fn tool_cache() -> &'static RwLock<BTreeMap<String, Option<PathBuf>>> {
    TOOL_CACHE.get_or_init(|| RwLock::new(BTreeMap::new()))
}

/// Finds the full path of a tool on PATH, caching the result (including
/// negative results).
#[must_use]
pub fn find_tool(name: &str) -> Option<PathBuf> {
    {
        let cache = tool_cache()
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(cached) = cache.get(name) {
            return cached.clone();
        }
    }

    let resolved = which::which(name).ok();
    let mut cache = tool_cache()
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    cache.insert(name.to_string(), resolved.clone());
    resolved
}

/// Returns whether a tool is on PATH.
#[must_use]
pub fn tool_exists(name: &str) -> bool {
    find_tool(name).is_some()
}

bitflags! {
    /// Flags controlling stream handling for stdout/stderr.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StreamFlags: u32 {
        /// Forward output line-wise to tracing logs.
        const FORWARD_TO_LOG = 0x01;
        /// Discard output.
        const BIT_BUCKET = 0x02;
        /// Keep output in a string for later retrieval.
        const KEEP_IN_STRING = 0x04;
        /// Inherit from the parent process.
        const INHERIT = 0x08;
    }
}

impl Default for StreamFlags {
    fn default() -> Self {
        Self::INHERIT
    }
}

/// Output from a completed shell command.
#[derive(Debug, Clone, Default)]
pub struct ShellOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
    interrupted: bool,
}

impl ShellOutput {
    pub(crate) const fn new(
        exit_code: i32,
        stdout: String,
        stderr: String,
        interrupted: bool,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            interrupted,
        }
    }

    /// The process exit code (0 = success).
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Captured stdout (if `KEEP_IN_STRING` was set).
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Captured stderr (if `KEEP_IN_STRING` was set).
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Whether the command was cancelled mid-flight.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Whether the command exited successfully.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// The shell a command runs through, after platform resolution.
#[derive(Debug, Clone)]
pub struct ResolvedShell {
    executable: String,
    args: Vec<String>,
    environment: BTreeMap<String, String>,
}

impl ResolvedShell {
    /// Picks the shell for the host OS from project configuration, falling
    /// back to the platform default. The interpolated command is always
    /// passed as the final argument.
    #[must_use]
    pub fn for_host(config: Option<&BTreeMap<String, ShellConfig>>) -> Self {
        if let Some(shell) = config.and_then(|c| c.get(std::env::consts::OS)) {
            return Self {
                executable: shell.executable.clone(),
                args: shell.args.clone(),
                environment: shell.environment.clone(),
            };
        }
        Self::platform_default()
    }

    /// The built-in default shell for the host platform.
    #[must_use]
    pub fn platform_default() -> Self {
        #[cfg(windows)]
        {
            Self {
                executable: "pwsh".to_string(),
                args: vec![
                    "-NoProfile".to_string(),
                    "-NonInteractive".to_string(),
                    "-Command".to_string(),
                ],
                environment: BTreeMap::new(),
            }
        }
        #[cfg(not(windows))]
        {
            Self {
                executable: "/bin/bash".to_string(),
                args: vec!["-l".to_string(), "-i".to_string(), "-c".to_string()],
                environment: BTreeMap::new(),
            }
        }
    }

    /// Shell executable path.
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Arguments placed before the command string.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Shell-level environment variables.
    #[must_use]
    pub const fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }
}

/// Builder for configuring and running one shell command.
#[derive(Debug)]
pub struct ShellInvocation {
    command: String,
    shell: ResolvedShell,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
    stdout: StreamFlags,
    stderr: StreamFlags,
    allow_failure: bool,
    name: Option<String>,
}

impl ShellInvocation {
    /// Creates an invocation for a command string using the platform
    /// default shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: ResolvedShell::platform_default(),
            cwd: None,
            env: BTreeMap::new(),
            stdout: StreamFlags::INHERIT,
            stderr: StreamFlags::INHERIT,
            allow_failure: false,
            name: None,
        }
    }

    /// Uses an already-resolved shell.
    #[must_use]
    pub fn with_shell(mut self, shell: ResolvedShell) -> Self {
        self.shell = shell;
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Adds environment variables on top of the inherited environment.
    #[must_use]
    pub fn env(mut self, vars: BTreeMap<String, String>) -> Self {
        self.env.extend(vars);
        self
    }

    /// Convenience: capture both streams to strings.
    #[must_use]
    pub const fn capture(mut self) -> Self {
        self.stdout = StreamFlags::KEEP_IN_STRING;
        self.stderr = StreamFlags::KEEP_IN_STRING;
        self
    }

    /// Convenience: discard all output.
    #[must_use]
    pub const fn quiet(mut self) -> Self {
        self.stdout = StreamFlags::BIT_BUCKET;
        self.stderr = StreamFlags::BIT_BUCKET;
        self
    }

    /// Convenience: inherit stdout/stderr from the parent.
    #[must_use]
    pub const fn inherit(mut self) -> Self {
        self.stdout = StreamFlags::INHERIT;
        self.stderr = StreamFlags::INHERIT;
        self
    }

    /// Forward output to tracing logs instead of the console.
    #[must_use]
    pub const fn forward_to_log(mut self) -> Self {
        self.stdout = StreamFlags::FORWARD_TO_LOG;
        self.stderr = StreamFlags::FORWARD_TO_LOG;
        self
    }

    /// Don't fail on a non-zero exit code.
    #[must_use]
    pub const fn allow_failure(mut self, allow: bool) -> Self {
        self.allow_failure = allow;
        self
    }

    /// Sets a display name for logging.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    // Getters for the runner.

    pub(crate) fn command_str(&self) -> &str {
        &self.command
    }

    pub(crate) const fn shell_ref(&self) -> &ResolvedShell {
        &self.shell
    }

    pub(crate) const fn working_dir(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    pub(crate) const fn extra_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub(crate) const fn stdout_flags(&self) -> StreamFlags {
        self.stdout
    }

    pub(crate) const fn stderr_flags(&self) -> StreamFlags {
        self.stderr
    }

    pub(crate) const fn failure_allowed(&self) -> bool {
        self.allow_failure
    }

    pub(crate) fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.command
                .split_whitespace()
                .next()
                .unwrap_or("shell")
                .to_string()
        })
    }
}

#[cfg(test)]
mod tests;
