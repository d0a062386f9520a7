// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shell, docker, and git statements: lowering into the shell adapter.
//!
//! ```text
//! shell      interpolate command --> platform shell
//!            capture kind stores trimmed stdout
//! docker/git verb + options --> argument list --> "docker ..." / "git ..."
//!            non-zero exit maps onto DockerError / GitError
//! dry run    "[DRY RUN] Would run: ..." + synthetic captures
//! ```

use std::collections::BTreeMap;

use crate::ast::ShellKind;
use crate::engine::context::ExecutionContext;
use crate::error::{DockerError, DrunResult, GitOpError, ShellError};
use crate::git;
use crate::shell::{ResolvedShell, ShellInvocation, ShellOutput};

use super::Executor;

/// Synthetic value stored in capture variables during dry runs so
/// downstream interpolation keeps resolving.
fn dry_run_placeholder(name: &str) -> String {
    format!("[dry-run:{}]", name.trim_start_matches('$'))
}

impl Executor {
    pub(super) async fn exec_shell(
        &self,
        kind: ShellKind,
        command: &str,
        capture_as: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        let command = self.interp().interpolate(command, ctx)?;

        if ctx.is_verbose() {
            ctx.output().line(format!("🏃 Running: {command}"));
        }
        if ctx.is_dry_run() {
            ctx.output()
                .line(format!("[DRY RUN] Would run: {command}"));
            if kind == ShellKind::Capture {
                let name = capture_as.unwrap_or("$output").to_string();
                let placeholder = dry_run_placeholder(&name);
                ctx.set_variable(name, placeholder);
            }
            return Ok(());
        }

        let capture = kind == ShellKind::Capture || ctx.output().is_buffer();
        let output = self
            .run_through_shell(&command, capture, true, ctx)
            .await?;

        if output.is_interrupted() {
            return Err(ShellError::Interrupted { command }.into());
        }

        if kind == ShellKind::Capture {
            let name = capture_as.unwrap_or("$output").to_string();
            ctx.set_variable(name, output.stdout().trim().to_string());
        } else if ctx.output().is_buffer() {
            // Buffered worker: replay the streams through the sink.
            for line in output.stdout().lines() {
                ctx.output().line(line);
            }
            for line in output.stderr().lines() {
                ctx.output().error_line(line);
            }
        }

        if !output.success() {
            return Err(ShellError::NonZeroExit {
                command,
                code: output.exit_code(),
            }
            .into());
        }

        if ctx.is_verbose() {
            ctx.output()
                .line(format!("✓ exit code {}", output.exit_code()));
        }
        Ok(())
    }

    /// `capture $v from <command>` (variable statement form).
    pub(super) async fn capture_into_variable(
        &self,
        name: &str,
        command: &str,
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        let command = self.interp().interpolate(command, ctx)?;

        if ctx.is_dry_run() {
            ctx.output()
                .line(format!("[DRY RUN] Would capture: {command}"));
            let placeholder = dry_run_placeholder(name);
            ctx.set_variable(name, placeholder);
            return Ok(());
        }

        let output = self.run_through_shell(&command, true, true, ctx).await?;
        if output.is_interrupted() {
            return Err(ShellError::Interrupted { command }.into());
        }
        if !output.success() {
            return Err(ShellError::NonZeroExit {
                command,
                code: output.exit_code(),
            }
            .into());
        }
        ctx.set_variable(name, output.stdout().trim().to_string());
        Ok(())
    }

    pub(super) async fn exec_docker(
        &self,
        verb: &str,
        options: &BTreeMap<String, String>,
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        let options = self.interpolate_options(options, ctx)?;
        let args = docker_args(verb, &options)?;
        let command = format!("docker {}", shell_join(&args));

        if ctx.is_dry_run() {
            ctx.output()
                .line(format!("[DRY RUN] Would run: {command}"));
            return Ok(());
        }
        if ctx.is_verbose() {
            ctx.output().line(format!("🏃 Running: {command}"));
        }

        let output = self.run_through_shell(&command, true, true, ctx).await?;
        if output.is_interrupted() {
            return Err(ShellError::Interrupted { command }.into());
        }
        if !output.success() {
            return Err(DockerError::CommandFailed {
                verb: verb.to_string(),
                message: stderr_or_code(&output),
            }
            .into());
        }
        Ok(())
    }

    pub(super) async fn exec_git(
        &self,
        verb: &str,
        options: &BTreeMap<String, String>,
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        let options = self.interpolate_options(options, ctx)?;
        let args = git::statement_args(verb, &options)?;
        let command = format!("git {}", shell_join(&args));

        if ctx.is_dry_run() {
            ctx.output()
                .line(format!("[DRY RUN] Would run: {command}"));
            return Ok(());
        }
        if ctx.is_verbose() {
            ctx.output().line(format!("🏃 Running: {command}"));
        }

        let output = self.run_through_shell(&command, true, true, ctx).await?;
        if output.is_interrupted() {
            return Err(ShellError::Interrupted { command }.into());
        }
        if !output.success() {
            return Err(GitOpError::CommandFailed {
                verb: verb.to_string(),
                message: stderr_or_code(&output),
            }
            .into());
        }
        Ok(())
    }

    /// Runs a command string through the project's platform shell.
    async fn run_through_shell(
        &self,
        command: &str,
        capture: bool,
        allow_failure: bool,
        ctx: &ExecutionContext,
    ) -> Result<ShellOutput, ShellError> {
        let shell = ResolvedShell::for_host(Some(ctx.project().shell_config()));
        let mut invocation = ShellInvocation::new(command).with_shell(shell);
        invocation = if capture {
            invocation.capture()
        } else {
            invocation.inherit()
        };
        invocation
            .allow_failure(allow_failure)
            .run_with_cancellation(ctx.cancel_token().clone())
            .await
    }

    fn interpolate_options(
        &self,
        options: &BTreeMap<String, String>,
        ctx: &ExecutionContext,
    ) -> DrunResult<BTreeMap<String, String>> {
        let mut resolved = BTreeMap::new();
        for (key, value) in options {
            resolved.insert(key.clone(), self.interp().interpolate(value, ctx)?);
        }
        Ok(resolved)
    }
}

fn stderr_or_code(output: &ShellOutput) -> String {
    let stderr = output.stderr().trim();
    if stderr.is_empty() {
        format!("exit code {}", output.exit_code())
    } else {
        stderr.to_string()
    }
}

/// Joins arguments into a command string, quoting the ones with spaces.
pub(super) fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.contains(' ') {
                format!("'{}'", arg.replace('\'', "'\\''"))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the argument list a docker statement verb lowers into.
pub(super) fn docker_args(
    verb: &str,
    options: &BTreeMap<String, String>,
) -> Result<Vec<String>, DockerError> {
    let opt = |key: &str| options.get(key).cloned();

    let args = match verb {
        "build" => {
            let mut a = vec!["build".to_string()];
            if let Some(tag) = opt("tag") {
                a.push("-t".to_string());
                a.push(tag);
            }
            if let Some(file) = opt("file") {
                a.push("-f".to_string());
                a.push(file);
            }
            a.push(opt("path").unwrap_or_else(|| ".".to_string()));
            a
        }
        "push" | "pull" => {
            let mut a = vec![verb.to_string()];
            if let Some(image) = opt("image").or_else(|| opt("tag")) {
                a.push(image);
            }
            a
        }
        "run" => {
            let mut a = vec!["run".to_string()];
            if opt("detach").is_some_and(|v| v == "true") {
                a.push("-d".to_string());
            }
            if let Some(name) = opt("name") {
                a.push("--name".to_string());
                a.push(name);
            }
            if let Some(ports) = opt("ports") {
                for mapping in ports.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    a.push("-p".to_string());
                    a.push(mapping.to_string());
                }
            }
            if let Some(image) = opt("image") {
                a.push(image);
            }
            if let Some(command) = opt("command") {
                a.push(command);
            }
            a
        }
        "stop" | "rm" => {
            let mut a = vec![verb.to_string()];
            if let Some(name) = opt("name").or_else(|| opt("container")) {
                a.push(name);
            }
            a
        }
        "up" => {
            let mut a = vec!["compose".to_string(), "up".to_string()];
            if opt("detach").is_none_or(|v| v == "true") {
                a.push("-d".to_string());
            }
            a
        }
        "down" => vec!["compose".to_string(), "down".to_string()],
        other => return Err(DockerError::UnknownVerb(other.to_string())),
    };

    Ok(args)
}
