// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Statement executor: tree-walk over task bodies.
//!
//! ```text
//! Executor::run_body(body, ctx)
//!      |
//!      v  per statement kind
//!   action/variable/throw       simple.rs
//!   shell / docker / git        process.rs  (lower into C8)
//!   file                        files.rs
//!   http                        http.rs
//!   conditional/loop/try/detect here
//!
//! Loops: sequential, or JoinSet + per-loop semaphore; fail-fast
//! cancels siblings via a child CancellationToken. Each iteration
//! gets an isolated child context; parallel workers buffer their
//! output and the parent flushes per completed worker.
//! ```

mod files;
mod http;
mod process;
mod simple;

use futures_util::future::BoxFuture;
use tokio::task::JoinSet;
use tracing::warn;

use crate::ast::{CatchClause, DetectProbe, Statement, value::parse_list};
use crate::engine::context::ExecutionContext;
use crate::engine::interp::{Interpolator, is_truthy, unquote};
use crate::error::{DrunError, DrunResult};
use crate::shell;

/// Tree-walking statement executor. Cheap to clone (shared regexes), so
/// parallel workers each carry one.
#[derive(Clone, Default)]
pub struct Executor {
    interp: Interpolator,
}

impl Executor {
    /// Creates an executor with a freshly compiled interpolator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interp: Interpolator::new(),
        }
    }

    /// The executor's interpolation engine.
    #[must_use]
    pub const fn interp(&self) -> &Interpolator {
        &self.interp
    }

    /// Runs a statement list in source order.
    ///
    /// # Errors
    ///
    /// Propagates the first statement error.
    pub async fn run_body(
        &self,
        body: &[Statement],
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        for statement in body {
            self.run_statement(statement, ctx).await?;
        }
        Ok(())
    }

    /// Dispatches one statement. Boxed for recursion through nested
    /// bodies.
    fn run_statement<'a>(
        &'a self,
        statement: &'a Statement,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, DrunResult<()>> {
        Box::pin(async move {
            match statement {
                Statement::Action { kind, message } => self.exec_action(*kind, message, ctx),
                Statement::Variable {
                    op,
                    name,
                    value,
                    operations,
                } => self.exec_variable(*op, name, value, operations, ctx).await,
                Statement::Throw {
                    error_type,
                    message,
                } => self.exec_throw(error_type, message, ctx),
                Statement::Shell {
                    kind,
                    command,
                    capture_as,
                } => {
                    self.exec_shell(*kind, command, capture_as.as_deref(), ctx)
                        .await
                }
                Statement::File {
                    op,
                    target,
                    path,
                    dest,
                    content,
                    capture_as,
                } => {
                    self.exec_file(
                        *op,
                        *target,
                        path,
                        dest.as_deref(),
                        content.as_deref(),
                        capture_as.as_deref(),
                        ctx,
                    )
                    .await
                }
                Statement::Docker { verb, options } => self.exec_docker(verb, options, ctx).await,
                Statement::Git { verb, options } => self.exec_git(verb, options, ctx).await,
                Statement::Http {
                    method,
                    url,
                    headers,
                    auth,
                    body,
                    capture_as,
                } => {
                    self.exec_http(
                        method,
                        url,
                        headers,
                        auth.as_ref(),
                        body.as_deref(),
                        capture_as.as_deref(),
                        ctx,
                    )
                    .await
                }
                Statement::Conditional {
                    condition,
                    then_body,
                    else_body,
                } => {
                    if self.eval_predicate(condition, ctx)? {
                        self.run_body(then_body, ctx).await
                    } else {
                        self.run_body(else_body, ctx).await
                    }
                }
                Statement::Detect {
                    probe,
                    value,
                    then_body,
                    else_body,
                } => {
                    let probed = self.interp.interpolate(value, ctx)?;
                    let matched = match probe {
                        DetectProbe::Os => os_matches(&probed),
                        DetectProbe::Tool => shell::tool_exists(probed.trim()),
                    };
                    if matched {
                        self.run_body(then_body, ctx).await
                    } else {
                        self.run_body(else_body, ctx).await
                    }
                }
                Statement::Loop {
                    variable,
                    iterable,
                    parallel,
                    max_workers,
                    fail_fast,
                    body,
                } => {
                    let items = self.loop_items(iterable, ctx)?;
                    if *parallel {
                        self.run_parallel_loop(variable, items, *max_workers, *fail_fast, body, ctx)
                            .await
                    } else {
                        self.run_sequential_loop(variable, items, body, ctx).await
                    }
                }
                Statement::Try {
                    try_body,
                    catches,
                    finally_body,
                } => self.exec_try(try_body, catches, finally_body, ctx).await,
            }
        })
    }

    // --- conditionals ---

    /// Predicate evaluator: equality, negated equality, truthiness on
    /// interpolated operands.
    fn eval_predicate(&self, condition: &str, ctx: &ExecutionContext) -> DrunResult<bool> {
        let condition = self.interp.interpolate(condition, ctx)?;
        let condition = condition.trim();

        for (needle, negated) in [(" is not ", true), ("!=", true), (" is ", false), ("==", false)]
        {
            if let Some(pos) = condition.find(needle) {
                let left = resolve_operand(&condition[..pos], ctx);
                let right = resolve_operand(&condition[pos + needle.len()..], ctx);
                return Ok((left == right) != negated);
            }
        }

        Ok(is_truthy(&resolve_operand(condition, ctx)))
    }

    // --- loops ---

    /// Materializes a loop iterable: a literal array, a numeric range, or
    /// a captured value (lines, commas, or whitespace).
    fn loop_items(&self, iterable: &str, ctx: &ExecutionContext) -> DrunResult<Vec<String>> {
        let raw = self.interp.interpolate(iterable, ctx)?;
        let raw = raw.trim();

        if let Some((start, end)) = raw.split_once("..")
            && let (Ok(start), Ok(end)) = (start.trim().parse::<i64>(), end.trim().parse::<i64>())
        {
            // Inclusive bounds, descending ranges empty.
            return Ok((start..=end).map(|n| n.to_string()).collect());
        }

        if raw.starts_with('[') {
            return Ok(parse_list(raw));
        }

        if raw.contains('\n') {
            return Ok(raw
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect());
        }
        if raw.contains(',') {
            return Ok(parse_list(raw));
        }
        Ok(raw.split_whitespace().map(str::to_string).collect())
    }

    async fn run_sequential_loop(
        &self,
        variable: &str,
        items: Vec<String>,
        body: &[Statement],
        ctx: &ExecutionContext,
    ) -> DrunResult<()> {
        for item in items {
            let mut child = ctx.child_for_iteration(variable, &item);
            self.run_body(body, &mut child).await?;
        }
        Ok(())
    }

    /// Parallel fan-out: bounded workers, isolated child contexts,
    /// buffered output flushed per completed worker. Fail-fast cancels
    /// siblings through a child token; otherwise all workers drain and
    /// the first error (in completion order) is reported.
    async fn run_parallel_loop(
        &self,
        variable: &str,
        items: Vec<String>,
        max_workers: Option<usize>,
        fail_fast: bool,
        body: &[Statement],
        ctx: &ExecutionContext,
    ) -> DrunResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        // An explicit bound gets its own pool; otherwise the loop shares
        // the context-wide worker semaphore.
        let semaphore = max_workers.map_or_else(
            || ctx.workers(),
            |n| std::sync::Arc::new(tokio::sync::Semaphore::new(n.max(1))),
        );
        let loop_token = ctx.cancel_token().child_token();

        let mut set: JoinSet<(usize, DrunResult<()>)> = JoinSet::new();
        let mut buffers = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            let buffer = crate::engine::output::Output::buffer();
            buffers.push(buffer.clone());

            let child = ctx
                .child_for_iteration(variable, &item)
                .with_output(buffer)
                .with_cancel_token(loop_token.clone());
            let executor = self.clone();
            let body = body.to_vec();
            let semaphore = std::sync::Arc::clone(&semaphore);
            let token = loop_token.clone();

            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, Ok(()));
                };
                // A sibling already failed; don't start this iteration.
                if token.is_cancelled() {
                    return (index, Ok(()));
                }
                let mut child = child;
                let result = executor.run_body(&body, &mut child).await;
                (index, result)
            });
        }

        let mut first_error: Option<DrunError> = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    ctx.output().flush_lines(buffers[index].drain());
                    if let Err(e) = result
                        && first_error.is_none()
                    {
                        if fail_fast {
                            loop_token.cancel();
                        }
                        first_error = Some(e);
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        if fail_fast {
                            loop_token.cancel();
                        }
                        first_error =
                            Some(DrunError::Other(format!("worker panicked: {e}").into_boxed_str()));
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    // --- try/catch/finally ---

    async fn exec_try(
        &self,
        try_body: &[Statement],
        catches: &[CatchClause],
        finally_body: &[Statement],
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        let attempted = self.run_body(try_body, ctx).await;

        let outcome = match attempted {
            Ok(()) => Ok(()),
            Err(e) if e.is_catchable() => {
                let name = e.catch_name().unwrap_or_default().to_string();
                let clause = catches
                    .iter()
                    .find(|c| c.error_type.as_deref().is_none_or(|t| t == name));
                match clause {
                    Some(clause) => {
                        ctx.set_variable("$error", e.to_string());
                        self.run_body(&clause.body, ctx).await
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        };

        // Finally runs on both success and error paths.
        let finalized = self.run_body(finally_body, ctx).await;

        match (outcome, finalized) {
            (Ok(()), finalized) => finalized,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(finally_error)) => {
                warn!(error = %finally_error, "finally block failed while propagating");
                Err(e)
            }
        }
    }
}

/// Resolves a predicate operand: `$var` looks up, quoted literals
/// unquote, anything else is literal.
fn resolve_operand(raw: &str, ctx: &ExecutionContext) -> String {
    let raw = raw.trim();
    if let Some(bare) = raw.strip_prefix('$')
        && bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !bare.is_empty()
    {
        return ctx.lookup_simple(raw).unwrap_or_default();
    }
    unquote(raw).to_string()
}

/// OS probe matching with the common aliases.
fn os_matches(value: &str) -> bool {
    let wanted = match value.trim().to_ascii_lowercase().as_str() {
        "darwin" | "mac" | "osx" => "macos".to_string(),
        "win" => "windows".to_string(),
        other => other.to_string(),
    };
    std::env::consts::OS == wanted
}
