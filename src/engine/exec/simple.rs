// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Action, variable, and throw statements.
//!
//! ```text
//! action    glyph + interpolated message --> sink
//! set       $v = interpolate(expr)
//! capture   $v = trimmed stdout of shell(expr)
//! transform $v = apply_ops($v, operations)
//! throw     named error, catchable upstream
//! ```

use crate::ast::{ActionKind, VarOp};
use crate::engine::context::ExecutionContext;
use crate::engine::interp::ops::apply_ops;
use crate::error::{DrunResult, ThrownError};

use super::Executor;

impl Executor {
    /// Writes a glyph-prefixed line. Only strict-mode interpolation can
    /// fail here.
    pub(super) fn exec_action(
        &self,
        kind: ActionKind,
        message: &str,
        ctx: &ExecutionContext,
    ) -> DrunResult<()> {
        let message = self.interp().interpolate(message, ctx)?;
        let line = format!("{}{message}", kind.glyph());
        if kind.is_stderr() {
            ctx.output().error_line(line);
        } else {
            ctx.output().line(line);
        }
        Ok(())
    }

    pub(super) async fn exec_variable(
        &self,
        op: VarOp,
        name: &str,
        value: &str,
        operations: &[String],
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        match op {
            VarOp::Set => {
                let resolved = self.interp().interpolate(value, ctx)?;
                ctx.set_variable(name, resolved);
                Ok(())
            }
            VarOp::Capture => {
                self.capture_into_variable(name, value, ctx).await
            }
            VarOp::Transform => {
                let current = ctx.get_variable(name).unwrap_or_default().to_string();
                let mut chain = Vec::with_capacity(operations.len());
                for operation in operations {
                    chain.push(self.interp().interpolate(operation, ctx)?);
                }
                ctx.set_variable(name, apply_ops(&current, &chain.join(" | ")));
                Ok(())
            }
        }
    }

    pub(super) fn exec_throw(
        &self,
        error_type: &str,
        message: &str,
        ctx: &ExecutionContext,
    ) -> DrunResult<()> {
        let message = self.interp().interpolate(message, ctx)?;
        Err(ThrownError {
            name: error_type.to_string(),
            message,
        }
        .into())
    }
}
