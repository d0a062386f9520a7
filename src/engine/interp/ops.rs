// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! String operations DSL.
//!
//! ```text
//! apply_ops(value, "trim | uppercase")
//!   uppercase / lowercase / trim / capitalize / length
//!   without prefix 'p'   without suffix 's'
//!   replace 'x' by 'y'
//! ```
//!
//! Shared by variable post-operations (`{$version without prefix 'v'}`),
//! builtin pipes (`{pwd | basename}` style chains), and the `transform`
//! statement. Unknown operations leave the value untouched.

use tracing::warn;

/// Applies a `|`-separated chain of operations.
#[must_use]
pub fn apply_ops(value: &str, ops: &str) -> String {
    ops.split('|')
        .map(str::trim)
        .filter(|op| !op.is_empty())
        .fold(value.to_string(), |acc, op| apply_op(&acc, op))
}

/// Applies one operation.
#[must_use]
pub fn apply_op(value: &str, op: &str) -> String {
    let op = op.trim();

    match op {
        "uppercase" => return value.to_uppercase(),
        "lowercase" => return value.to_lowercase(),
        "trim" => return value.trim().to_string(),
        "length" => return value.chars().count().to_string(),
        "capitalize" => {
            let mut chars = value.chars();
            return chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            });
        }
        "basename" => {
            return std::path::Path::new(value)
                .file_name()
                .map_or_else(|| value.to_string(), |n| n.to_string_lossy().into_owned());
        }
        _ => {}
    }

    if let Some(rest) = op.strip_prefix("without prefix") {
        let operand = quoted_operands(rest);
        if let [prefix] = operand.as_slice() {
            return value.strip_prefix(prefix.as_str()).unwrap_or(value).to_string();
        }
    }

    if let Some(rest) = op.strip_prefix("without suffix") {
        let operand = quoted_operands(rest);
        if let [suffix] = operand.as_slice() {
            return value.strip_suffix(suffix.as_str()).unwrap_or(value).to_string();
        }
    }

    if let Some(rest) = op.strip_prefix("replace") {
        let operands = quoted_operands(rest);
        if let [from, to] = operands.as_slice() {
            return value.replace(from.as_str(), to.as_str());
        }
    }

    warn!(operation = %op, "unknown string operation, value left unchanged");
    value.to_string()
}

/// Extracts single- or double-quoted operands, in order.
fn quoted_operands(raw: &str) -> Vec<String> {
    let mut operands = Vec::new();
    let mut chars = raw.char_indices().peekable();

    while let Some((start, quote)) = chars.next() {
        if quote != '\'' && quote != '"' {
            continue;
        }
        let rest = &raw[start + quote.len_utf8()..];
        if let Some(end) = rest.find(quote) {
            operands.push(rest[..end].to_string());
            // Skip past the closing quote.
            let consumed = start + quote.len_utf8() + end;
            while chars.peek().is_some_and(|(i, _)| *i <= consumed) {
                chars.next();
            }
        }
    }
    operands
}
