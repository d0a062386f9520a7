// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Statement records: the typed bodies of tasks.
//!
//! ```text
//! Statement (tag = "type")
//!   action       info/step/success/warn/error/echo + message
//!   shell        run/exec/shell/capture + command [+ capture_as]
//!   file         create/read/write/append/copy/move/delete/exists/is_empty
//!   docker/git   verb + options map
//!   http         method, url, headers, auth, body [+ capture_as]
//!   conditional  condition + then/else bodies
//!   loop         variable, iterable, parallel fan-out options
//!   try          catches (typed or catch-all) + finally
//!   throw        error_type + message
//!   variable     set/capture/transform
//!   detect       os/tool probe + then/else bodies
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One statement of a task body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    /// Output line with a kind-specific glyph prefix.
    Action { kind: ActionKind, message: String },

    /// Shell command through the platform shell adapter.
    Shell {
        kind: ShellKind,
        command: String,
        #[serde(default)]
        capture_as: Option<String>,
    },

    /// File or directory operation.
    File {
        op: FileOp,
        #[serde(default)]
        target: FileTarget,
        path: String,
        /// Destination for copy/move.
        #[serde(default)]
        dest: Option<String>,
        /// Content for write/append/create.
        #[serde(default)]
        content: Option<String>,
        /// Variable receiving read content or probe results.
        #[serde(default)]
        capture_as: Option<String>,
    },

    /// Docker operation lowered into a CLI invocation.
    Docker {
        verb: String,
        #[serde(default)]
        options: BTreeMap<String, String>,
    },

    /// Git operation lowered into a CLI invocation.
    Git {
        verb: String,
        #[serde(default)]
        options: BTreeMap<String, String>,
    },

    /// HTTP request.
    Http {
        #[serde(default = "default_http_method")]
        method: String,
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
        #[serde(default)]
        auth: Option<HttpAuth>,
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        capture_as: Option<String>,
    },

    /// `if`/`when` conditional.
    Conditional {
        condition: String,
        #[serde(default)]
        then_body: Vec<Statement>,
        #[serde(default)]
        else_body: Vec<Statement>,
    },

    /// `for each` loop, optionally parallel.
    Loop {
        variable: String,
        iterable: String,
        #[serde(default)]
        parallel: bool,
        #[serde(default)]
        max_workers: Option<usize>,
        #[serde(default)]
        fail_fast: bool,
        body: Vec<Statement>,
    },

    /// `try`/`catch`/`finally`.
    Try {
        try_body: Vec<Statement>,
        #[serde(default)]
        catches: Vec<CatchClause>,
        #[serde(default)]
        finally_body: Vec<Statement>,
    },

    /// Raise a named error.
    Throw {
        #[serde(default = "default_throw_name")]
        error_type: String,
        message: String,
    },

    /// Variable mutation.
    Variable {
        op: VarOp,
        name: String,
        #[serde(default)]
        value: String,
        /// Transform operations, e.g. `["trim", "uppercase"]`.
        #[serde(default)]
        operations: Vec<String>,
    },

    /// Platform or tool detection probe.
    Detect {
        probe: DetectProbe,
        /// Expected value (OS name) or tool name.
        value: String,
        #[serde(default)]
        then_body: Vec<Statement>,
        #[serde(default)]
        else_body: Vec<Statement>,
    },
}

fn default_http_method() -> String {
    "GET".to_string()
}

fn default_throw_name() -> String {
    "Error".to_string()
}

/// Output action kinds and their glyph prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Info,
    Step,
    Success,
    Warn,
    Error,
    Echo,
}

impl ActionKind {
    /// Glyph prefix written before the interpolated message.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Info => "ℹ️  ",
            Self::Step => "🔄 ",
            Self::Success => "✅ ",
            Self::Warn => "⚠️  ",
            Self::Error => "❌ ",
            Self::Echo => "",
        }
    }

    /// Whether the line goes to stderr.
    #[must_use]
    pub const fn is_stderr(self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

/// Shell statement kinds.
///
/// `run`, `exec`, and `shell` differ only in surface syntax; `capture`
/// stores trimmed stdout into a variable instead of streaming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    Run,
    Exec,
    Shell,
    Capture,
}

/// File statement operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOp {
    Create,
    Read,
    Write,
    Append,
    Copy,
    Move,
    Delete,
    /// Existence probe; stores `true`/`false` when `capture_as` is set.
    Exists,
    /// Empty-directory probe. Entries beginning with `.` are treated as
    /// absent, so a directory holding only dotfiles counts as empty.
    IsEmpty,
}

/// Whether a file statement targets a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTarget {
    #[default]
    File,
    Dir,
}

/// Authentication for HTTP statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HttpAuth {
    Bearer { token: String },
    Basic { username: String, password: String },
}

/// One `catch` clause of a try statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    /// Error name to match; `None` is a catch-all.
    #[serde(default)]
    pub error_type: Option<String>,

    #[serde(default)]
    pub body: Vec<Statement>,
}

/// Variable statement operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarOp {
    /// `set $v to <expr>`: interpolate and assign.
    Set,
    /// `capture $v from <command>`: run through the shell, store stdout.
    Capture,
    /// `transform $v with <ops>`: rewrite an existing variable.
    Transform,
}

/// Detection probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectProbe {
    /// Matches when the host OS equals the value (`linux`, `macos`,
    /// `windows`).
    Os,
    /// Matches when the named tool is on PATH.
    Tool,
}
