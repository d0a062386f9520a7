// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Parsed-program data model.
//!
//! The drun frontend (lexer + parser, external to this crate) emits a
//! canonical JSON form of the program; these types are that contract.
//!
//! ```text
//! Program
//!   project?   name, version, settings, shell config per OS
//!   includes   namespace + source (drunhub:/github:/https:)
//!   tasks[]    TaskDef
//!                parameters[]    name, kind, type, constraints
//!                dependencies[]  task, parallel, sequential
//!                body[]          Statement (tagged enum)
//! ```
//!
//! Statement bodies are trees: conditionals, loops, and try/catch carry
//! nested statement lists. The executor matches on the tag.

pub mod statement;
pub mod value;

pub use statement::{
    ActionKind, CatchClause, DetectProbe, FileOp, FileTarget, HttpAuth, ShellKind, Statement,
    VarOp,
};
pub use value::{ParamKind, ParamType, TypedValue};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ParamError;

/// A complete parsed program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    /// Script language version declared by the file.
    #[serde(default)]
    pub version: String,

    /// Project header, if the file declares one.
    #[serde(default)]
    pub project: Option<Project>,

    /// Included modules, resolved during program assembly.
    #[serde(default)]
    pub includes: Vec<Include>,

    /// All tasks declared in the file.
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
}

/// Project header: name, version, settings, and per-OS shell configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub name: String,

    #[serde(default)]
    pub version: String,

    /// Free-form settings, readable from interpolation via `$globals.key`.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,

    /// Shell configuration keyed by OS name (`linux`, `macos`, `windows`).
    #[serde(default)]
    pub shell: BTreeMap<String, ShellConfig>,
}

/// Shell configuration for one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Shell executable, e.g. `/bin/bash`.
    pub executable: String,

    /// Arguments placed before the command string.
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for every command.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

/// An include declaration: a namespace plus a remote or local source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Include {
    /// Namespace prefixed onto every included task name.
    pub namespace: String,

    /// Source location (`drunhub:`, `github:`, `https://`, or a local path).
    pub source: String,
}

/// A task definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDef {
    /// Fully-qualified name (`[namespace.]local` after assembly).
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    #[serde(default)]
    pub body: Vec<Statement>,

    /// Path of the file the task came from.
    #[serde(default)]
    pub source_file: String,
}

impl TaskDef {
    /// Returns the local name, i.e. the part after the last namespace dot.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.rsplit_once('.').map_or(&*self.name, |(_, l)| l)
    }
}

/// A dependency entry on a task.
///
/// Consecutive entries with `parallel && !sequential` collapse into one
/// parallel group; a `sequential` entry always forms a singleton group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Target task name (may need namespace elision at resolve time).
    pub task: String,

    #[serde(default)]
    pub parallel: bool,

    #[serde(default)]
    pub sequential: bool,
}

/// A declared task parameter with its constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(default)]
    pub kind: ParamKind,

    #[serde(default, rename = "type")]
    pub ty: ParamType,

    /// Default value for `optional` parameters.
    #[serde(default)]
    pub default: Option<String>,

    /// Enum constraint: accepted literal values.
    #[serde(default)]
    pub enum_values: Vec<String>,

    /// Numeric range constraint (inclusive).
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,

    /// Raw regex pattern constraint.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Named pattern macro constraint (`semver`, `uuid`, `url`, `email`,
    /// `ipv4`).
    #[serde(default)]
    pub pattern_macro: Option<String>,
}

impl Parameter {
    /// Parses and validates a raw value against every declared constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`ParamError`] naming the first violated constraint.
    pub fn validate(&self, raw: &str) -> std::result::Result<TypedValue, ParamError> {
        let value = TypedValue::parse(raw, self.ty).map_err(|expected| {
            ParamError::InvalidType {
                parameter: self.name.clone(),
                expected,
                value: raw.to_string(),
            }
        })?;

        if !self.enum_values.is_empty() && !self.enum_values.iter().any(|v| v == raw) {
            return Err(ParamError::NotInEnum {
                parameter: self.name.clone(),
                value: raw.to_string(),
                allowed: self.enum_values.join(", "),
            });
        }

        if let TypedValue::Number(n) = value {
            let min = self.min.unwrap_or(f64::NEG_INFINITY);
            let max = self.max.unwrap_or(f64::INFINITY);
            if n < min || n > max {
                return Err(ParamError::OutOfRange {
                    parameter: self.name.clone(),
                    value: n,
                    min: self.min.unwrap_or(f64::MIN),
                    max: self.max.unwrap_or(f64::MAX),
                });
            }
        }

        if let Some(pattern) = self.effective_pattern()? {
            let re = regex::Regex::new(&pattern).map_err(|_| ParamError::PatternMismatch {
                parameter: self.name.clone(),
                pattern: pattern.clone(),
                value: raw.to_string(),
            })?;
            if !re.is_match(raw) {
                return Err(ParamError::PatternMismatch {
                    parameter: self.name.clone(),
                    pattern,
                    value: raw.to_string(),
                });
            }
        }

        Ok(value)
    }

    /// Resolves the pattern constraint: named macro first, raw regex second.
    fn effective_pattern(&self) -> std::result::Result<Option<String>, ParamError> {
        if let Some(name) = &self.pattern_macro {
            return match value::pattern_macro(name) {
                Some(re) => Ok(Some(re.to_string())),
                None => Err(ParamError::UnknownMacro(name.clone())),
            };
        }
        Ok(self.pattern.clone())
    }

    /// Validated default value, if one is declared.
    ///
    /// # Errors
    ///
    /// Returns a [`ParamError`] if the declared default violates the
    /// parameter's own constraints.
    pub fn default_value(&self) -> std::result::Result<Option<TypedValue>, ParamError> {
        match &self.default {
            Some(raw) => self.validate(raw).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests;
