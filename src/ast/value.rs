// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Typed parameter values and pattern macros.
//!
//! ```text
//! raw string --parse--> TypedValue (string/number/boolean/list)
//! list form: "a,b,c" or JSON-ish "[a, b, c]"
//! pattern_macro(): semver | uuid | url | email | ipv4
//! ```

use serde::{Deserialize, Serialize};

/// Parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    #[default]
    Required,
    /// Optional with a declared default.
    Optional,
    /// Collects all remaining positional bindings into a list.
    Variadic,
}

/// Declared parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Boolean,
    List,
}

impl ParamType {
    /// Human name used in validation error messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::List => "a list",
        }
    }
}

/// A parameter value after type-directed parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Str(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
}

impl TypedValue {
    /// Parses a raw string according to the declared type.
    ///
    /// # Errors
    ///
    /// Returns the expected-type description when the raw value does not
    /// parse.
    pub fn parse(raw: &str, ty: ParamType) -> std::result::Result<Self, &'static str> {
        match ty {
            ParamType::String => Ok(Self::Str(raw.to_string())),
            ParamType::Number => raw
                .trim()
                .parse::<f64>()
                .map(Self::Number)
                .map_err(|_| ty.display_name()),
            ParamType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Self::Bool(true)),
                "false" | "no" | "0" | "off" => Ok(Self::Bool(false)),
                _ => Err(ty.display_name()),
            },
            ParamType::List => Ok(Self::List(parse_list(raw))),
        }
    }

    /// String form used by interpolation. Lists join with commas; numbers
    /// drop a trailing `.0`.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Bool(b) => b.to_string(),
            Self::List(items) => items.join(","),
        }
    }

    /// Items of a list value; scalar values yield themselves as one item.
    #[must_use]
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            other => vec![other.to_display_string()],
        }
    }
}

/// Splits a raw list: strips optional brackets, then comma-separates,
/// trimming whitespace and matching quotes per item.
pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw.trim());

    if inner.trim().is_empty() {
        return Vec::new();
    }

    inner
        .split(',')
        .map(|item| {
            let item = item.trim();
            item.strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .or_else(|| item.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
                .unwrap_or(item)
                .to_string()
        })
        .collect()
}

/// Looks up a named pattern macro, returning its regex source.
#[must_use]
pub fn pattern_macro(name: &str) -> Option<&'static str> {
    match name {
        "semver" => Some(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$"),
        "uuid" => Some(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"),
        "url" => Some(r"^https?://[^\s]+$"),
        "email" => Some(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
        "ipv4" => Some(r"^(\d{1,3}\.){3}\d{1,3}$"),
        _ => None,
    }
}
