// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Interpolation engine.
//!
//! ```text
//! pass 1   ${NAME} / ${NAME:-default}     process environment
//! pass 2   {...}                          resolution ladder:
//!    1  simple variable   $v / bare ident
//!    2  ternary           cond ? 'a' : 'b'     (last : wins)
//!    3  if/then/else      if $v is 'x' then A else B
//!    4  variable post-ops $version without prefix 'v'
//!    5  current file
//!    6  builtin | op | op
//!    7  bare builtin
//!    8  fn('a', "b")      quoted arguments
//!    9  fn(param)         parameter argument
//!   10  $globals.key
//!   11  $params.key
//!   12  fallback lookup
//! ```
//!
//! Rules 2 and 3 must run before 4+: a conditional may legitimately
//! produce an empty string that later rules would mistake for no match.
//! Regexes are compiled once per engine instance. In strict mode every
//! unresolved placeholder's base identifier is collected and reported.

pub mod ops;

use regex::Regex;

use crate::engine::builtins::Builtins;
use crate::engine::context::ExecutionContext;
use crate::error::{DrunResult, InterpError};

/// Template resolver. Cheap to clone: compiled regexes are shared.
#[derive(Clone)]
pub struct Interpolator {
    env_re: Regex,
    placeholder_re: Regex,
    simple_var_re: Regex,
    bare_ident_re: Regex,
    if_re: Regex,
    call_re: Regex,
    quoted_re: Regex,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles a pattern that is a literal part of the engine.
fn compiled(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| unreachable!())
}

impl Interpolator {
    /// Compiles all patterns once.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_re: compiled(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}"),
            placeholder_re: compiled(r"\{([^{}]+)\}"),
            simple_var_re: compiled(r"^\$[A-Za-z_][A-Za-z0-9_]*$"),
            bare_ident_re: compiled(r"^[A-Za-z_][A-Za-z0-9_]*$"),
            if_re: compiled(r"^if\s+(.+?)\s+then\s+(.+?)\s+else\s+(.+)$"),
            call_re: compiled(r"^([A-Za-z_][A-Za-z0-9_ ]*?)\s*\((.*)\)$"),
            quoted_re: compiled(r#"'([^']*)'|"([^"]*)""#),
        }
    }

    /// Resolves a template against a context.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`InterpError`] listing every unresolved
    /// placeholder. Builtin failures (e.g. a missing secret without a
    /// default) propagate as their own error kinds.
    pub fn interpolate(&self, template: &str, ctx: &ExecutionContext) -> DrunResult<String> {
        let mut undefined: Vec<String> = Vec::new();

        let after_env = self.resolve_env(template, &mut undefined);
        let resolved = self.resolve_placeholders(&after_env, ctx, &mut undefined)?;

        if !ctx.allows_undefined() && !undefined.is_empty() {
            return Err(InterpError { names: undefined }.into());
        }
        Ok(resolved)
    }

    /// Pass 1: `${NAME}` and `${NAME:-default}`.
    fn resolve_env(&self, template: &str, undefined: &mut Vec<String>) -> String {
        if !template.contains("${") {
            return template.to_string();
        }

        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in self.env_re.captures_iter(template) {
            let whole = caps.get(0).unwrap_or_else(|| unreachable!());
            out.push_str(&template[last..whole.start()]);

            let name = &caps[1];
            if let Ok(value) = std::env::var(name) {
                out.push_str(&value);
            } else if let Some(default) = caps.get(2) {
                out.push_str(default.as_str());
            } else {
                // Leave the placeholder; strict mode reports it.
                out.push_str(whole.as_str());
                undefined.push(name.to_string());
            }
            last = whole.end();
        }
        out.push_str(&template[last..]);
        out
    }

    /// Pass 2: `{...}` placeholders through the ladder.
    fn resolve_placeholders(
        &self,
        template: &str,
        ctx: &ExecutionContext,
        undefined: &mut Vec<String>,
    ) -> DrunResult<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in self.placeholder_re.captures_iter(template) {
            let whole = caps.get(0).unwrap_or_else(|| unreachable!());

            // `${NAME}` left behind by pass 1 is not a script placeholder.
            if whole.start() > 0 && template.as_bytes()[whole.start() - 1] == b'$' {
                out.push_str(&template[last..whole.end()]);
                last = whole.end();
                continue;
            }

            out.push_str(&template[last..whole.start()]);
            let content = &caps[1];

            match self.resolve_content(content, ctx)? {
                Some(value) => out.push_str(&value),
                None => {
                    out.push_str(whole.as_str());
                    undefined.push(base_identifier(content));
                }
            }
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }

    /// The twelve-rule ladder. `Ok(None)` means no rule matched.
    fn resolve_content(
        &self,
        content: &str,
        ctx: &ExecutionContext,
    ) -> DrunResult<Option<String>> {
        let c = content.trim();

        // 1. Simple variable (sigil or bare identifier). A hit may be
        //    empty; a miss falls through the ladder.
        if self.simple_var_re.is_match(c) || self.bare_ident_re.is_match(c) {
            if let Some(value) = ctx.lookup_simple(c) {
                return Ok(Some(value));
            }
        }

        // 2. Ternary. The last ':' splits the branches.
        if let Some(q) = c.find('?')
            && let Some(colon) = c.rfind(':')
            && colon > q
        {
            let cond = c[..q].trim();
            let then_branch = c[q + 1..colon].trim();
            let else_branch = c[colon + 1..].trim();
            let picked = if is_truthy(&ctx.lookup_simple(cond).unwrap_or_default()) {
                then_branch
            } else {
                else_branch
            };
            return Ok(Some(unquote(picked).to_string()));
        }

        // 3. if <cond> then <A> else <B>.
        if let Some(caps) = self.if_re.captures(c) {
            let picked = if self.eval_condition(&caps[1], ctx) {
                caps.get(2).map_or("", |m| m.as_str())
            } else {
                caps.get(3).map_or("", |m| m.as_str())
            };
            return Ok(Some(unquote(picked.trim()).to_string()));
        }

        // 4. Variable post-operations: `$version without prefix 'v'`.
        if let Some(rest) = c.strip_prefix('$')
            && let Some(space) = rest.find(char::is_whitespace)
        {
            let name = &rest[..space];
            let operations = rest[space..].trim();
            if self.bare_ident_re.is_match(name)
                && let Some(value) = ctx.lookup_simple(name)
            {
                return Ok(Some(ops::apply_ops(&value, operations)));
            }
        }

        // 5. Context built-in.
        if c == "current file" {
            return Ok(Some(
                ctx.current_file().unwrap_or("<no file>").to_string(),
            ));
        }

        // 6. Builtin with piped post-operations.
        if c.contains('|') {
            let mut segments = c.split('|').map(str::trim);
            let head = segments.next().unwrap_or_default();
            if let Some(result) = self.call_builtin(head, ctx)? {
                let rest: Vec<&str> = segments.collect();
                return Ok(Some(ops::apply_ops(&result, &rest.join(" | "))));
            }
        }

        // 7-9. Builtin calls: bare, quoted arguments, parameter argument.
        if let Some(result) = self.call_builtin(c, ctx)? {
            return Ok(Some(result));
        }

        // 10. $globals.key
        if let Some(key) = c.strip_prefix("$globals.") {
            if let Some(value) = ctx.lookup_global(key) {
                return Ok(Some(value));
            }
        }

        // 11. $params.key. Dotted keys are flat lookups with the literal
        //     dotted name.
        if let Some(key) = c.strip_prefix("$params.") {
            if let Some(value) = ctx.lookup_parameter(key) {
                return Ok(Some(value));
            }
        }

        // 12. Fallback: one more parameter/variable attempt.
        if let Some(value) = ctx.lookup_simple(c) {
            return Ok(Some(value));
        }

        Ok(None)
    }

    /// Rules 7-9: bare builtin, `fn('a', "b")`, `fn(param)`.
    fn call_builtin(
        &self,
        expr: &str,
        ctx: &ExecutionContext,
    ) -> DrunResult<Option<String>> {
        let builtins = Builtins::standard();

        if builtins.contains(expr) {
            return builtins.call(expr, ctx, &[]).map(Some);
        }

        if let Some(caps) = self.call_re.captures(expr) {
            let name = caps[1].trim().to_string();
            let raw_args = caps.get(2).map_or("", |m| m.as_str());
            if builtins.contains(&name) {
                let quoted: Vec<String> = self
                    .quoted_re
                    .captures_iter(raw_args)
                    .filter_map(|c| {
                        c.get(1).or_else(|| c.get(2)).map(|m| m.as_str().to_string())
                    })
                    .collect();
                if !quoted.is_empty() || raw_args.trim().is_empty() {
                    return builtins.call(&name, ctx, &quoted).map(Some);
                }

                // Parameter-argument form: fn(paramName).
                let arg = raw_args.trim();
                if self.bare_ident_re.is_match(arg)
                    && let Some(value) = ctx.lookup_parameter(arg)
                {
                    return builtins.call(&name, ctx, &[value]).map(Some);
                }
            }
        }

        Ok(None)
    }

    /// Predicate forms: `$v`, `$v is 'x'`, `$v is not 'x'`.
    fn eval_condition(&self, cond: &str, ctx: &ExecutionContext) -> bool {
        let cond = cond.trim();

        if let Some((lhs, rhs)) = split_once_str(cond, " is not ") {
            let left = ctx.lookup_simple(lhs.trim()).unwrap_or_default();
            return left != unquote(rhs.trim());
        }
        if let Some((lhs, rhs)) = split_once_str(cond, " is ") {
            let left = ctx.lookup_simple(lhs.trim()).unwrap_or_default();
            return left == unquote(rhs.trim());
        }
        is_truthy(&ctx.lookup_simple(cond).unwrap_or_default())
    }
}

/// Truthiness: `true|yes|1|on`, case-insensitive, trimmed.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}

/// Strips one matching pair of single or double quotes.
#[must_use]
pub fn unquote(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(value)
}

fn split_once_str<'a>(haystack: &'a str, needle: &str) -> Option<(&'a str, &'a str)> {
    haystack
        .find(needle)
        .map(|i| (&haystack[..i], &haystack[i + needle.len()..]))
}

/// The identifier reported for an unresolved placeholder: the first
/// whitespace-separated token beginning with `$`, else the whole content.
fn base_identifier(content: &str) -> String {
    content
        .split_whitespace()
        .find(|token| token.starts_with('$'))
        .unwrap_or(content.trim())
        .to_string()
}

#[cfg(test)]
mod tests;
