// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Program loading and assembly.
//!
//! ```text
//! load_str / load_file  (canonical JSON from the parser frontend)
//!        |
//!        v
//! assemble(program, fetcher)
//!   per include:
//!     remote protocol --> Fetcher (drunhub:/github:/https:)
//!     anything else   --> local file next to the program
//!   fragment tasks renamed namespace.local
//!   fragment settings merged into included_settings
//!        |
//!        v
//! ProjectContext  (immutable during execution)
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::debug;

use crate::ast::{Program, ShellConfig};
use crate::error::Result;
use crate::net::Fetcher;

/// Settings merged in from included fragments, kept apart from the
/// project's own settings for `$globals` lookup precedence.
pub type IncludedSettings = BTreeMap<String, String>;

/// Loads a parsed program from its canonical JSON form.
///
/// # Errors
///
/// Returns an error when the JSON does not match the AST contract.
pub fn load_str(json: &str) -> Result<Program> {
    serde_json::from_str(json).context("invalid program JSON")
}

/// Loads a parsed program from a file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub fn load_file(path: &Path) -> Result<Program> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read program file {}", path.display()))?;
    load_str(&raw)
}

/// Resolves every include and merges the fragments into the program.
///
/// Included task names are prefixed `namespace.local`; fragment settings
/// land in the included-settings map. Duplicate fully-qualified names
/// surface later, at registration.
///
/// # Errors
///
/// Returns an error when a fragment cannot be fetched or parsed.
pub async fn assemble(
    mut program: Program,
    program_dir: &Path,
    fetcher: &Fetcher,
) -> Result<(Program, IncludedSettings)> {
    let mut included_settings = IncludedSettings::new();
    let includes = std::mem::take(&mut program.includes);

    for include in includes {
        debug!(namespace = %include.namespace, source = %include.source, "resolving include");

        let raw = if is_remote(&include.source) {
            fetcher.fetch(&include.source).await?
        } else {
            let path = program_dir.join(&include.source);
            std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read include {}", path.display()))?
        };

        let fragment = load_str(&raw)
            .with_context(|| format!("include '{}' is not a valid program", include.namespace))?;

        if let Some(project) = fragment.project {
            for (key, value) in project.settings {
                included_settings.insert(key, value);
            }
        }

        for mut task in fragment.tasks {
            task.name = format!("{}.{}", include.namespace, task.name);
            if task.source_file.is_empty() {
                task.source_file = include.source.clone();
            }
            for dependency in &mut task.dependencies {
                // Dependencies between included tasks stay inside the
                // namespace unless already qualified.
                if !dependency.task.contains('.') {
                    dependency.task = format!("{}.{}", include.namespace, dependency.task);
                }
            }
            program.tasks.push(task);
        }
    }

    Ok((program, included_settings))
}

fn is_remote(source: &str) -> bool {
    source.starts_with("drunhub:")
        || source.starts_with("github:")
        || source.starts_with("https://")
        || source.starts_with("http://")
}

/// Immutable per-program context: project identity, settings, and shell
/// configuration. Constructed once, shared by every task context.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    name: String,
    version: String,
    settings: BTreeMap<String, String>,
    included_settings: IncludedSettings,
    shell: BTreeMap<String, ShellConfig>,
}

impl ProjectContext {
    /// Builds the context from an assembled program.
    #[must_use]
    pub fn from_program(program: &Program, included_settings: IncludedSettings) -> Arc<Self> {
        let (name, version, settings, shell) = program.project.as_ref().map_or_else(
            || (String::new(), String::new(), BTreeMap::new(), BTreeMap::new()),
            |p| {
                (
                    p.name.clone(),
                    p.version.clone(),
                    p.settings.clone(),
                    p.shell.clone(),
                )
            },
        );
        Arc::new(Self {
            name,
            version,
            settings,
            included_settings,
            shell,
        })
    }

    /// Project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Project-declared setting.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Setting merged from an included fragment.
    #[must_use]
    pub fn included_setting(&self, key: &str) -> Option<&str> {
        self.included_settings.get(key).map(String::as_str)
    }

    /// Per-OS shell configuration.
    #[must_use]
    pub const fn shell_config(&self) -> &BTreeMap<String, ShellConfig> {
        &self.shell
    }
}

#[cfg(test)]
mod tests;
