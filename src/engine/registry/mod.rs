// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Task registry: flat name map with namespace elision.
//!
//! ```text
//! register("docker.build") register("deploy")
//! get("docker.build")  exact hit
//! get("build")         no dot + unique local name --> docker.build
//! get("lint")          two namespaces declare it  --> Ambiguous
//! list()               insertion order
//! ```

use std::collections::BTreeMap;

use crate::ast::TaskDef;
use crate::error::ResolverError;

/// Registry mapping fully-qualified task names to definitions.
///
/// Population happens on the calling thread before execution; lookups are
/// read-only afterwards.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<TaskDef>,
    index: BTreeMap<String, usize>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task under its fully-qualified name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::AlreadyExists`] when the name is taken.
    pub fn register(&mut self, task: TaskDef) -> Result<(), ResolverError> {
        if self.index.contains_key(&task.name) {
            return Err(ResolverError::AlreadyExists(task.name));
        }
        self.index.insert(task.name.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Looks up a task: exact match first, then one-level namespace
    /// elision when the name carries no dot and exactly one registered
    /// task has that local name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NotFound`] or [`ResolverError::Ambiguous`].
    pub fn get(&self, name: &str) -> Result<&TaskDef, ResolverError> {
        if let Some(&i) = self.index.get(name) {
            return Ok(&self.tasks[i]);
        }

        if !name.contains('.') {
            let candidates: Vec<&TaskDef> = self
                .tasks
                .iter()
                .filter(|t| t.local_name() == name)
                .collect();
            match candidates.as_slice() {
                [single] => return Ok(single),
                [] => {}
                multiple => {
                    return Err(ResolverError::Ambiguous {
                        name: name.to_string(),
                        candidates: multiple.iter().map(|t| t.name.clone()).collect(),
                    });
                }
            }
        }

        Err(ResolverError::NotFound(name.to_string()))
    }

    /// Boolean form of [`TaskRegistry::get`].
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// All tasks in insertion order.
    #[must_use]
    pub fn list(&self) -> &[TaskDef] {
        &self.tasks
    }

    /// Number of registered tasks.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests;
