// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dependency resolver: topological order and parallel-group partition.
//!
//! ```text
//! resolve("main")
//!   DFS, in_stack cycle check
//!   deps before dependents --> [shared, a, b, main]
//!
//! parallel_groups(task)
//!   d1(par) d2(par) d3(seq) d4(par)
//!   --> [[d1, d2], [d3], [d4]]
//!   flattened output == declared order
//! ```

use std::collections::BTreeSet;

use crate::ast::{Dependency, TaskDef};
use crate::error::ResolverError;

use super::registry::TaskRegistry;

/// Stateless resolver over a registry; every call builds fresh visited
/// sets.
pub struct DependencyResolver<'r> {
    registry: &'r TaskRegistry,
}

impl<'r> DependencyResolver<'r> {
    /// Creates a resolver over a populated registry.
    #[must_use]
    pub const fn new(registry: &'r TaskRegistry) -> Self {
        Self { registry }
    }

    /// Produces a linear execution order rooted at `name`, dependencies
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Circular`] with the cycle path,
    /// [`ResolverError::Missing`] for a dependency naming an unregistered
    /// task, or the registry's lookup errors for the root.
    pub fn resolve(&self, name: &str) -> Result<Vec<TaskDef>, ResolverError> {
        let root = self.registry.get(name)?;

        let mut order = Vec::new();
        let mut visited = BTreeSet::new();
        let mut in_stack = BTreeSet::new();
        let mut path = Vec::new();

        self.visit(root, &mut order, &mut visited, &mut in_stack, &mut path)?;
        Ok(order)
    }

    fn visit(
        &self,
        task: &TaskDef,
        order: &mut Vec<TaskDef>,
        visited: &mut BTreeSet<String>,
        in_stack: &mut BTreeSet<String>,
        path: &mut Vec<String>,
    ) -> Result<(), ResolverError> {
        if visited.contains(&task.name) {
            return Ok(());
        }

        in_stack.insert(task.name.clone());
        path.push(task.name.clone());

        for dependency in &task.dependencies {
            let dep = match self.registry.get(&dependency.task) {
                Ok(dep) => dep,
                Err(ResolverError::NotFound(_)) => {
                    return Err(ResolverError::Missing {
                        task: task.name.clone(),
                        dependency: dependency.task.clone(),
                    });
                }
                Err(e) => return Err(e),
            };

            if in_stack.contains(&dep.name) {
                let start = path.iter().position(|n| n == &dep.name).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].to_vec();
                cycle.push(dep.name.clone());
                return Err(ResolverError::Circular { path: cycle });
            }

            self.visit(dep, order, visited, in_stack, path)?;
        }

        in_stack.remove(&task.name);
        path.pop();
        visited.insert(task.name.clone());
        order.push(task.clone());
        Ok(())
    }

    /// Partitions a task's dependency list left-to-right: consecutive
    /// `parallel && !sequential` entries merge into one group, everything
    /// else flushes the current group and forms a singleton. Within a
    /// group no order is imposed; between groups the declared order
    /// holds.
    #[must_use]
    pub fn parallel_groups(task: &TaskDef) -> Vec<Vec<Dependency>> {
        let mut groups: Vec<Vec<Dependency>> = Vec::new();
        let mut current: Vec<Dependency> = Vec::new();

        for dependency in &task.dependencies {
            if dependency.parallel && !dependency.sequential {
                current.push(dependency.clone());
            } else {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                groups.push(vec![dependency.clone()]);
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }
}

#[cfg(test)]
mod tests;
