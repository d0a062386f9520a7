// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::DependencyResolver;
use crate::ast::{Dependency, TaskDef};
use crate::engine::registry::TaskRegistry;
use crate::error::ResolverError;

fn dep(task: &str) -> Dependency {
    Dependency {
        task: task.to_string(),
        parallel: false,
        sequential: false,
    }
}

fn par(task: &str) -> Dependency {
    Dependency {
        task: task.to_string(),
        parallel: true,
        sequential: false,
    }
}

fn seq(task: &str) -> Dependency {
    Dependency {
        task: task.to_string(),
        parallel: false,
        sequential: true,
    }
}

fn task(name: &str, dependencies: Vec<Dependency>) -> TaskDef {
    TaskDef {
        name: name.to_string(),
        dependencies,
        ..TaskDef::default()
    }
}

fn registry(tasks: Vec<TaskDef>) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    for t in tasks {
        registry.register(t).unwrap();
    }
    registry
}

#[test]
fn test_diamond_resolution_order() {
    let registry = registry(vec![
        task("shared", vec![]),
        task("a", vec![dep("shared")]),
        task("b", vec![dep("shared")]),
        task("main", vec![dep("a"), dep("b")]),
    ]);

    let order = DependencyResolver::new(&registry).resolve("main").unwrap();
    let names: Vec<&str> = order.iter().map(|t| t.name.as_str()).collect();

    assert_eq!(names.len(), 4);
    assert_eq!(names[0], "shared");
    assert_eq!(names[3], "main");
    assert!(names.contains(&"a"));
    assert!(names.contains(&"b"));
}

#[test]
fn test_topological_soundness() {
    let registry = registry(vec![
        task("fmt", vec![]),
        task("lint", vec![dep("fmt")]),
        task("test", vec![dep("lint")]),
        task("release", vec![dep("test"), dep("lint")]),
    ]);

    let order = DependencyResolver::new(&registry)
        .resolve("release")
        .unwrap();
    let position = |name: &str| order.iter().position(|t| t.name == name).unwrap();

    assert!(position("fmt") < position("lint"));
    assert!(position("lint") < position("test"));
    assert!(position("test") < position("release"));
}

#[test]
fn test_cycle_rejected_with_path() {
    let registry = registry(vec![
        task("a", vec![dep("b")]),
        task("b", vec![dep("c")]),
        task("c", vec![dep("a")]),
    ]);

    match DependencyResolver::new(&registry).resolve("a") {
        Err(ResolverError::Circular { path }) => {
            assert_eq!(path.first().map(String::as_str), Some("a"));
            assert_eq!(path.last().map(String::as_str), Some("a"));
            assert!(path.len() >= 3);
        }
        other => panic!("expected Circular, got {other:?}"),
    }
}

#[test]
fn test_self_cycle_rejected() {
    let registry = registry(vec![task("loop", vec![dep("loop")])]);
    assert!(matches!(
        DependencyResolver::new(&registry).resolve("loop"),
        Err(ResolverError::Circular { .. })
    ));
}

#[test]
fn test_missing_dependency() {
    let registry = registry(vec![task("main", vec![dep("ghost")])]);
    match DependencyResolver::new(&registry).resolve("main") {
        Err(ResolverError::Missing { task, dependency }) => {
            assert_eq!(task, "main");
            assert_eq!(dependency, "ghost");
        }
        other => panic!("expected Missing, got {other:?}"),
    }
}

#[test]
fn test_dependency_elision_through_namespace() {
    let registry = registry(vec![
        task("docker.build", vec![]),
        task("main", vec![dep("build")]),
    ]);

    let order = DependencyResolver::new(&registry).resolve("main").unwrap();
    let names: Vec<&str> = order.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["docker.build", "main"]);
}

#[test]
fn test_parallel_group_partition() {
    let t = task(
        "main",
        vec![par("d1"), par("d2"), seq("d3"), par("d4")],
    );

    let groups = DependencyResolver::parallel_groups(&t);
    let shape: Vec<Vec<&str>> = groups
        .iter()
        .map(|g| g.iter().map(|d| d.task.as_str()).collect())
        .collect();

    assert_eq!(shape, vec![vec!["d1", "d2"], vec!["d3"], vec!["d4"]]);
}

#[test]
fn test_parallel_grouping_closure() {
    let t = task(
        "main",
        vec![par("a"), seq("b"), dep("c"), par("d"), par("e"), dep("f")],
    );

    let flattened: Vec<String> = DependencyResolver::parallel_groups(&t)
        .into_iter()
        .flatten()
        .map(|d| d.task)
        .collect();
    let declared: Vec<String> = t.dependencies.iter().map(|d| d.task.clone()).collect();

    assert_eq!(flattened, declared);
}

#[test]
fn test_resolver_is_stateless_between_calls() {
    let registry = registry(vec![
        task("base", vec![]),
        task("main", vec![dep("base")]),
    ]);

    let resolver = DependencyResolver::new(&registry);
    let first = resolver.resolve("main").unwrap();
    let second = resolver.resolve("main").unwrap();

    assert_eq!(first.len(), second.len());
}
