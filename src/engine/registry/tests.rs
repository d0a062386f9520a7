// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::TaskRegistry;
use crate::ast::TaskDef;
use crate::error::ResolverError;

fn task(name: &str) -> TaskDef {
    TaskDef {
        name: name.to_string(),
        ..TaskDef::default()
    }
}

fn registry(names: &[&str]) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    for name in names {
        registry.register(task(name)).unwrap();
    }
    registry
}

#[test]
fn test_register_and_exact_get() {
    let registry = registry(&["build", "docker.push"]);

    assert_eq!(registry.get("build").unwrap().name, "build");
    assert_eq!(registry.get("docker.push").unwrap().name, "docker.push");
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_duplicate_registration_fails() {
    let mut registry = registry(&["build"]);
    assert!(matches!(
        registry.register(task("build")),
        Err(ResolverError::AlreadyExists(_))
    ));
}

#[test]
fn test_namespace_elision_unique() {
    let registry = registry(&["docker.build", "deploy"]);
    assert_eq!(registry.get("build").unwrap().name, "docker.build");
}

#[test]
fn test_namespace_elision_ambiguous() {
    let registry = registry(&["docker.build", "npm.build"]);
    match registry.get("build") {
        Err(ResolverError::Ambiguous { candidates, .. }) => {
            assert_eq!(candidates, vec!["docker.build", "npm.build"]);
        }
        other => panic!("expected Ambiguous, got {other:?}"),
    }
}

#[test]
fn test_exact_match_beats_elision() {
    let registry = registry(&["build", "docker.build"]);
    assert_eq!(registry.get("build").unwrap().name, "build");
}

#[test]
fn test_dotted_name_never_elides() {
    let registry = registry(&["a.b.task"]);
    assert!(matches!(
        registry.get("b.task"),
        Err(ResolverError::NotFound(_))
    ));
}

#[test]
fn test_list_preserves_insertion_order() {
    let registry = registry(&["zeta", "alpha", "mid.one"]);
    let names: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid.one"]);
}

#[test]
fn test_exists() {
    let registry = registry(&["docker.build"]);
    assert!(registry.exists("docker.build"));
    assert!(registry.exists("build"));
    assert!(!registry.exists("missing"));
}
