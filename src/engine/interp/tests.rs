// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;
use std::sync::Arc;

use super::*;
use crate::ast::{Program, Project, TypedValue};
use crate::engine::context::ExecutionContext;
use crate::error::DrunError;
use crate::program::ProjectContext;

fn project_ctx() -> Arc<ProjectContext> {
    let program = Program {
        project: Some(Project {
            name: "demo".to_string(),
            version: "2.1.0".to_string(),
            settings: BTreeMap::from([("registry".to_string(), "ghcr.io/acme".to_string())]),
            shell: BTreeMap::new(),
        }),
        ..Program::default()
    };
    let included = BTreeMap::from([("hub_channel".to_string(), "stable".to_string())]);
    ProjectContext::from_program(&program, included)
}

fn ctx() -> ExecutionContext {
    let mut parameters = BTreeMap::new();
    parameters.insert("deploy".to_string(), TypedValue::Bool(true));
    parameters.insert("env.region".to_string(), TypedValue::Str("eu-1".to_string()));
    parameters.insert("count".to_string(), TypedValue::Number(3.0));

    let mut ctx = ExecutionContext::new(project_ctx())
        .with_parameters(parameters)
        .with_location(Some("deploy.drun".to_string()), Some("ship".to_string()));
    ctx.set_variable("$sha", "abc1234");
    ctx.set_variable("version_tag", "v2.1.0");
    ctx.set_variable("$empty", "");
    ctx
}

fn strict() -> ExecutionContext {
    ctx().with_allow_undefined(false)
}

fn permissive() -> ExecutionContext {
    ctx().with_allow_undefined(true)
}

#[test]
fn test_idempotent_on_literal_free_strings() {
    let interp = Interpolator::new();
    let ctx = strict();
    for template in ["plain text", "", "no placeholders here $x", "a } b"] {
        assert_eq!(interp.interpolate(template, &ctx).unwrap(), template);
    }
}

#[test]
fn test_env_default_applies_when_unset() {
    let interp = Interpolator::new();
    let resolved = interp
        .interpolate("hi ${DRUN_TEST_UNSET_USER:-anon}!", &strict())
        .unwrap();
    assert_eq!(resolved, "hi anon!");
}

#[test]
fn test_env_present_wins_over_default() {
    // PATH is always set in a test environment.
    let interp = Interpolator::new();
    let resolved = interp
        .interpolate("${PATH:-nope}", &strict())
        .unwrap();
    assert_ne!(resolved, "nope");
    assert!(!resolved.is_empty());
}

#[test]
fn test_env_empty_default_is_legal() {
    let interp = Interpolator::new();
    let resolved = interp
        .interpolate("[${DRUN_TEST_UNSET_USER:-}]", &strict())
        .unwrap();
    assert_eq!(resolved, "[]");
}

#[test]
fn test_env_missing_strict_errors_permissive_keeps() {
    let interp = Interpolator::new();

    let err = interp
        .interpolate("${DRUN_TEST_UNSET_USER}", &strict())
        .unwrap_err();
    assert!(matches!(err, DrunError::Interp(_)));

    let kept = interp
        .interpolate("x ${DRUN_TEST_UNSET_USER} y", &permissive())
        .unwrap();
    assert_eq!(kept, "x ${DRUN_TEST_UNSET_USER} y");
}

#[test]
fn test_simple_variable_resolution_order() {
    let interp = Interpolator::new();
    let ctx = strict();

    // Sigil-keyed shell capture.
    assert_eq!(interp.interpolate("{$sha}", &ctx).unwrap(), "abc1234");
    // Plain variable, referenced with sigil.
    assert_eq!(interp.interpolate("{$version_tag}", &ctx).unwrap(), "v2.1.0");
    // Parameter.
    assert_eq!(interp.interpolate("{$count}", &ctx).unwrap(), "3");
    // Project built-ins.
    assert_eq!(interp.interpolate("{project}", &ctx).unwrap(), "demo");
    assert_eq!(interp.interpolate("{version}", &ctx).unwrap(), "2.1.0");
    // Project setting.
    assert_eq!(
        interp.interpolate("{registry}", &ctx).unwrap(),
        "ghcr.io/acme"
    );
}

#[test]
fn test_empty_variable_is_a_hit_not_a_miss() {
    let interp = Interpolator::new();
    let resolved = interp.interpolate("[{$empty}]", &strict()).unwrap();
    assert_eq!(resolved, "[]");
}

#[test]
fn test_ternary_both_branches() {
    let interp = Interpolator::new();
    let ctx = strict();

    assert_eq!(
        interp
            .interpolate("{$deploy ? 'go' : 'stop'}", &ctx)
            .unwrap(),
        "go"
    );
    assert_eq!(
        interp
            .interpolate("{$missing_flag ? 'go' : 'stop'}", &ctx)
            .unwrap(),
        "stop"
    );
}

#[test]
fn test_spec_scenario_env_and_ternary() {
    let interp = Interpolator::new();
    let resolved = interp
        .interpolate(
            "hi ${DRUN_TEST_UNSET_USER:-anon}, {$deploy ? 'go' : 'stop'}",
            &strict(),
        )
        .unwrap();
    assert_eq!(resolved, "hi anon, go");
}

#[test]
fn test_if_then_else_forms() {
    let interp = Interpolator::new();
    let ctx = strict();

    assert_eq!(
        interp
            .interpolate("{if $version_tag is 'v2.1.0' then 'match' else 'differ'}", &ctx)
            .unwrap(),
        "match"
    );
    assert_eq!(
        interp
            .interpolate("{if $version_tag is not 'v2.1.0' then 'differ' else 'match'}", &ctx)
            .unwrap(),
        "match"
    );
    assert_eq!(
        interp
            .interpolate("{if $deploy then \"yes\" else \"no\"}", &ctx)
            .unwrap(),
        "yes"
    );
}

#[test]
fn test_variable_post_operations() {
    let interp = Interpolator::new();
    let ctx = strict();

    assert_eq!(
        interp
            .interpolate("{$version_tag without prefix 'v'}", &ctx)
            .unwrap(),
        "2.1.0"
    );
    assert_eq!(
        interp
            .interpolate("{$sha uppercase}", &ctx)
            .unwrap(),
        "ABC1234"
    );
    assert_eq!(
        interp
            .interpolate("{$version_tag without prefix 'v' | replace '.' by '_'}", &ctx)
            .unwrap(),
        "2_1_0"
    );
}

#[test]
fn test_current_file_builtin() {
    let interp = Interpolator::new();
    assert_eq!(
        interp.interpolate("{current file}", &strict()).unwrap(),
        "deploy.drun"
    );

    let bare = ExecutionContext::new(project_ctx());
    assert_eq!(
        interp.interpolate("{current file}", &bare).unwrap(),
        "<no file>"
    );
}

#[test]
fn test_bare_builtin_and_pipe() {
    let interp = Interpolator::new();
    let ctx = strict();

    let host = interp.interpolate("{hostname}", &ctx).unwrap();
    assert!(!host.is_empty());

    let upper = interp
        .interpolate("{env('DRUN_TEST_UNSET_USER', 'abc') | uppercase}", &ctx)
        .unwrap();
    assert_eq!(upper, "ABC");
}

#[test]
fn test_quoted_argument_call() {
    let interp = Interpolator::new();
    let resolved = interp
        .interpolate("{file exists('/definitely/not/here.txt')}", &strict())
        .unwrap();
    assert_eq!(resolved, "false");
}

#[test]
fn test_parameter_argument_call() {
    let interp = Interpolator::new();
    let mut parameters = BTreeMap::new();
    parameters.insert("layout".to_string(), TypedValue::Str("%Y".to_string()));
    let ctx = ExecutionContext::new(project_ctx()).with_parameters(parameters);

    let year = interp.interpolate("{now(layout)}", &ctx).unwrap();
    assert_eq!(year.len(), 4);
}

#[test]
fn test_globals_lookup() {
    let interp = Interpolator::new();
    let ctx = strict();

    assert_eq!(
        interp.interpolate("{$globals.registry}", &ctx).unwrap(),
        "ghcr.io/acme"
    );
    // Included settings come second.
    assert_eq!(
        interp.interpolate("{$globals.hub_channel}", &ctx).unwrap(),
        "stable"
    );
    // Special keys.
    assert_eq!(interp.interpolate("{$globals.project}", &ctx).unwrap(), "demo");
    assert_eq!(
        interp.interpolate("{$globals.current_task}", &ctx).unwrap(),
        "ship"
    );
}

#[test]
fn test_params_lookup_flat_dotted_key() {
    let interp = Interpolator::new();
    let ctx = strict();

    assert_eq!(interp.interpolate("{$params.count}", &ctx).unwrap(), "3");
    assert_eq!(
        interp.interpolate("{$params.env.region}", &ctx).unwrap(),
        "eu-1"
    );
}

#[test]
fn test_strict_mode_undefined_message() {
    let interp = Interpolator::new();
    let err = interp.interpolate("{$missing}", &strict()).unwrap_err();
    assert_eq!(err.to_string(), "undefined variable: {$missing}");
}

#[test]
fn test_strict_mode_totality() {
    let interp = Interpolator::new();
    let ctx = strict();

    // Every placeholder resolvable => Ok.
    assert!(interp.interpolate("{$sha} {project}", &ctx).is_ok());
    // One unresolvable => Err.
    assert!(interp.interpolate("{$sha} {$nope}", &ctx).is_err());
}

#[test]
fn test_permissive_mode_leaves_placeholders() {
    let interp = Interpolator::new();
    let kept = interp
        .interpolate("keep {$nope} here", &permissive())
        .unwrap();
    assert_eq!(kept, "keep {$nope} here");
}

#[test]
fn test_truthiness_table() {
    for v in ["true", "YES", " 1 ", "On"] {
        assert!(is_truthy(v), "{v} should be truthy");
    }
    for v in ["false", "0", "", "off", "2", "enabled"] {
        assert!(!is_truthy(v), "{v} should be falsy");
    }
}

#[test]
fn test_unquote() {
    assert_eq!(unquote("'a'"), "a");
    assert_eq!(unquote("\"b\""), "b");
    assert_eq!(unquote("plain"), "plain");
    assert_eq!(unquote("'unbalanced"), "'unbalanced");
}
