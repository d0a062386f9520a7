// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::*;
use crate::error::ParamError;

fn parameter(ty: ParamType) -> Parameter {
    Parameter {
        name: "p".to_string(),
        kind: ParamKind::Required,
        ty,
        default: None,
        enum_values: Vec::new(),
        min: None,
        max: None,
        pattern: None,
        pattern_macro: None,
    }
}

#[test]
fn test_typed_value_parse_number() {
    assert_eq!(
        TypedValue::parse("42", ParamType::Number),
        Ok(TypedValue::Number(42.0))
    );
    assert!(TypedValue::parse("forty-two", ParamType::Number).is_err());
}

#[test]
fn test_typed_value_parse_boolean_forms() {
    for raw in ["true", "YES", "1", "on"] {
        assert_eq!(
            TypedValue::parse(raw, ParamType::Boolean),
            Ok(TypedValue::Bool(true)),
            "{raw} should be true"
        );
    }
    for raw in ["false", "No", "0", "off"] {
        assert_eq!(
            TypedValue::parse(raw, ParamType::Boolean),
            Ok(TypedValue::Bool(false)),
            "{raw} should be false"
        );
    }
    assert!(TypedValue::parse("maybe", ParamType::Boolean).is_err());
}

#[test]
fn test_typed_value_parse_list_forms() {
    let expected = TypedValue::List(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    assert_eq!(TypedValue::parse("a,b,c", ParamType::List), Ok(expected.clone()));
    assert_eq!(
        TypedValue::parse("[a, b, c]", ParamType::List),
        Ok(expected.clone())
    );
    assert_eq!(
        TypedValue::parse("['a', \"b\", c]", ParamType::List),
        Ok(expected)
    );
    assert_eq!(
        TypedValue::parse("", ParamType::List),
        Ok(TypedValue::List(Vec::new()))
    );
}

#[test]
fn test_display_string_drops_integer_fraction() {
    assert_eq!(TypedValue::Number(3.0).to_display_string(), "3");
    assert_eq!(TypedValue::Number(3.5).to_display_string(), "3.5");
}

#[test]
fn test_validate_enum_constraint() {
    let mut param = parameter(ParamType::String);
    param.enum_values = vec!["dev".to_string(), "prod".to_string()];

    assert!(param.validate("dev").is_ok());
    assert!(matches!(
        param.validate("staging"),
        Err(ParamError::NotInEnum { .. })
    ));
}

#[test]
fn test_validate_numeric_range() {
    let mut param = parameter(ParamType::Number);
    param.min = Some(1.0);
    param.max = Some(10.0);

    assert!(param.validate("5").is_ok());
    assert!(matches!(
        param.validate("11"),
        Err(ParamError::OutOfRange { .. })
    ));
}

#[test]
fn test_validate_pattern_macro() {
    let mut param = parameter(ParamType::String);
    param.pattern_macro = Some("semver".to_string());

    assert!(param.validate("1.2.3").is_ok());
    assert!(param.validate("1.2.3-rc.1").is_ok());
    assert!(matches!(
        param.validate("v1.2.3"),
        Err(ParamError::PatternMismatch { .. })
    ));

    param.pattern_macro = Some("nonsense".to_string());
    assert!(matches!(
        param.validate("x"),
        Err(ParamError::UnknownMacro(_))
    ));
}

#[test]
fn test_validate_raw_regex_pattern() {
    let mut param = parameter(ParamType::String);
    param.pattern = Some("^v\\d+$".to_string());

    assert!(param.validate("v3").is_ok());
    assert!(param.validate("3").is_err());
}

#[test]
fn test_local_name_strips_namespace() {
    let task = TaskDef {
        name: "docker.build".to_string(),
        ..TaskDef::default()
    };
    assert_eq!(task.local_name(), "build");

    let task = TaskDef {
        name: "build".to_string(),
        ..TaskDef::default()
    };
    assert_eq!(task.local_name(), "build");
}

#[test]
fn test_statement_json_round_trip() {
    let json = r#"{
        "type": "loop",
        "variable": "$item",
        "iterable": "[a, b]",
        "parallel": true,
        "fail_fast": true,
        "body": [
            {"type": "action", "kind": "info", "message": "{$item}"}
        ]
    }"#;

    let statement: Statement = serde_json::from_str(json).unwrap();
    match &statement {
        Statement::Loop {
            variable,
            parallel,
            fail_fast,
            max_workers,
            body,
            ..
        } => {
            assert_eq!(variable, "$item");
            assert!(parallel);
            assert!(fail_fast);
            assert_eq!(*max_workers, None);
            assert_eq!(body.len(), 1);
        }
        other => panic!("expected loop, got {other:?}"),
    }

    let round = serde_json::to_string(&statement).unwrap();
    let again: Statement = serde_json::from_str(&round).unwrap();
    assert!(matches!(again, Statement::Loop { .. }));
}

#[test]
fn test_program_json_minimal() {
    let json = r#"{
        "version": "2.0",
        "project": {"name": "demo", "version": "1.0.0"},
        "tasks": [
            {"name": "hello", "body": [
                {"type": "action", "kind": "echo", "message": "hi"}
            ]}
        ]
    }"#;

    let program: Program = serde_json::from_str(json).unwrap();
    assert_eq!(program.tasks.len(), 1);
    assert_eq!(program.project.unwrap().name, "demo");
}
