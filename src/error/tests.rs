// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::*;

#[test]
fn test_error_size_stays_small() {
    // All variants are boxed, so the enum is a tag plus a pointer.
    assert!(std::mem::size_of::<DrunError>() <= 24);
}

#[test]
fn test_catch_names_for_operational_errors() {
    let shell: DrunError = ShellError::NonZeroExit {
        command: "false".to_string(),
        code: 1,
    }
    .into();
    assert_eq!(shell.catch_name(), Some("ShellError"));

    let file: DrunError = FileOpError::NotFound("/tmp/missing".to_string()).into();
    assert_eq!(file.catch_name(), Some("FileError"));

    let thrown: DrunError = ThrownError {
        name: "NetworkError".to_string(),
        message: "down".to_string(),
    }
    .into();
    assert_eq!(thrown.catch_name(), Some("NetworkError"));
}

#[test]
fn test_resolver_and_interp_errors_not_catchable() {
    let circular: DrunError = ResolverError::Circular {
        path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
    }
    .into();
    assert!(!circular.is_catchable());

    let undefined: DrunError = InterpError {
        names: vec!["$missing".to_string()],
    }
    .into();
    assert!(!undefined.is_catchable());
}

#[test]
fn test_undefined_variable_message_format() {
    let err = InterpError {
        names: vec!["$missing".to_string()],
    };
    assert_eq!(err.to_string(), "undefined variable: {$missing}");

    let err = InterpError {
        names: vec!["$a".to_string(), "$b".to_string()],
    };
    assert_eq!(err.to_string(), "undefined variables: {$a}, {$b}");
}

#[test]
fn test_circular_error_shows_cycle_path() {
    let err = ResolverError::Circular {
        path: vec!["build".to_string(), "test".to_string(), "build".to_string()],
    };
    insta::assert_snapshot!(err.to_string(), @"circular dependency detected: build -> test -> build");
}

#[test]
fn test_ambiguous_error_lists_candidates() {
    let err = ResolverError::Ambiguous {
        name: "build".to_string(),
        candidates: vec!["docker.build".to_string(), "npm.build".to_string()],
    };
    insta::assert_snapshot!(err.to_string(), @"task name 'build' is ambiguous: matches docker.build, npm.build");
}

#[test]
fn test_file_error_classification_from_io() {
    let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(
        FileOpError::from_io("/a", not_found),
        FileOpError::NotFound(_)
    ));

    let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
    assert!(matches!(
        FileOpError::from_io("/a", denied),
        FileOpError::PermissionDenied(_)
    ));
}

#[test]
fn test_bail_out_is_fatal() {
    let err = bail_out("cannot continue");
    assert!(matches!(err, DrunError::Bailed(_)));
    assert_eq!(err.to_string(), "fatal error: cannot continue");
}
