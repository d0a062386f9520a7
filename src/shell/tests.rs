// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::ast::ShellConfig;
use crate::error::ShellError;

#[test]
fn test_platform_default_shell() {
    let shell = ResolvedShell::platform_default();
    #[cfg(not(windows))]
    {
        assert_eq!(shell.executable(), "/bin/bash");
        assert_eq!(shell.args(), ["-l", "-i", "-c"]);
    }
    #[cfg(windows)]
    {
        assert_eq!(shell.executable(), "pwsh");
    }
}

#[test]
fn test_project_shell_config_wins() {
    let mut config = BTreeMap::new();
    config.insert(
        std::env::consts::OS.to_string(),
        ShellConfig {
            executable: "/bin/sh".to_string(),
            args: vec!["-c".to_string()],
            environment: BTreeMap::from([("CI".to_string(), "1".to_string())]),
        },
    );

    let shell = ResolvedShell::for_host(Some(&config));
    assert_eq!(shell.executable(), "/bin/sh");
    assert_eq!(shell.args(), ["-c"]);
    assert_eq!(shell.environment().get("CI").map(String::as_str), Some("1"));
}

#[test]
fn test_missing_os_entry_falls_back() {
    let mut config = BTreeMap::new();
    config.insert(
        "plan9".to_string(),
        ShellConfig {
            executable: "/bin/rc".to_string(),
            args: Vec::new(),
            environment: BTreeMap::new(),
        },
    );

    let shell = ResolvedShell::for_host(Some(&config));
    assert_eq!(
        shell.executable(),
        ResolvedShell::platform_default().executable()
    );
}

#[test]
fn test_display_name_from_command() {
    let invocation = ShellInvocation::new("cargo build --release");
    assert_eq!(invocation.display_name(), "cargo");

    let invocation = ShellInvocation::new("ls").name("listing");
    assert_eq!(invocation.display_name(), "listing");
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_captures_stdout() {
    let output = ShellInvocation::new("echo hello")
        .with_shell(sh())
        .capture()
        .run()
        .await
        .unwrap();

    assert!(output.success());
    assert_eq!(output.stdout().trim(), "hello");
}

#[cfg(unix)]
#[tokio::test]
async fn test_nonzero_exit_is_shell_error() {
    let err = ShellInvocation::new("exit 3")
        .with_shell(sh())
        .quiet()
        .run()
        .await
        .unwrap_err();

    match err {
        ShellError::NonZeroExit { code, .. } => assert_eq!(code, 3),
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_allow_failure_keeps_exit_code() {
    let output = ShellInvocation::new("exit 3")
        .with_shell(sh())
        .quiet()
        .allow_failure(true)
        .run()
        .await
        .unwrap();

    assert_eq!(output.exit_code(), 3);
    assert!(!output.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_env_reaches_command() {
    let output = ShellInvocation::new("echo $DRUN_TEST_VAR")
        .with_shell(sh())
        .env(BTreeMap::from([(
            "DRUN_TEST_VAR".to_string(),
            "wired".to_string(),
        )]))
        .capture()
        .run()
        .await
        .unwrap();

    assert_eq!(output.stdout().trim(), "wired");
}

#[cfg(unix)]
#[tokio::test]
async fn test_cancellation_interrupts_sleep() {
    let token = CancellationToken::new();
    let killer = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        killer.cancel();
    });

    let started = std::time::Instant::now();
    let output = ShellInvocation::new("sleep 30")
        .with_shell(sh())
        .quiet()
        .run_with_cancellation(token)
        .await
        .unwrap();

    assert!(output.is_interrupted());
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

/// Plain /bin/sh: avoids -l -i so tests don't source user rc files.
#[cfg(unix)]
fn sh() -> ResolvedShell {
    ResolvedShell::for_host(Some(&BTreeMap::from([(
        std::env::consts::OS.to_string(),
        ShellConfig {
            executable: "/bin/sh".to_string(),
            args: vec!["-c".to_string()],
            environment: BTreeMap::new(),
        },
    )])))
}
