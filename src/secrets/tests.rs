// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::*;
use crate::error::SecretError;

fn temp_manager() -> (SecretsManager, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = FileBackend::at_path(
        dir.path().join("secrets.json"),
        "test-home:test-host:drun-secrets".to_string(),
    );
    (SecretsManager::new(Box::new(backend)), dir)
}

#[test]
fn test_round_trip_set_get() {
    let (manager, _dir) = temp_manager();

    manager.set("proj", "pw", "s3cret!").unwrap();
    assert_eq!(manager.get("proj", "pw").unwrap(), "s3cret!");
}

#[test]
fn test_round_trip_survives_other_key_churn() {
    let (manager, _dir) = temp_manager();

    manager.set("proj", "keep", "stable").unwrap();
    manager.set("proj", "a", "1").unwrap();
    manager.set("proj", "b", "2").unwrap();
    manager.delete("proj", "a").unwrap();
    manager.set("proj", "b", "3").unwrap();
    manager.delete("proj", "b").unwrap();

    assert_eq!(manager.get("proj", "keep").unwrap(), "stable");
}

#[test]
fn test_get_missing_is_not_found() {
    let (manager, _dir) = temp_manager();

    let err = manager.get("proj", "nothing").unwrap_err();
    assert!(matches!(err, SecretError::NotFound { .. }));
}

#[test]
fn test_namespaces_are_isolated() {
    let (manager, _dir) = temp_manager();

    manager.set("alpha", "token", "aaa").unwrap();
    manager.set("beta", "token", "bbb").unwrap();

    assert_eq!(manager.get("alpha", "token").unwrap(), "aaa");
    assert_eq!(manager.get("beta", "token").unwrap(), "bbb");

    manager.delete("alpha", "token").unwrap();
    assert!(!manager.exists("alpha", "token").unwrap());
    assert_eq!(manager.get("beta", "token").unwrap(), "bbb");
}

#[test]
fn test_invalid_names_rejected_before_storage() {
    let (manager, _dir) = temp_manager();

    assert!(matches!(
        manager.set("1bad", "key", "v"),
        Err(SecretError::InvalidNamespace(_))
    ));
    assert!(matches!(
        manager.set("ns", "bad key", "v"),
        Err(SecretError::InvalidKey(_))
    ));
    assert!(matches!(
        manager.get("ns", ""),
        Err(SecretError::InvalidKey(_))
    ));
    // Colon would break the composite key format.
    assert!(matches!(
        manager.set("ns", "a:b", "v"),
        Err(SecretError::InvalidKey(_))
    ));
}

#[test]
fn test_list_and_list_namespaces() {
    let (manager, _dir) = temp_manager();

    manager.set("proj", "b", "2").unwrap();
    manager.set("proj", "a", "1").unwrap();
    manager.set("other", "x", "9").unwrap();

    assert_eq!(manager.list("proj").unwrap(), vec!["a", "b"]);
    assert_eq!(manager.list_namespaces().unwrap(), vec!["other", "proj"]);
    assert!(manager.list("empty").unwrap().is_empty());
}

#[test]
fn test_delete_missing_is_ok_false() {
    let (manager, _dir) = temp_manager();
    assert!(!manager.delete("proj", "ghost").unwrap());
}

#[test]
fn test_encrypt_decrypt_round_trip_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("secrets.json");
    let seed = "h:n:drun-secrets".to_string();

    {
        let backend = FileBackend::at_path(path.clone(), seed.clone());
        backend.set("ns:key", "payload \u{1F512} bytes").unwrap();
    }

    // Fresh backend instance re-reads and decrypts from disk.
    let backend = FileBackend::at_path(path.clone(), seed);
    assert_eq!(
        backend.get("ns:key").unwrap().as_deref(),
        Some("payload \u{1F512} bytes")
    );

    // The on-disk form is an envelope, not plaintext.
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("salt"));
    assert!(raw.contains("nonce"));
    assert!(raw.contains("cipher"));
    assert!(!raw.contains("payload"));
}

#[test]
fn test_wrong_seed_fails_closed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("secrets.json");

    let backend = FileBackend::at_path(path.clone(), "seed-one".to_string());
    backend.set("ns:key", "value").unwrap();

    let other = FileBackend::at_path(path, "seed-two".to_string());
    assert!(matches!(
        other.get("ns:key"),
        Err(SecretError::Corrupt(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_store_file_mode_is_0600() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("secrets.json");
    let backend = FileBackend::at_path(path.clone(), "seed".to_string());
    backend.set("ns:key", "value").unwrap();

    let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(file_mode, 0o600);

    let dir_mode = std::fs::metadata(path.parent().unwrap())
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(dir_mode, 0o700);
}
