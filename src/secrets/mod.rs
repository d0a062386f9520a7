// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Namespaced secrets storage.
//!
//! ```text
//! SecretsManager
//!   validate ns/key  ^[A-Za-z][A-Za-z0-9_-]*$
//!   composite key    "ns:key"
//!        |
//!        v
//!   SecretBackend (trait)
//!    |            |
//!    v            v
//! KeyringBackend  FileBackend
//! (macOS/Windows) PBKDF2-SHA256 + AES-256-GCM
//!                 ~/.drun/secrets.json {salt,nonce,cipher}
//! ```
//!
//! Values are never logged and cleared from memory best-effort.

pub mod backend;
pub mod file;
pub mod keyring;

pub use backend::SecretBackend;
pub use file::FileBackend;
pub use keyring::KeyringBackend;

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::error::SecretError;

/// Validation pattern shared by namespaces and keys.
fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new("^[A-Za-z][A-Za-z0-9_-]*$").unwrap_or_else(|_| unreachable!())
    })
}

/// Namespaced secrets manager delegating to a platform backend.
pub struct SecretsManager {
    backend: Box<dyn SecretBackend>,
}

impl SecretsManager {
    /// Creates a manager over an explicit backend.
    #[must_use]
    pub fn new(backend: Box<dyn SecretBackend>) -> Self {
        Self { backend }
    }

    /// Creates a manager over the platform-default backend: the native
    /// credential store on macOS and Windows, the encrypted file fallback
    /// elsewhere.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] if the fallback store location cannot be
    /// determined.
    pub fn with_default_backend() -> Result<Self, SecretError> {
        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            Ok(Self::new(Box::new(KeyringBackend::new())))
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Ok(Self::new(Box::new(FileBackend::open_default()?)))
        }
    }

    /// Stores a value under `namespace:key`.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] on invalid names or backend failure.
    pub fn set(&self, namespace: &str, key: &str, value: &str) -> Result<(), SecretError> {
        let composite = composite_key(namespace, key)?;
        self.backend.set(&composite, value)
    }

    /// Reads the value stored under `namespace:key`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::NotFound`] when no value is stored, or a
    /// backend error.
    pub fn get(&self, namespace: &str, key: &str) -> Result<String, SecretError> {
        let composite = composite_key(namespace, key)?;
        self.backend
            .get(&composite)?
            .ok_or_else(|| SecretError::NotFound {
                namespace: namespace.to_string(),
                key: key.to_string(),
            })
    }

    /// Deletes `namespace:key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] on invalid names or backend failure.
    pub fn delete(&self, namespace: &str, key: &str) -> Result<bool, SecretError> {
        let composite = composite_key(namespace, key)?;
        self.backend.delete(&composite)
    }

    /// Returns whether `namespace:key` holds a value.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] on invalid names or backend failure.
    pub fn exists(&self, namespace: &str, key: &str) -> Result<bool, SecretError> {
        let composite = composite_key(namespace, key)?;
        Ok(self.backend.get(&composite)?.is_some())
    }

    /// Lists the local keys stored under a namespace, sorted.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] on an invalid namespace or backend
    /// failure.
    pub fn list(&self, namespace: &str) -> Result<Vec<String>, SecretError> {
        validate_namespace(namespace)?;
        let prefix = format!("{namespace}:");
        let mut keys: Vec<String> = self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|composite| composite.strip_prefix(&prefix).map(str::to_string))
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// Lists every namespace with at least one stored key, sorted.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] on backend failure.
    pub fn list_namespaces(&self) -> Result<Vec<String>, SecretError> {
        let namespaces: BTreeSet<String> = self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|composite| {
                composite.split_once(':').map(|(ns, _)| ns.to_string())
            })
            .collect();
        Ok(namespaces.into_iter().collect())
    }
}

/// Validates a namespace name.
pub(crate) fn validate_namespace(namespace: &str) -> Result<(), SecretError> {
    if name_pattern().is_match(namespace) {
        Ok(())
    } else {
        Err(SecretError::InvalidNamespace(namespace.to_string()))
    }
}

/// Validates a local key name.
pub(crate) fn validate_key(key: &str) -> Result<(), SecretError> {
    if name_pattern().is_match(key) {
        Ok(())
    } else {
        Err(SecretError::InvalidKey(key.to_string()))
    }
}

/// Formats a validated composite key.
fn composite_key(namespace: &str, key: &str) -> Result<String, SecretError> {
    validate_namespace(namespace)?;
    validate_key(key)?;
    Ok(format!("{namespace}:{key}"))
}

#[cfg(test)]
mod tests;
