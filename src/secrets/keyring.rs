// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Native credential store backend.
//!
//! ```text
//! keyring::Entry(service = "drun", account = composite)
//!   one entry per secret
//!   "__drun_index__" entry: JSON list of composite keys
//!   (platform stores cannot enumerate, so the index entry
//!    is maintained on every set/delete)
//! ```

use keyring::Entry;

use crate::error::SecretError;

use super::SecretBackend;

/// Keyring service name shared by all entries.
const SERVICE: &str = "drun";

/// Account name of the index entry.
const INDEX_ACCOUNT: &str = "__drun_index__";

/// Native credential store backend using the `keyring` crate.
#[derive(Default)]
pub struct KeyringBackend;

impl KeyringBackend {
    /// Creates the backend. No I/O happens until the first operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn entry(account: &str) -> Result<Entry, SecretError> {
        Entry::new(SERVICE, account)
            .map_err(|e| SecretError::BackendUnavailable(e.to_string()))
    }

    fn read_index() -> Result<Vec<String>, SecretError> {
        match Self::entry(INDEX_ACCOUNT)?.get_password() {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| SecretError::Corrupt(format!("bad index entry: {e}"))),
            Err(keyring::Error::NoEntry) => Ok(Vec::new()),
            Err(e) => Err(SecretError::BackendUnavailable(e.to_string())),
        }
    }

    fn write_index(keys: &[String]) -> Result<(), SecretError> {
        let raw = serde_json::to_string(keys)
            .map_err(|e| SecretError::Corrupt(e.to_string()))?;
        Self::entry(INDEX_ACCOUNT)?
            .set_password(&raw)
            .map_err(|e| SecretError::BackendUnavailable(e.to_string()))
    }
}

impl SecretBackend for KeyringBackend {
    fn get(&self, composite: &str) -> Result<Option<String>, SecretError> {
        match Self::entry(composite)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecretError::BackendUnavailable(e.to_string())),
        }
    }

    fn set(&self, composite: &str, value: &str) -> Result<(), SecretError> {
        Self::entry(composite)?
            .set_password(value)
            .map_err(|e| SecretError::BackendUnavailable(e.to_string()))?;

        let mut index = Self::read_index()?;
        if !index.iter().any(|k| k == composite) {
            index.push(composite.to_string());
            Self::write_index(&index)?;
        }
        Ok(())
    }

    fn delete(&self, composite: &str) -> Result<bool, SecretError> {
        let existed = match Self::entry(composite)?.delete_credential() {
            Ok(()) => true,
            Err(keyring::Error::NoEntry) => false,
            Err(e) => return Err(SecretError::BackendUnavailable(e.to_string())),
        };

        if existed {
            let mut index = Self::read_index()?;
            index.retain(|k| k != composite);
            Self::write_index(&index)?;
        }
        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<String>, SecretError> {
        Self::read_index()
    }
}
