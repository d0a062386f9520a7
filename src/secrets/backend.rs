// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Secret backend abstraction.
//!
//! ```text
//! SecretBackend (K/V over composite "ns:key" strings)
//!   get / set / delete / keys
//! ```

use crate::error::SecretError;

/// Storage provider for the secrets manager.
///
/// Backends operate on composite `ns:key` strings; name validation happens
/// in the manager before any backend call.
pub trait SecretBackend: Send + Sync {
    /// Reads a value, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] when the store cannot be reached or
    /// decoded.
    fn get(&self, composite: &str) -> Result<Option<String>, SecretError>;

    /// Stores a value, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] when the store cannot be written.
    fn set(&self, composite: &str, value: &str) -> Result<(), SecretError>;

    /// Removes a value, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] when the store cannot be written.
    fn delete(&self, composite: &str) -> Result<bool, SecretError>;

    /// Returns every stored composite key.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretError`] when the store cannot be read.
    fn keys(&self) -> Result<Vec<String>, SecretError>;
}
