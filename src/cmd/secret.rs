// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Secret command: CLI surface over the secrets manager.
//!
//! Values are printed only by `get`; every other subcommand reports key
//! names alone.

use crate::cli::{SecretArgs, SecretCommand};
use crate::error::Result;
use crate::secrets::SecretsManager;

/// Main handler for the secret command.
///
/// # Errors
///
/// Returns an error for invalid names or backend failures.
pub fn run_secret_command(args: &SecretArgs) -> Result<()> {
    let manager = SecretsManager::with_default_backend()?;

    match &args.command {
        SecretCommand::Set {
            key,
            value,
            namespace,
        } => {
            manager.set(namespace, key, value)?;
            println!("stored {namespace}:{key}");
        }
        SecretCommand::Get { key, namespace } => {
            println!("{}", manager.get(namespace, key)?);
        }
        SecretCommand::Delete { key, namespace } => {
            if manager.delete(namespace, key)? {
                println!("deleted {namespace}:{key}");
            } else {
                println!("{namespace}:{key} was not set");
            }
        }
        SecretCommand::List { namespace } => {
            let keys = manager.list(namespace)?;
            if keys.is_empty() {
                println!("no secrets under '{namespace}'");
            } else {
                for key in keys {
                    println!("{key}");
                }
            }
        }
        SecretCommand::Namespaces => {
            let namespaces = manager.list_namespaces()?;
            if namespaces.is_empty() {
                println!("no namespaces");
            } else {
                for namespace in namespaces {
                    println!("{namespace}");
                }
            }
        }
    }
    Ok(())
}
