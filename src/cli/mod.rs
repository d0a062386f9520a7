// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command-line interface definitions (clap).
//!
//! ```text
//! drun run <TASK> [-p name=value]...   execute a task
//! drun list                            list registered tasks
//! drun secret set|get|delete|list|namespaces
//! drun version
//! ```

pub mod global;

use clap::{Args, Parser, Subcommand};

use global::GlobalOptions;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "drun",
    about = "drun Automation Language Runner",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executes a task from the program file.
    Run(RunArgs),

    /// Lists every task the program declares (includes resolved).
    List(ListArgs),

    /// Manages namespaced secrets.
    Secret(SecretArgs),

    /// Prints the version.
    Version,
}

/// Arguments for `drun run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Task name; namespace may be elided when unambiguous.
    pub task: String,

    /// Parameter binding, repeatable: -p name=value.
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", action = clap::ArgAction::Append)]
    pub params: Vec<String>,
}

/// Arguments for `drun list`.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Also print task descriptions.
    #[arg(long)]
    pub descriptions: bool,
}

/// Arguments for `drun secret`.
#[derive(Debug, Clone, Args)]
pub struct SecretArgs {
    #[command(subcommand)]
    pub command: SecretCommand,
}

/// Secret subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum SecretCommand {
    /// Stores a secret.
    Set {
        key: String,
        value: String,
        #[arg(short = 'n', long = "namespace", default_value = "default")]
        namespace: String,
    },
    /// Prints a secret value.
    Get {
        key: String,
        #[arg(short = 'n', long = "namespace", default_value = "default")]
        namespace: String,
    },
    /// Deletes a secret.
    Delete {
        key: String,
        #[arg(short = 'n', long = "namespace", default_value = "default")]
        namespace: String,
    },
    /// Lists the keys of a namespace.
    List {
        #[arg(short = 'n', long = "namespace", default_value = "default")]
        namespace: String,
    },
    /// Lists every namespace.
    Namespaces,
}

/// Parses the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
