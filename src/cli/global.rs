// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Global CLI options available for all commands.
//!
//! ```text
//! --file FILE        ← parsed program (canonical JSON from the frontend)
//! --dry-run          ← log effects instead of performing them
//! --verbose / -v     ← run summaries and exit codes
//! --quiet / -q       ← errors only
//! --allow-undefined  ← permissive interpolation
//! --max-workers N    ← parallel fan-out bound (default 4)
//! --log-file FILE    ← tracing log file
//! ```

use clap::Args;
use std::path::PathBuf;

/// Global options available for all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalOptions {
    /// Path to the parsed program file (canonical JSON).
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Logs side-effecting statements instead of executing them.
    /// Captures receive synthetic placeholders so interpolation keeps
    /// working downstream.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Emits per-task and per-command summaries.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Only errors reach the console.
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Leaves unresolved placeholders intact instead of failing.
    #[arg(long = "allow-undefined")]
    pub allow_undefined: bool,

    /// Bound on parallel dependency groups and parallel loops.
    #[arg(long = "max-workers", value_name = "N", default_value_t = 4)]
    pub max_workers: usize,

    /// Path to a tracing log file.
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl GlobalOptions {
    /// The program file, defaulting to `drun.json` in the working
    /// directory.
    #[must_use]
    pub fn program_file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| PathBuf::from("drun.json"))
    }
}
