// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! List command implementation.

use crate::cli::ListArgs;
use crate::cli::global::GlobalOptions;
use crate::engine::registry::TaskRegistry;
use crate::error::Result;
use crate::net::Fetcher;
use crate::program;

/// Main handler for the list command.
///
/// # Errors
///
/// Returns an error if the program cannot be loaded or a task name is
/// registered twice.
pub async fn run_list_command(args: &ListArgs, global: &GlobalOptions) -> Result<()> {
    let path = global.program_file();
    let parsed = program::load_file(&path)?;

    let program_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| std::path::PathBuf::from("."), std::path::Path::to_path_buf);
    let (assembled, _included) =
        program::assemble(parsed, &program_dir, &Fetcher::new()).await?;

    let mut registry = TaskRegistry::new();
    for task in &assembled.tasks {
        registry.register(task.clone())?;
    }

    if registry.is_empty() {
        println!("No tasks found");
        return Ok(());
    }

    for task in registry.list() {
        if args.descriptions && !task.description.is_empty() {
            println!("{}  -  {}", task.name, task.description);
        } else {
            println!("{}", task.name);
        }
    }
    Ok(())
}
