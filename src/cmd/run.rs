// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Run command: load, assemble, execute.
//!
//! ```text
//! 📂 Loading file --> 🔍 Parsing --> assemble includes --> Engine
//! Ctrl-C cancels in-flight shell commands via the engine token.
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::warn;

use crate::cli::RunArgs;
use crate::cli::global::GlobalOptions;
use crate::engine::{Engine, EngineOptions};
use crate::error::Result;
use crate::net::Fetcher;
use crate::program;
use crate::secrets::SecretsManager;

/// Main handler for the run command.
///
/// # Errors
///
/// Returns an error for unreadable programs, failed includes, and any
/// engine error; the caller maps all of them to exit code 1.
pub async fn run_run_command(args: &RunArgs, global: &GlobalOptions) -> Result<()> {
    let path = global.program_file();

    if global.verbose {
        println!("📂 Loading {}", path.display());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read program file {}", path.display()))?;

    if global.verbose {
        println!("🔍 Parsing {}", path.display());
    }
    let parsed = program::load_str(&raw)?;

    let program_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| std::path::PathBuf::from("."), std::path::Path::to_path_buf);
    let fetcher = Fetcher::new().with_progress(!global.quiet);
    let (assembled, included_settings) = program::assemble(parsed, &program_dir, &fetcher).await?;

    let params = parse_params(&args.params)?;

    let secrets = match SecretsManager::with_default_backend() {
        Ok(manager) => Some(Arc::new(manager)),
        Err(e) => {
            warn!(error = %e, "secrets backend unavailable, secret() limited to defaults");
            None
        }
    };

    let engine = Engine::new(EngineOptions {
        dry_run: global.dry_run,
        verbose: global.verbose,
        allow_undefined: global.allow_undefined,
        max_workers: global.max_workers.max(1),
    })
    .with_secrets(secrets);

    // Ctrl-C cancels in-flight work cooperatively.
    let token = engine.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    engine
        .execute(
            &assembled,
            included_settings,
            &args.task,
            &params,
            &path.display().to_string(),
        )
        .await?;
    Ok(())
}

/// Splits repeated `-p name=value` bindings into a map.
fn parse_params(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for binding in raw {
        let (name, value) = binding
            .split_once('=')
            .with_context(|| format!("parameter '{binding}' is not name=value"))?;
        params.insert(name.trim().to_string(), value.to_string());
    }
    Ok(params)
}
