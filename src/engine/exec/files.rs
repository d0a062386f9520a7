// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! File statements.
//!
//! ```text
//! create/read/write/append/copy/move/delete  of file|dir
//! exists / is_empty probes --> "true"/"false" into capture_as
//!
//! paths: interpolated, then ~ expanded
//! is_empty: entries starting with '.' are treated as absent
//! dry run: logged, probes get synthetic captures
//! ```

use std::path::{Path, PathBuf};

use crate::ast::{FileOp, FileTarget};
use crate::engine::context::ExecutionContext;
use crate::error::{DrunResult, FileOpError};

use super::Executor;

impl Executor {
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn exec_file(
        &self,
        op: FileOp,
        target: FileTarget,
        path: &str,
        dest: Option<&str>,
        content: Option<&str>,
        capture_as: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> DrunResult<()> {
        let path = expand_path(&self.interp().interpolate(path, ctx)?);
        let dest = match dest {
            Some(d) => Some(expand_path(&self.interp().interpolate(d, ctx)?)),
            None => None,
        };
        let content = match content {
            Some(c) => Some(self.interp().interpolate(c, ctx)?),
            None => None,
        };

        if ctx.is_dry_run() {
            ctx.output().line(format!(
                "[DRY RUN] Would {} {} {}",
                op_verb(op),
                target_noun(target),
                path.display()
            ));
            if let Some(name) = capture_as {
                let placeholder = format!("[dry-run:{}]", name.trim_start_matches('$'));
                ctx.set_variable(name.to_string(), placeholder);
            }
            return Ok(());
        }

        match op {
            FileOp::Create => match target {
                FileTarget::Dir => {
                    tokio::fs::create_dir_all(&path)
                        .await
                        .map_err(|e| FileOpError::from_io(path.display().to_string(), e))?;
                }
                FileTarget::File => {
                    ensure_parent(&path).await?;
                    tokio::fs::write(&path, content.unwrap_or_default())
                        .await
                        .map_err(|e| FileOpError::from_io(path.display().to_string(), e))?;
                }
            },
            FileOp::Read => {
                let data = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| FileOpError::from_io(path.display().to_string(), e))?;
                if let Some(name) = capture_as {
                    ctx.set_variable(name.to_string(), data);
                }
            }
            FileOp::Write => {
                ensure_parent(&path).await?;
                tokio::fs::write(&path, content.unwrap_or_default())
                    .await
                    .map_err(|e| FileOpError::from_io(path.display().to_string(), e))?;
            }
            FileOp::Append => {
                ensure_parent(&path).await?;
                let mut existing = tokio::fs::read_to_string(&path).await.unwrap_or_default();
                existing.push_str(&content.unwrap_or_default());
                tokio::fs::write(&path, existing)
                    .await
                    .map_err(|e| FileOpError::from_io(path.display().to_string(), e))?;
            }
            FileOp::Copy => {
                let dest = dest
                    .ok_or_else(|| FileOpError::InvalidPath("copy needs a destination".into()))?;
                ensure_parent(&dest).await?;
                match target {
                    FileTarget::File => {
                        tokio::fs::copy(&path, &dest)
                            .await
                            .map_err(|e| FileOpError::from_io(path.display().to_string(), e))?;
                    }
                    FileTarget::Dir => {
                        let (from, to) = (path.clone(), dest.clone());
                        tokio::task::spawn_blocking(move || copy_dir_recursive(&from, &to))
                            .await
                            .map_err(|e| FileOpError::InvalidPath(e.to_string()))??;
                    }
                }
            }
            FileOp::Move => {
                let dest = dest
                    .ok_or_else(|| FileOpError::InvalidPath("move needs a destination".into()))?;
                ensure_parent(&dest).await?;
                tokio::fs::rename(&path, &dest)
                    .await
                    .map_err(|e| FileOpError::from_io(path.display().to_string(), e))?;
            }
            FileOp::Delete => {
                let result = match target {
                    FileTarget::File => tokio::fs::remove_file(&path).await,
                    FileTarget::Dir => tokio::fs::remove_dir_all(&path).await,
                };
                match result {
                    Ok(()) => {}
                    // Deleting something already gone is a no-op.
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(FileOpError::from_io(path.display().to_string(), e).into());
                    }
                }
            }
            FileOp::Exists => {
                let exists = match target {
                    FileTarget::File => path.is_file(),
                    FileTarget::Dir => path.is_dir(),
                };
                self.store_probe(capture_as, exists, ctx);
            }
            FileOp::IsEmpty => {
                let empty = dir_is_empty(&path)
                    .map_err(|e| FileOpError::from_io(path.display().to_string(), e))?;
                self.store_probe(capture_as, empty, ctx);
            }
        }

        Ok(())
    }

    fn store_probe(&self, capture_as: Option<&str>, value: bool, ctx: &mut ExecutionContext) {
        if let Some(name) = capture_as {
            ctx.set_variable(name.to_string(), value.to_string());
        } else {
            ctx.output().line(value.to_string());
        }
    }
}

/// Expands a leading `~/` to the home directory.
fn expand_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

async fn ensure_parent(path: &Path) -> Result<(), FileOpError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FileOpError::from_io(parent.display().to_string(), e))?;
    }
    Ok(())
}

/// Dot-entries are treated as absent: a directory holding only dotfiles
/// counts as empty.
fn dir_is_empty(path: &Path) -> std::io::Result<bool> {
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            return Ok(false);
        }
    }
    Ok(true)
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<(), FileOpError> {
    std::fs::create_dir_all(to).map_err(|e| FileOpError::from_io(to.display().to_string(), e))?;
    for entry in
        std::fs::read_dir(from).map_err(|e| FileOpError::from_io(from.display().to_string(), e))?
    {
        let entry = entry.map_err(|e| FileOpError::from_io(from.display().to_string(), e))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copy_dir_recursive(&source, &target)?;
        } else {
            std::fs::copy(&source, &target)
                .map_err(|e| FileOpError::from_io(source.display().to_string(), e))?;
        }
    }
    Ok(())
}

fn op_verb(op: FileOp) -> &'static str {
    match op {
        FileOp::Create => "create",
        FileOp::Read => "read",
        FileOp::Write => "write",
        FileOp::Append => "append to",
        FileOp::Copy => "copy",
        FileOp::Move => "move",
        FileOp::Delete => "delete",
        FileOp::Exists => "probe",
        FileOp::IsEmpty => "probe",
    }
}

fn target_noun(target: FileTarget) -> &'static str {
    match target {
        FileTarget::File => "file",
        FileTarget::Dir => "dir",
    }
}
