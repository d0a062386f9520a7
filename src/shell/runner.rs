// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process spawning, stream handling, and cancellation.
//!
//! ```text
//! run() / run_with_cancellation(token)
//!              |
//!              v
//!     build_command()
//!     shell exe + args + command, cwd, env, stdio
//!              |
//!              v
//!          spawn()
//!     reader tasks per stream --> mpsc line buffer
//!              |
//!     wait  /  token.cancelled() --> kill
//!              |
//!              v
//!   ShellOutput { exit_code, stdout, stderr, interrupted }
//! ```

use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::ShellError;

use super::{ShellInvocation, ShellOutput, StreamFlags};

impl ShellInvocation {
    /// Spawns the shell and waits for completion.
    ///
    /// # Errors
    ///
    /// Returns a [`ShellError`] if spawning fails or the command exits
    /// non-zero (unless failure is allowed).
    pub async fn run(self) -> Result<ShellOutput, ShellError> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Spawns the shell with cancellation support. When the token fires,
    /// the child is killed and the output is marked interrupted.
    ///
    /// # Errors
    ///
    /// Returns a [`ShellError`] if spawning fails or the command exits
    /// non-zero (unless failure is allowed or the run was interrupted).
    pub async fn run_with_cancellation(
        self,
        token: CancellationToken,
    ) -> Result<ShellOutput, ShellError> {
        let name = self.display_name();
        let command_line = self.command_str().to_string();

        if token.is_cancelled() {
            return Ok(ShellOutput::new(-1, String::new(), String::new(), true));
        }

        if let Some(cwd) = self.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %command_line, "exec");

        let mut command = self.build_command();
        let mut child = command.spawn().map_err(|source| ShellError::SpawnFailed {
            command: command_line.clone(),
            source,
        })?;

        trace!(process = %name, pid = ?child.id(), "spawned");

        let (stdout_tx, mut stdout_rx) = mpsc::channel::<String>(100);
        let (stderr_tx, mut stderr_rx) = mpsc::channel::<String>(100);

        let stdout_handle =
            spawn_reader(child.stdout.take(), self.stdout_flags(), &name, "stdout", stdout_tx);
        let stderr_handle =
            spawn_reader(child.stderr.take(), self.stderr_flags(), &name, "stderr", stderr_tx);

        let (exit_code, interrupted) = wait_or_cancel(&mut child, &token, &command_line).await?;

        await_readers(stdout_handle, stderr_handle).await;

        let stdout = collect_lines(&mut stdout_rx, self.stdout_flags());
        let stderr = collect_lines(&mut stderr_rx, self.stderr_flags());

        let output = ShellOutput::new(exit_code, stdout, stderr, interrupted);

        if !output.is_interrupted() && !self.failure_allowed() && !output.success() {
            return Err(ShellError::NonZeroExit {
                command: command_line,
                code: output.exit_code(),
            });
        }

        trace!(
            process = %name,
            exit_code = output.exit_code(),
            interrupted = output.is_interrupted(),
            "completed"
        );
        Ok(output)
    }

    /// Builds the tokio Command: shell executable, shell args, then the
    /// command string as the final argument.
    fn build_command(&self) -> Command {
        let shell = self.shell_ref();
        let mut command = Command::new(shell.executable());
        command.args(shell.args());
        command.arg(self.command_str());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }

        // Shell-level environment first, then per-invocation overrides.
        for (key, value) in shell.environment() {
            command.env(key, value);
        }
        for (key, value) in self.extra_env() {
            command.env(key, value);
        }

        command.stdin(Stdio::null());
        command.stdout(stdio_from_flags(self.stdout_flags()));
        command.stderr(stdio_from_flags(self.stderr_flags()));

        // Kill on drop for safety
        command.kill_on_drop(true);

        command
    }
}

/// Converts `StreamFlags` to a Stdio configuration.
fn stdio_from_flags(flags: StreamFlags) -> Stdio {
    if flags.contains(StreamFlags::INHERIT) {
        Stdio::inherit()
    } else if flags.contains(StreamFlags::BIT_BUCKET) {
        Stdio::null()
    } else {
        Stdio::piped()
    }
}

/// Spawns a reader task for one stream if its flags want the data.
fn spawn_reader<R>(
    stream: Option<R>,
    flags: StreamFlags,
    name: &str,
    label: &'static str,
    tx: mpsc::Sender<String>,
) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    if !flags.intersects(StreamFlags::FORWARD_TO_LOG | StreamFlags::KEEP_IN_STRING) {
        return None;
    }
    let name = name.to_string();
    stream.map(|stream| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if flags.contains(StreamFlags::FORWARD_TO_LOG) {
                    debug!(process = %name, stream = label, "{line}");
                }
                if flags.contains(StreamFlags::KEEP_IN_STRING) && tx.send(line).await.is_err() {
                    break;
                }
            }
        })
    })
}

/// Waits for the child, or kills it when the token fires.
async fn wait_or_cancel(
    child: &mut Child,
    token: &CancellationToken,
    command_line: &str,
) -> Result<(i32, bool), ShellError> {
    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| ShellError::OutputError {
                command: command_line.to_string(),
                message: e.to_string(),
            })?;
            Ok((status.code().unwrap_or(-1), false))
        }
        () = token.cancelled() => {
            debug!(cmd = %command_line, "killing on cancellation");
            child.kill().await.ok();
            Ok((-1, true))
        }
    }
}

/// Waits for reader tasks to finish draining.
async fn await_readers(
    stdout_handle: Option<JoinHandle<()>>,
    stderr_handle: Option<JoinHandle<()>>,
) {
    if let Some(handle) = stdout_handle {
        let _ = handle.await;
    }
    if let Some(handle) = stderr_handle {
        let _ = handle.await;
    }
}

/// Collects buffered lines into a string when capture is requested.
fn collect_lines(rx: &mut mpsc::Receiver<String>, flags: StreamFlags) -> String {
    if !flags.contains(StreamFlags::KEEP_IN_STRING) {
        return String::new();
    }
    let mut output = String::new();
    while let Ok(line) = rx.try_recv() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&line);
    }
    output
}
