// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Script-facing output sink.
//!
//! ```text
//! Output (Arc<Mutex<Sink>>)
//!   Console --> stdout / stderr
//!   Buffer  --> Vec<Line>   (parallel workers, tests)
//!
//! One writer at a time; parallel loop workers get a Buffer
//! and the parent flushes it on worker completion.
//! ```

use std::sync::{Arc, Mutex};

/// A captured output line and the stream it belongs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub stderr: bool,
}

enum Sink {
    Console,
    Buffer(Vec<Line>),
}

/// Serialized sink for script-facing lines (glyph actions, dry-run notes,
/// verbose summaries).
#[derive(Clone)]
pub struct Output {
    inner: Arc<Mutex<Sink>>,
    buffered: bool,
}

impl Output {
    /// Sink writing to the process stdout/stderr.
    #[must_use]
    pub fn console() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Sink::Console)),
            buffered: false,
        }
    }

    /// Sink collecting lines in memory.
    #[must_use]
    pub fn buffer() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Sink::Buffer(Vec::new()))),
            buffered: true,
        }
    }

    /// Whether this sink buffers instead of printing.
    #[must_use]
    pub const fn is_buffer(&self) -> bool {
        self.buffered
    }

    /// Writes one stdout line.
    pub fn line(&self, text: impl Into<String>) {
        self.write(Line {
            text: text.into(),
            stderr: false,
        });
    }

    /// Writes one stderr line.
    pub fn error_line(&self, text: impl Into<String>) {
        self.write(Line {
            text: text.into(),
            stderr: true,
        });
    }

    fn write(&self, line: Line) {
        let mut sink = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match &mut *sink {
            Sink::Console => {
                if line.stderr {
                    eprintln!("{}", line.text);
                } else {
                    println!("{}", line.text);
                }
            }
            Sink::Buffer(lines) => lines.push(line),
        }
    }

    /// Drains a buffered sink's lines. Empty for console sinks.
    #[must_use]
    pub fn drain(&self) -> Vec<Line> {
        let mut sink = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match &mut *sink {
            Sink::Console => Vec::new(),
            Sink::Buffer(lines) => std::mem::take(lines),
        }
    }

    /// Replays lines (from a worker buffer) into this sink as one block.
    pub fn flush_lines(&self, lines: Vec<Line>) {
        for line in lines {
            self.write(line);
        }
    }

    /// All captured texts, for assertions in tests.
    #[must_use]
    pub fn captured_texts(&self) -> Vec<String> {
        let sink = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match &*sink {
            Sink::Console => Vec::new(),
            Sink::Buffer(lines) => lines.iter().map(|l| l.text.clone()).collect(),
        }
    }
}
