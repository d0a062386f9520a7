// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!              DrunError (~16 bytes)
//!                     |
//!   +----+----+----+--+--+----+----+----+
//!   |    |    |    |     |    |    |    |
//!   v    v    v    v     v    v    v    v
//! Bail Param Interp Resolver Shell File Http ...
//!       Box   Box    Box     Box  Box  Box
//!
//! Sub-errors (unboxed internally):
//!   Param    MissingRequired, InvalidType, NotInEnum, OutOfRange, ...
//!   Interp   undefined variables (strict mode)
//!   Resolver Circular, Missing, NotFound, Ambiguous, AlreadyExists
//!   Shell    SpawnFailed, NonZeroExit, Interrupted
//!   File     NotFound, PermissionDenied, Io
//!   Http     Status, TooLarge, Request
//!   Docker   CommandFailed / Git  CommandFailed, Gix
//!   Secret   InvalidKey, InvalidNamespace, NotFound, BackendUnavailable
//!   Fetch    UnsupportedProtocol, PlainHttpRejected, RateLimited, ...
//!   Thrown   user-raised name + message
//!
//! Script `try/catch` recovers only operational kinds; `catch_name()`
//! returns the name a catch clause matches against (None = not catchable).
//! ```

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`DrunError`].
pub type DrunResult<T> = std::result::Result<T, DrunError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum small on the stack.
#[derive(Debug, Error)]
pub enum DrunError {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// Parameter validation failed before the task body ran.
    #[error("{0}")]
    Param(Box<ParamError>),

    /// Interpolation failed (strict-mode undefined variables).
    #[error("{0}")]
    Interp(Box<InterpError>),

    /// Task registration or dependency resolution failed.
    #[error("{0}")]
    Resolver(Box<ResolverError>),

    /// Shell command failed.
    #[error("shell error: {0}")]
    Shell(Box<ShellError>),

    /// File operation failed.
    #[error("file error: {0}")]
    File(Box<FileOpError>),

    /// HTTP request statement failed.
    #[error("http error: {0}")]
    Http(Box<HttpError>),

    /// Docker operation failed.
    #[error("docker error: {0}")]
    Docker(Box<DockerError>),

    /// Git operation failed.
    #[error("git error: {0}")]
    Git(Box<GitOpError>),

    /// Secrets manager operation failed.
    #[error("secret error: {0}")]
    Secret(Box<SecretError>),

    /// Remote include fetch failed (program assembly time).
    #[error("fetch error: {0}")]
    Fetch(Box<FetchError>),

    /// User-raised error from a `throw` statement.
    #[error("{0}")]
    Thrown(Box<ThrownError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

impl DrunError {
    /// Returns the name a script-level `catch` clause matches against.
    ///
    /// `None` means the error is not recoverable from the script: parse,
    /// parameter, interpolation, and resolver failures always propagate to
    /// the caller.
    #[must_use]
    pub fn catch_name(&self) -> Option<&str> {
        match self {
            Self::Shell(_) => Some("ShellError"),
            Self::File(_) => Some("FileError"),
            Self::Http(_) => Some("HttpError"),
            Self::Docker(_) => Some("DockerError"),
            Self::Git(_) => Some("GitError"),
            Self::Secret(_) => Some("SecretError"),
            Self::Thrown(t) => Some(&t.name),
            _ => None,
        }
    }

    /// Returns whether a script `try` block may recover this error.
    #[must_use]
    pub fn is_catchable(&self) -> bool {
        self.catch_name().is_some()
    }
}

/// Create a fatal [`DrunError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> DrunError {
    DrunError::Bailed(message.into().into_boxed_str())
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for DrunError {
                fn from(err: $error) -> Self {
                    DrunError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ParamError => Param,
    InterpError => Interp,
    ResolverError => Resolver,
    ShellError => Shell,
    FileOpError => File,
    HttpError => Http,
    DockerError => Docker,
    GitOpError => Git,
    SecretError => Secret,
    FetchError => Fetch,
    ThrownError => Thrown,
    std::io::Error => Io,
}

// --- Parameter Errors ---

/// Parameter validation errors, raised before any statement runs.
#[derive(Debug, Error)]
pub enum ParamError {
    /// A required parameter was not supplied.
    #[error("task '{task}' requires parameter '{parameter}'")]
    MissingRequired { task: String, parameter: String },

    /// The supplied value does not parse as the declared type.
    #[error("parameter '{parameter}' expects {expected}, got '{value}'")]
    InvalidType {
        parameter: String,
        expected: &'static str,
        value: String,
    },

    /// The value is not one of the declared enum alternatives.
    #[error("parameter '{parameter}' must be one of [{allowed}], got '{value}'")]
    NotInEnum {
        parameter: String,
        value: String,
        allowed: String,
    },

    /// The numeric value is outside the declared range.
    #[error("parameter '{parameter}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        parameter: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The value does not match the declared pattern constraint.
    #[error("parameter '{parameter}' does not match pattern '{pattern}': '{value}'")]
    PatternMismatch {
        parameter: String,
        pattern: String,
        value: String,
    },

    /// The caller supplied a binding the task does not declare.
    #[error("task '{task}' has no parameter '{name}'")]
    Unknown { task: String, name: String },

    /// An unrecognized named pattern macro.
    #[error("unknown pattern macro '{0}'")]
    UnknownMacro(String),
}

// --- Interpolation Errors ---

/// Interpolation error carrying the unresolved base identifiers (strict
/// mode only).
#[derive(Debug)]
pub struct InterpError {
    /// Identifiers that could not be resolved, without braces.
    pub names: Vec<String>,
}

impl std::error::Error for InterpError {}

impl std::fmt::Display for InterpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.names.len() == 1 {
            write!(f, "undefined variable: {{{}}}", self.names[0])
        } else {
            let list: Vec<String> = self.names.iter().map(|n| format!("{{{n}}}")).collect();
            write!(f, "undefined variables: {}", list.join(", "))
        }
    }
}

// --- Resolver Errors ---

/// Task registry and dependency resolver errors.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The dependency graph contains a cycle.
    #[error("circular dependency detected: {}", path.join(" -> "))]
    Circular { path: Vec<String> },

    /// A dependency names a task that is not registered.
    #[error("task '{task}' depends on unknown task '{dependency}'")]
    Missing { task: String, dependency: String },

    /// The requested task is not registered.
    #[error("task '{0}' not found")]
    NotFound(String),

    /// A namespace-elided name matches more than one task.
    #[error("task name '{name}' is ambiguous: matches {}", candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    /// A task with the same fully-qualified name is already registered.
    #[error("task '{0}' is already defined")]
    AlreadyExists(String),
}

// --- Shell Errors ---

/// Shell command execution errors.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Failed to spawn the shell process.
    #[error("failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exited with a non-zero status.
    #[error("command '{command}' exited with code {code}")]
    NonZeroExit { command: String, code: i32 },

    /// The command was cancelled mid-flight.
    #[error("command '{command}' was interrupted")]
    Interrupted { command: String },

    /// Failed to read command output.
    #[error("failed to read output of '{command}': {message}")]
    OutputError { command: String, message: String },
}

// --- File Operation Errors ---

/// File statement errors.
#[derive(Debug, Error)]
pub enum FileOpError {
    /// Path not found.
    #[error("path not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// General I/O error on a path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The operation received an unusable path.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl FileOpError {
    /// Classifies an I/O error on a path into the matching variant.
    pub fn from_io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

// --- HTTP Errors ---

/// HTTP statement errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be sent.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("http {status} from {url}")]
    Status { status: u16, url: String },

    /// The response exceeded the size cap.
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    /// A header name or value could not be constructed.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

// --- Docker Errors ---

/// Docker statement errors.
#[derive(Debug, Error)]
pub enum DockerError {
    /// The docker CLI invocation failed.
    #[error("docker {verb} failed: {message}")]
    CommandFailed { verb: String, message: String },

    /// The statement carries a verb the executor does not know.
    #[error("unknown docker verb '{0}'")]
    UnknownVerb(String),
}

// --- Git Errors ---

/// Wrapper for gix-specific errors.
///
/// gix has multiple error types that are converted through this enum.
/// Large error types are boxed to keep enum size manageable.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to get HEAD reference.
    #[error("failed to get head reference: {0}")]
    Head(#[from] gix::reference::find::existing::Error),

    /// HEAD does not point at a commit yet (empty repository).
    #[error("repository has no commits")]
    Unborn,
}

/// Git statement and probe errors.
#[derive(Debug, Error)]
pub enum GitOpError {
    /// The path is not inside a git repository.
    #[error("not a git repository: {path}")]
    NotARepository { path: String },

    /// The git CLI invocation failed.
    #[error("git {verb} failed: {message}")]
    CommandFailed { verb: String, message: String },

    /// The statement carries a verb the executor does not know.
    #[error("unknown git verb '{0}'")]
    UnknownVerb(String),

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),
}

// --- Secret Errors ---

/// Secrets manager errors.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The key does not match `^[A-Za-z][A-Za-z0-9_-]*$`.
    #[error("invalid secret key: '{0}'")]
    InvalidKey(String),

    /// The namespace does not match `^[A-Za-z][A-Za-z0-9_-]*$`.
    #[error("invalid secret namespace: '{0}'")]
    InvalidNamespace(String),

    /// No value stored under the composite key.
    #[error("secret '{namespace}:{key}' not found")]
    NotFound { namespace: String, key: String },

    /// The platform backend could not be reached.
    #[error("secret backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The encrypted store could not be decoded or decrypted.
    #[error("secret store corrupt: {0}")]
    Corrupt(String),

    /// I/O error on the fallback store file.
    #[error("secret store io error: {0}")]
    Io(#[from] std::io::Error),
}

// --- Fetch Errors ---

/// Remote include fetcher errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL does not use a supported protocol.
    #[error("unsupported include protocol: {0}")]
    UnsupportedProtocol(String),

    /// Plain HTTP is rejected.
    #[error("plain http is not allowed: {0}")]
    PlainHttpRejected(String),

    /// The include path points into a denied hub folder.
    #[error("hub folder not allowed: {0}")]
    DeniedFolder(String),

    /// Non-success HTTP status.
    #[error("fetch of {url} returned http {status}")]
    Status { status: u16, url: String },

    /// The download exceeded the size cap.
    #[error("download of {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    /// The host's rate limit was hit; body reported verbatim.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Default branch could not be determined for a repository.
    #[error("could not determine default branch for {repo}")]
    DefaultBranch { repo: String },

    /// Error from reqwest library.
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

// --- Thrown Errors ---

/// User-raised error from a script `throw` statement.
#[derive(Debug, Error)]
#[error("{name}: {message}")]
pub struct ThrownError {
    /// Error name a `catch` clause matches against.
    pub name: String,
    /// Interpolated message.
    pub message: String,
}

#[cfg(test)]
mod tests;
