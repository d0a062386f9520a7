// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-task execution context.
//!
//! ```text
//! ExecutionContext (one per task run)
//!   parameters  name --> TypedValue   (validated before the body runs)
//!   variables   name --> String       (set/capture; sigil keys kept as
//!                                      declared)
//!   project     Arc<ProjectContext>
//!   output      sink  |  secrets  |  builtin state
//!   flags       dry_run, verbose, allow_undefined
//!   cancel      CancellationToken  |  workers  Semaphore
//!
//! Loop iterations clone the context; parallel iterations additionally
//! get a buffered output sink. Nothing merges back into the parent.
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::ast::TypedValue;
use crate::engine::builtins::BuiltinState;
use crate::engine::output::Output;
use crate::program::ProjectContext;
use crate::secrets::SecretsManager;

/// Default worker bound for parallel groups and loops.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Runtime context handed to every statement of one task body.
#[derive(Clone)]
pub struct ExecutionContext {
    parameters: BTreeMap<String, TypedValue>,
    variables: BTreeMap<String, String>,
    project: Arc<ProjectContext>,
    current_file: Option<String>,
    current_task: Option<String>,
    output: Output,
    secrets: Option<Arc<SecretsManager>>,
    state: Arc<BuiltinState>,
    dry_run: bool,
    verbose: bool,
    allow_undefined: bool,
    cancel: CancellationToken,
    workers: Arc<Semaphore>,
    max_workers: usize,
}

impl ExecutionContext {
    /// Creates a context for a task run.
    #[must_use]
    pub fn new(project: Arc<ProjectContext>) -> Self {
        Self {
            parameters: BTreeMap::new(),
            variables: BTreeMap::new(),
            project,
            current_file: None,
            current_task: None,
            output: Output::console(),
            secrets: None,
            state: Arc::new(BuiltinState::new()),
            dry_run: false,
            verbose: false,
            allow_undefined: false,
            cancel: CancellationToken::new(),
            workers: Arc::new(Semaphore::new(DEFAULT_MAX_WORKERS)),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// Sets the validated parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: BTreeMap<String, TypedValue>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the current file and task names.
    #[must_use]
    pub fn with_location(
        mut self,
        file: impl Into<Option<String>>,
        task: impl Into<Option<String>>,
    ) -> Self {
        self.current_file = file.into();
        self.current_task = task.into();
        self
    }

    /// Sets the output sink.
    #[must_use]
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// Attaches a secrets manager.
    #[must_use]
    pub fn with_secrets(mut self, secrets: Option<Arc<SecretsManager>>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Shares builtin (progress/timer) state across tasks and workers.
    #[must_use]
    pub fn with_state(mut self, state: Arc<BuiltinState>) -> Self {
        self.state = state;
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets verbose mode.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Permits unresolved placeholders to pass through untouched.
    #[must_use]
    pub const fn with_allow_undefined(mut self, allow: bool) -> Self {
        self.allow_undefined = allow;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Bounds parallel fan-out.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        self.workers = Arc::new(Semaphore::new(max_workers));
        self.max_workers = max_workers;
        self
    }

    // --- accessors ---

    /// The validated parameters.
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, TypedValue> {
        &self.parameters
    }

    /// The mutable variables map.
    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// The project context.
    #[must_use]
    pub const fn project(&self) -> &Arc<ProjectContext> {
        &self.project
    }

    /// The current file, if known.
    #[must_use]
    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    /// The current task, if known.
    #[must_use]
    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    /// The output sink.
    #[must_use]
    pub const fn output(&self) -> &Output {
        &self.output
    }

    /// The secrets manager, when one is attached.
    #[must_use]
    pub const fn secrets(&self) -> Option<&Arc<SecretsManager>> {
        self.secrets.as_ref()
    }

    /// Shared builtin state (progress bars, timers).
    #[must_use]
    pub const fn state(&self) -> &Arc<BuiltinState> {
        &self.state
    }

    /// Whether effects are suppressed.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Whether verbose lines are emitted.
    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Whether unresolved placeholders are tolerated.
    #[must_use]
    pub const fn allows_undefined(&self) -> bool {
        self.allow_undefined
    }

    /// The cancellation token.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The shared worker semaphore.
    #[must_use]
    pub fn workers(&self) -> Arc<Semaphore> {
        Arc::clone(&self.workers)
    }

    /// The configured worker bound.
    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // --- variables ---

    /// Stores a variable under exactly the key used at the declaration
    /// site (sigil included if present).
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Reads a variable, tolerating a sigil mismatch between declaration
    /// and reference.
    #[must_use]
    pub fn get_variable(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.variables.get(name) {
            return Some(value);
        }
        if let Some(stripped) = name.strip_prefix('$') {
            return self.variables.get(stripped).map(String::as_str);
        }
        self.variables
            .get(&format!("${name}"))
            .map(String::as_str)
    }

    /// Rule-1 resolution order: sigil-keyed variables (shell captures),
    /// plain variables, parameters, project built-ins, project settings.
    /// An empty string is a legal hit.
    #[must_use]
    pub fn lookup_simple(&self, name: &str) -> Option<String> {
        let bare = name.strip_prefix('$').unwrap_or(name);

        if let Some(value) = self.variables.get(&format!("${bare}")) {
            return Some(value.clone());
        }
        if let Some(value) = self.variables.get(bare) {
            return Some(value.clone());
        }
        if let Some(value) = self.parameters.get(bare) {
            return Some(value.to_display_string());
        }
        match bare {
            "project" => return Some(self.project.name().to_string()),
            "version" => return Some(self.project.version().to_string()),
            _ => {}
        }
        self.project.setting(bare).map(str::to_string)
    }

    /// `$globals.key` resolution: settings, then included settings, then
    /// the special keys.
    #[must_use]
    pub fn lookup_global(&self, key: &str) -> Option<String> {
        if let Some(value) = self.project.setting(key) {
            return Some(value.to_string());
        }
        if let Some(value) = self.project.included_setting(key) {
            return Some(value.to_string());
        }
        match key {
            "project" => Some(self.project.name().to_string()),
            "version" => Some(self.project.version().to_string()),
            "current_task" => Some(self.current_task.clone().unwrap_or_default()),
            _ => None,
        }
    }

    /// Parameter lookup for `$params.key`. Dotted keys are flat lookups
    /// with the literal dotted name.
    #[must_use]
    pub fn lookup_parameter(&self, key: &str) -> Option<String> {
        self.parameters.get(key).map(TypedValue::to_display_string)
    }

    /// Clones the context for one loop iteration, binding the loop
    /// variable. The clone owns its variable map; writes do not merge
    /// back.
    #[must_use]
    pub fn child_for_iteration(&self, variable: &str, value: &str) -> Self {
        let mut child = self.clone();
        child.set_variable(variable, value);
        child
    }
}
