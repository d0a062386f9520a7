// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Execution engine.
//!
//! ```text
//! Engine::execute(program, included, target, params, file)
//!   register tasks ---> TaskRegistry (C4)
//!   resolve(target) --> DependencyResolver (C5)  cycle/missing check
//!   per task:
//!     validate parameters (caller bindings for the target,
//!                          defaults for dependencies)
//!     ExecutionContext --> Executor (C7)
//!   dependency groups:
//!     singleton --> awaited in order
//!     parallel  --> JoinSet, bounded by max_workers
//! ```

pub mod builtins;
pub mod context;
pub mod exec;
pub mod interp;
pub mod output;
pub mod registry;
pub mod resolver;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ast::{ParamKind, Parameter, Program, TaskDef, TypedValue};
use crate::error::{DrunError, DrunResult, ParamError};
use crate::program::{IncludedSettings, ProjectContext};
use crate::secrets::SecretsManager;

use builtins::BuiltinState;
use context::{DEFAULT_MAX_WORKERS, ExecutionContext};
use exec::Executor;
use output::Output;
use registry::TaskRegistry;
use resolver::DependencyResolver;

/// Engine-wide execution options.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub dry_run: bool,
    pub verbose: bool,
    pub allow_undefined: bool,
    pub max_workers: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            allow_undefined: false,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

/// The execution engine: registry population, dependency resolution, and
/// task-by-task statement execution.
pub struct Engine {
    options: EngineOptions,
    secrets: Option<Arc<SecretsManager>>,
    output: Output,
    cancel: CancellationToken,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    /// Creates an engine with the given options.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            secrets: None,
            output: Output::console(),
            cancel: CancellationToken::new(),
        }
    }

    /// Attaches a secrets manager for the `secret` builtin.
    #[must_use]
    pub fn with_secrets(mut self, secrets: Option<Arc<SecretsManager>>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Replaces the output sink (tests use a buffer).
    #[must_use]
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// The token cancelling all in-flight work.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Executes `target` in `program` with raw caller parameter bindings.
    ///
    /// # Errors
    ///
    /// Registration, resolution, parameter validation, and statement
    /// errors all propagate; the CLI maps any of them to exit code 1.
    pub async fn execute(
        &self,
        program: &Program,
        included_settings: IncludedSettings,
        target: &str,
        params: &BTreeMap<String, String>,
        file: &str,
    ) -> DrunResult<()> {
        let project = ProjectContext::from_program(program, included_settings);

        let mut registry = TaskRegistry::new();
        for task in &program.tasks {
            registry.register(task.clone())?;
        }
        debug!(tasks = registry.len(), target, "registry populated");

        // Full upfront validation: cycles, missing dependencies, and the
        // target's own resolution (including namespace elision).
        let order = DependencyResolver::new(&registry).resolve(target)?;
        let target_name = order
            .last()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| target.to_string());

        let runner = Arc::new(Runner {
            registry,
            project,
            executor: Executor::new(),
            state: Arc::new(BuiltinState::new()),
            secrets: self.secrets.clone(),
            output: self.output.clone(),
            options: self.options.clone(),
            cancel: self.cancel.clone(),
            file: file.to_string(),
            target: target_name.clone(),
            caller_params: params.clone(),
            started: Mutex::new(HashSet::new()),
        });

        runner.run_task(&target_name).await
    }
}

/// Shared state for one `execute` call; cheap Arc clones feed the
/// parallel-group workers.
struct Runner {
    registry: TaskRegistry,
    project: Arc<ProjectContext>,
    executor: Executor,
    state: Arc<BuiltinState>,
    secrets: Option<Arc<SecretsManager>>,
    output: Output,
    options: EngineOptions,
    cancel: CancellationToken,
    file: String,
    target: String,
    caller_params: BTreeMap<String, String>,
    started: Mutex<HashSet<String>>,
}

impl Runner {
    /// Runs one task: dependency groups first, then the body. Tasks
    /// already started by an earlier path are skipped (diamond graphs run
    /// shared dependencies once).
    fn run_task(self: &Arc<Self>, name: &str) -> BoxFuture<'static, DrunResult<()>> {
        let this = Arc::clone(self);
        let name = name.to_string();

        Box::pin(async move {
            let task = this.registry.get(&name)?.clone();

            for group in DependencyResolver::parallel_groups(&task) {
                if this.cancel.is_cancelled() {
                    return Err(crate::error::bail_out(format!(
                        "execution interrupted before '{}'",
                        task.name
                    )));
                }

                if group.len() <= 1 {
                    for dependency in &group {
                        let member = this.registry.get(&dependency.task)?.name.clone();
                        if this.is_fresh(&member) {
                            this.run_task(&member).await?;
                        }
                    }
                    continue;
                }

                // Complete every member's transitive dependencies first,
                // sequentially, so the members' bodies are free to run
                // side by side.
                let mut members = Vec::with_capacity(group.len());
                for dependency in &group {
                    let member = this.registry.get(&dependency.task)?.name.clone();
                    let order = DependencyResolver::new(&this.registry).resolve(&member)?;
                    for dep_task in order.iter().take(order.len().saturating_sub(1)) {
                        if this.is_fresh(&dep_task.name) {
                            this.run_task(&dep_task.name).await?;
                        }
                    }
                    members.push(member);
                }

                let semaphore = Arc::new(tokio::sync::Semaphore::new(
                    this.options.max_workers.max(1),
                ));
                let mut set: JoinSet<DrunResult<()>> = JoinSet::new();
                for member in members {
                    if !this.is_fresh(&member) {
                        continue;
                    }
                    let this_worker = Arc::clone(&this);
                    let semaphore = Arc::clone(&semaphore);
                    set.spawn(async move {
                        let Ok(_permit) = semaphore.acquire_owned().await else {
                            return Ok(());
                        };
                        this_worker.run_task(&member).await
                    });
                }

                let mut first_error: Option<DrunError> = None;
                while let Some(joined) = set.join_next().await {
                    let result = joined.unwrap_or_else(|e| {
                        Err(DrunError::Other(
                            format!("dependency worker panicked: {e}").into_boxed_str(),
                        ))
                    });
                    if let Err(e) = result
                        && first_error.is_none()
                    {
                        first_error = Some(e);
                    }
                }
                if let Some(e) = first_error {
                    return Err(e);
                }
            }

            if !this.mark_started(&task.name) {
                return Ok(());
            }
            this.run_body(&task).await
        })
    }

    /// Whether the task has not been started yet (read-only check).
    fn is_fresh(&self, name: &str) -> bool {
        !self
            .started
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(name)
    }

    /// Atomically claims a task for execution.
    fn mark_started(&self, name: &str) -> bool {
        self.started
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(name.to_string())
    }

    async fn run_body(&self, task: &TaskDef) -> DrunResult<()> {
        let supplied = if task.name == self.target {
            self.caller_params.clone()
        } else {
            BTreeMap::new()
        };
        let parameters = validate_parameters(task, &supplied)?;

        if self.options.verbose {
            self.output.line(format!("🏃 Running task: {}", task.name));
        }
        debug!(task = %task.name, "starting task body");

        let file = if task.source_file.is_empty() {
            self.file.clone()
        } else {
            task.source_file.clone()
        };

        let mut ctx = ExecutionContext::new(Arc::clone(&self.project))
            .with_parameters(parameters)
            .with_location(Some(file), Some(task.name.clone()))
            .with_output(self.output.clone())
            .with_secrets(self.secrets.clone())
            .with_state(Arc::clone(&self.state))
            .with_dry_run(self.options.dry_run)
            .with_verbose(self.options.verbose)
            .with_allow_undefined(self.options.allow_undefined)
            .with_cancel_token(self.cancel.clone())
            .with_max_workers(self.options.max_workers);

        self.executor.run_body(&task.body, &mut ctx).await
    }
}

/// Parses and validates raw bindings against a task's declared
/// parameters. The target task receives the caller's bindings;
/// dependencies run on defaults alone.
fn validate_parameters(
    task: &TaskDef,
    supplied: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, TypedValue>, DrunError> {
    for name in supplied.keys() {
        if !task.parameters.iter().any(|p| &p.name == name) {
            return Err(ParamError::Unknown {
                task: task.name.clone(),
                name: name.clone(),
            }
            .into());
        }
    }

    let mut validated = BTreeMap::new();
    for parameter in &task.parameters {
        let value = resolve_parameter(task, parameter, supplied.get(&parameter.name))?;
        validated.insert(parameter.name.clone(), value);
    }
    Ok(validated)
}

fn resolve_parameter(
    task: &TaskDef,
    parameter: &Parameter,
    supplied: Option<&String>,
) -> Result<TypedValue, ParamError> {
    if let Some(raw) = supplied {
        return parameter.validate(raw);
    }
    if let Some(default) = parameter.default_value()? {
        return Ok(default);
    }
    match parameter.kind {
        ParamKind::Variadic => Ok(TypedValue::List(Vec::new())),
        ParamKind::Optional => Ok(TypedValue::Str(String::new())),
        ParamKind::Required => Err(ParamError::MissingRequired {
            task: task.name.clone(),
            parameter: parameter.name.clone(),
        }),
    }
}
