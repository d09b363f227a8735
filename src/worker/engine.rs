//! Execution engine — the worker loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::WorkerConfig;
use crate::error::{ChannelError, Error, TaskError};
use crate::hooks::WorkerHooks;
use crate::registry::{Callable, FunctionRegistry};
use crate::task::{SCHEMA_KEY, Task};
use crate::tenant::TenantContext;
use crate::worker::recycle::RecyclePolicy;
use crate::worker::timer::{SharedTimer, TIMER_IDLE};

/// Message on the task source queue.
#[derive(Debug)]
pub enum QueueMessage {
    /// A task to execute.
    Task(Task),
    /// Shutdown sentinel: the worker finishes its current wait and exits.
    Stop,
}

impl From<Task> for QueueMessage {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

/// Why the worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The stop sentinel arrived (or the task source closed).
    Stopped,
    /// The recycle policy fired; the supervisor should start a replacement.
    Recycled,
}

/// Shared collaborators handed to a worker at construction.
#[derive(Clone)]
pub struct WorkerDeps {
    pub registry: Arc<FunctionRegistry>,
    pub tenants: Arc<dyn TenantContext>,
    /// Timer cell shared with the external watchdog.
    pub timer: SharedTimer,
    pub hooks: WorkerHooks,
}

/// Per-task control decision after posting the result.
enum Control {
    Continue,
    Recycle,
}

/// Outcome of one task's execution attempt.
enum Outcome {
    /// The function returned a value.
    Completed(Value),
    /// The descriptor named no schema; execution was skipped entirely.
    Skipped,
    /// Execution failed. `error` is retained only when the task requested
    /// synchronous semantics and the failure must propagate.
    Failed {
        message: String,
        error: Option<anyhow::Error>,
    },
}

/// A worker: takes tasks from the task source, executes them inside the
/// tenant's schema scope, and puts the finished descriptors on the result
/// sink.
///
/// One worker runs per process. The loop ends on the stop sentinel, on a
/// recycle trigger, on a `sync` task failure, or on an engine-level error
/// (closed result sink); it never panics on a task failure.
pub struct Worker {
    name: String,
    deps: WorkerDeps,
    default_timeout: Option<Duration>,
    recycle: RecyclePolicy,
    task_count: u32,
}

impl Worker {
    /// Create a worker from its configuration and shared collaborators.
    pub fn new(config: WorkerConfig, deps: WorkerDeps) -> Self {
        Self {
            recycle: RecyclePolicy::from_config(&config),
            name: config.name,
            default_timeout: config.default_timeout,
            deps,
            task_count: 0,
        }
    }

    /// Tasks dequeued so far.
    pub fn task_count(&self) -> u32 {
        self.task_count
    }

    /// Run the loop until shutdown or recycle.
    ///
    /// A `sync` task failure and an engine-level error both surface as
    /// `Err`; the supervisor decides what happens to the process.
    pub async fn run(
        mut self,
        mut tasks: mpsc::Receiver<QueueMessage>,
        results: mpsc::UnboundedSender<Task>,
    ) -> Result<ExitStatus, Error> {
        tracing::info!("{} ready for work", self.name);
        self.deps.hooks.notify_spawn(&self.name);
        self.deps.hooks.set_title(&format!("{} idle", self.name));

        loop {
            let task = match tasks.recv().await {
                Some(QueueMessage::Task(task)) => task,
                Some(QueueMessage::Stop) | None => {
                    tracing::info!("{} stopped doing work", self.name);
                    return Ok(ExitStatus::Stopped);
                }
            };

            match self.process(task, &results).await {
                Ok(Control::Continue) => {}
                Ok(Control::Recycle) => {
                    tracing::info!("{} recycling after {} tasks", self.name, self.task_count);
                    return Ok(ExitStatus::Recycled);
                }
                Err(err) => {
                    tracing::error!("{} terminating: {}", self.name, err);
                    return Err(err);
                }
            }
        }
    }

    /// Handle one dequeued task end to end.
    async fn process(
        &mut self,
        mut task: Task,
        results: &mpsc::UnboundedSender<Task>,
    ) -> Result<Control, Error> {
        self.deps.timer.set_idle();
        self.task_count += 1;

        let func_repr = task.func.repr();
        let schema = task.schema_name().unwrap_or("-").to_string();
        match &task.group {
            Some(group) => tracing::info!(
                "{} processing {} '{}' on {} [{}]",
                self.name,
                task.name,
                func_repr,
                schema,
                group
            ),
            None => tracing::info!(
                "{} processing {} '{}' on {}",
                self.name,
                task.name,
                func_repr,
                schema
            ),
        }

        let mut title = format!("{} processing {} '{}'", self.name, task.name, func_repr);
        if let Some(group) = &task.group {
            title.push_str(&format!(" [{group}]"));
        }
        self.deps.hooks.set_title(&title);

        self.deps.hooks.notify_pre_execute(&task);
        let callable = self.deps.registry.resolve(&task.func).await;
        self.deps.hooks.refresh();

        // Per-task override wins over the default and is consumed from the
        // descriptor so it never appears in the posted result.
        let budget = task.timeout.take().or(self.default_timeout);
        self.deps.timer.set_busy(budget);

        let outcome = self.execute(callable, &task).await;

        let task_name = task.name.clone();
        let propagate;
        {
            // The result fields, the sink push, and the idle reset must be
            // one atomic update from the watchdog's point of view.
            let mut slot = self.deps.timer.lock();
            match outcome {
                Outcome::Completed(value) => {
                    task.result = Some(value);
                    task.success = Some(true);
                    propagate = None;
                }
                Outcome::Skipped => {
                    task.result = None;
                    task.success = Some(false);
                    propagate = None;
                }
                Outcome::Failed { message, error } => {
                    task.result = Some(Value::String(message));
                    task.success = Some(false);
                    propagate = error;
                }
            }
            task.stopped = Some(Utc::now());
            results.send(task).map_err(|_| ChannelError::ResultSinkClosed {
                task: task_name.clone(),
            })?;
            *slot = TIMER_IDLE;
        }
        self.deps.hooks.set_title(&format!("{} idle", self.name));

        if let Some(error) = propagate {
            return Err(TaskError::Failed {
                name: task_name,
                error,
            }
            .into());
        }

        if self.recycle.should_recycle(self.task_count) {
            self.deps.timer.set_recycled();
            return Ok(Control::Recycle);
        }

        Ok(Control::Continue)
    }

    /// Execute the task body and classify the outcome.
    async fn execute(&self, callable: Option<Callable>, task: &Task) -> Outcome {
        let Some(schema) = task.schema_name() else {
            tracing::warn!(
                "Task [{}] carries no '{}' entry; skipping execution",
                task.name,
                SCHEMA_KEY
            );
            return Outcome::Skipped;
        };

        match self.invoke_scoped(callable, schema, task).await {
            Ok(value) => Outcome::Completed(value),
            Err(error) => {
                let message = format!("{error:#}");
                self.deps.hooks.report_error();
                Outcome::Failed {
                    message,
                    error: task.sync.then_some(error),
                }
            }
        }
    }

    /// Invoke the function inside the tenant scope. The scope is held for
    /// exactly this invocation and restored on exit, failure included.
    async fn invoke_scoped(
        &self,
        callable: Option<Callable>,
        schema: &str,
        task: &Task,
    ) -> anyhow::Result<Value> {
        let _scope = self.deps.tenants.activate(schema).await?;
        let callable = callable
            .ok_or_else(|| anyhow::anyhow!("unresolved function '{}'", task.func.repr()))?;
        callable.invoke(task.args.clone(), task.kwargs.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::ScopedTenants;

    fn worker_with(config: WorkerConfig) -> (Worker, SharedTimer) {
        let timer = SharedTimer::new();
        let worker = Worker::new(
            config,
            WorkerDeps {
                registry: Arc::new(FunctionRegistry::new()),
                tenants: Arc::new(ScopedTenants::new()),
                timer: timer.clone(),
                hooks: WorkerHooks::new(),
            },
        );
        (worker, timer)
    }

    #[tokio::test]
    async fn stop_sentinel_ends_the_loop() {
        let (worker, _timer) = worker_with(WorkerConfig::default());
        let (task_tx, task_rx) = mpsc::channel(4);
        let (result_tx, _result_rx) = mpsc::unbounded_channel();

        task_tx.send(QueueMessage::Stop).await.unwrap();
        let status = worker.run(task_rx, result_tx).await.unwrap();
        assert_eq!(status, ExitStatus::Stopped);
    }

    #[tokio::test]
    async fn closed_task_source_counts_as_stop() {
        let (worker, _timer) = worker_with(WorkerConfig::default());
        let (task_tx, task_rx) = mpsc::channel::<QueueMessage>(1);
        let (result_tx, _result_rx) = mpsc::unbounded_channel();

        drop(task_tx);
        let status = worker.run(task_rx, result_tx).await.unwrap();
        assert_eq!(status, ExitStatus::Stopped);
    }

    #[tokio::test]
    async fn closed_result_sink_is_an_engine_error() {
        let (worker, _timer) = worker_with(WorkerConfig::default());
        let (task_tx, task_rx) = mpsc::channel(4);
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        drop(result_rx);

        task_tx
            .send(Task::new("t1", "no.such.fn").schema("tenant_a").into())
            .await
            .unwrap();
        let err = worker.run(task_rx, result_tx).await.unwrap_err();
        assert!(matches!(err, Error::Channel(_)));
    }

    #[test]
    fn queue_message_from_task() {
        let msg: QueueMessage = Task::new("t1", "f").into();
        assert!(matches!(msg, QueueMessage::Task(_)));
    }
}
