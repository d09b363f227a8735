//! Lifecycle and observability hooks consumed by the worker.

use std::sync::Arc;

use crate::task::Task;

/// A no-argument hook.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// A hook receiving the task about to execute.
pub type TaskHook = Arc<dyn Fn(&Task) + Send + Sync>;

/// A hook receiving a text payload (worker name, process title).
pub type TextHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Optional callbacks fired at worker lifecycle points.
///
/// Every slot defaults to `None`; the firing helpers are no-ops when unset.
/// None of these return values — they exist for observability and resource
/// hygiene, never for control flow.
#[derive(Clone, Default)]
pub struct WorkerHooks {
    /// Fired once when the worker starts, before the first dequeue.
    pub post_spawn: Option<TextHook>,
    /// Fired before each task executes, with the descriptor still carrying
    /// its unresolved function reference.
    pub pre_execute: Option<TaskHook>,
    /// Discards stale pooled connections before each task.
    pub refresh_connections: Option<Hook>,
    /// Out-of-band alerting, fired after a task failure is recorded.
    pub error_reporter: Option<Hook>,
    /// Cosmetic process-title updates. Best effort; the hook owns its own
    /// failure handling.
    pub set_process_title: Option<TextHook>,
}

impl WorkerHooks {
    /// Create an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the post-spawn hook.
    pub fn on_spawn(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.post_spawn = Some(Arc::new(hook));
        self
    }

    /// Set the pre-execute hook.
    pub fn on_pre_execute(mut self, hook: impl Fn(&Task) + Send + Sync + 'static) -> Self {
        self.pre_execute = Some(Arc::new(hook));
        self
    }

    /// Set the connection-refresh hook.
    pub fn on_refresh_connections(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.refresh_connections = Some(Arc::new(hook));
        self
    }

    /// Set the error-reporting hook.
    pub fn on_error(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.error_reporter = Some(Arc::new(hook));
        self
    }

    /// Set the process-title hook.
    pub fn on_set_title(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.set_process_title = Some(Arc::new(hook));
        self
    }

    pub(crate) fn notify_spawn(&self, worker: &str) {
        if let Some(hook) = &self.post_spawn {
            hook(worker);
        }
    }

    pub(crate) fn notify_pre_execute(&self, task: &Task) {
        if let Some(hook) = &self.pre_execute {
            hook(task);
        }
    }

    pub(crate) fn refresh(&self) {
        if let Some(hook) = &self.refresh_connections {
            hook();
        }
    }

    pub(crate) fn report_error(&self) {
        if let Some(hook) = &self.error_reporter {
            hook();
        }
    }

    pub(crate) fn set_title(&self, title: &str) {
        if let Some(hook) = &self.set_process_title {
            hook(title);
        }
    }
}

impl std::fmt::Debug for WorkerHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHooks")
            .field("post_spawn", &self.post_spawn.is_some())
            .field("pre_execute", &self.pre_execute.is_some())
            .field("refresh_connections", &self.refresh_connections.is_some())
            .field("error_reporter", &self.error_reporter.is_some())
            .field("set_process_title", &self.set_process_title.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unset_hooks_are_noops() {
        let hooks = WorkerHooks::new();
        hooks.notify_spawn("w1");
        hooks.notify_pre_execute(&Task::new("t1", "f"));
        hooks.refresh();
        hooks.report_error();
        hooks.set_title("idle");
    }

    #[test]
    fn set_hooks_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let spawn = Arc::clone(&fired);
            let refresh = Arc::clone(&fired);
            let error = Arc::clone(&fired);
            WorkerHooks::new()
                .on_spawn(move |_| {
                    spawn.fetch_add(1, Ordering::SeqCst);
                })
                .on_refresh_connections(move || {
                    refresh.fetch_add(1, Ordering::SeqCst);
                })
                .on_error(move || {
                    error.fetch_add(1, Ordering::SeqCst);
                })
        };

        hooks.notify_spawn("w1");
        hooks.refresh();
        hooks.report_error();
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }
}
