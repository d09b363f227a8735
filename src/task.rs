//! Task descriptor — the unit of work flowing through the queues.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::registry::Callable;

/// Key in `kwargs` naming the tenant partition a task executes against.
pub const SCHEMA_KEY: &str = "schema_name";

/// Reference to the function a task should run.
///
/// Either an already-invocable function or a dotted name resolved through
/// the registry when the worker picks the task up.
#[derive(Clone)]
pub enum FuncRef {
    /// An invocable function handed over directly by the enqueuer.
    Direct(Callable),
    /// A registered function name, resolved lazily.
    Named(String),
}

impl FuncRef {
    /// Human-readable representation for logs and process titles.
    pub fn repr(&self) -> String {
        match self {
            Self::Direct(_) => "<callable>".to_string(),
            Self::Named(name) => name.clone(),
        }
    }
}

impl std::fmt::Debug for FuncRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("FuncRef::Direct(<callable>)"),
            Self::Named(name) => write!(f, "FuncRef::Named({name:?})"),
        }
    }
}

impl From<&str> for FuncRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for FuncRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Callable> for FuncRef {
    fn from(callable: Callable) -> Self {
        Self::Direct(callable)
    }
}

/// A queued unit of work.
///
/// Produced once by an enqueuer, consumed by exactly one worker. The worker
/// mutates it in place to record the outcome (`result`, `success`,
/// `stopped`) and then hands ownership to the result channel. Serializes
/// without the function reference, for collectors that persist results.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Unique task ID.
    pub id: Uuid,
    /// Opaque task identifier used in logs.
    pub name: String,
    /// Function to execute.
    #[serde(skip_serializing)]
    pub func: FuncRef,
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Named arguments. Must carry a [`SCHEMA_KEY`] entry; its absence is a
    /// recognized failure, not a crash.
    pub kwargs: Map<String, Value>,
    /// Label for logging/grouping. No execution effect.
    pub group: Option<String>,
    /// Per-task override of the worker's default timeout budget. Taken off
    /// the descriptor before execution.
    pub timeout: Option<Duration>,
    /// When true, execution failures propagate out of the worker loop
    /// instead of being swallowed.
    pub sync: bool,
    /// When the task was created.
    pub started: DateTime<Utc>,
    /// Return value on success, error text on failure. Written by the
    /// worker.
    pub result: Option<Value>,
    /// Whether execution succeeded. Written by the worker.
    pub success: Option<bool>,
    /// Completion timestamp. Written by the worker.
    pub stopped: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task for the given function.
    pub fn new(name: impl Into<String>, func: impl Into<FuncRef>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            func: func.into(),
            args: Vec::new(),
            kwargs: Map::new(),
            group: None,
            timeout: None,
            sync: false,
            started: Utc::now(),
            result: None,
            success: None,
            stopped: None,
        }
    }

    /// Set the positional arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Add a named argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    /// Set the tenant partition the task executes against.
    pub fn schema(self, schema: impl Into<String>) -> Self {
        self.kwarg(SCHEMA_KEY, Value::String(schema.into()))
    }

    /// Set the grouping label.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Override the worker's default timeout budget for this task.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Request synchronous semantics: failures re-raise out of the loop.
    pub fn sync(mut self) -> Self {
        self.sync = true;
        self
    }

    /// The tenant partition named by `kwargs`, if any.
    pub fn schema_name(&self) -> Option<&str> {
        self.kwargs.get(SCHEMA_KEY).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_fields() {
        let task = Task::new("t1", "math.add")
            .args([json!(2), json!(3)])
            .schema("tenant_a")
            .group("batch-7")
            .timeout(Duration::from_secs(5))
            .sync();

        assert_eq!(task.name, "t1");
        assert_eq!(task.func.repr(), "math.add");
        assert_eq!(task.args, vec![json!(2), json!(3)]);
        assert_eq!(task.schema_name(), Some("tenant_a"));
        assert_eq!(task.group.as_deref(), Some("batch-7"));
        assert_eq!(task.timeout, Some(Duration::from_secs(5)));
        assert!(task.sync);
        assert!(task.result.is_none());
        assert!(task.success.is_none());
        assert!(task.stopped.is_none());
    }

    #[test]
    fn schema_name_absent() {
        let task = Task::new("t1", "math.add");
        assert_eq!(task.schema_name(), None);
    }

    #[test]
    fn schema_name_ignores_non_string() {
        let task = Task::new("t1", "math.add").kwarg(SCHEMA_KEY, json!(42));
        assert_eq!(task.schema_name(), None);
    }

    #[test]
    fn func_ref_repr() {
        assert_eq!(FuncRef::from("jobs.report").repr(), "jobs.report");
    }

    #[test]
    fn serializes_without_func() {
        let mut task = Task::new("t1", "math.add").schema("tenant_a");
        task.result = Some(json!(5));
        task.success = Some(true);
        task.stopped = Some(Utc::now());

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["name"], json!("t1"));
        assert_eq!(value["kwargs"][SCHEMA_KEY], json!("tenant_a"));
        assert_eq!(value["result"], json!(5));
        assert_eq!(value["success"], json!(true));
        assert!(value.get("func").is_none());
    }
}
