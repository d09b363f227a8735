//! Function registry — maps task function names to invocable functions.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::task::FuncRef;

/// A task function.
///
/// Task functions receive the descriptor's positional and named arguments
/// and return a JSON value. Failures are reported as [`anyhow::Error`] so
/// arbitrary error chains survive into the recorded result text.
#[async_trait]
pub trait TaskFn: Send + Sync {
    async fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> anyhow::Result<Value>;
}

#[async_trait]
impl<F, Fut> TaskFn for F
where
    F: Fn(Vec<Value>, Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> anyhow::Result<Value> {
        (self)(args, kwargs).await
    }
}

/// A resolved function together with its invocation metadata.
///
/// `accepts_kwargs` is computed once at registration time: functions
/// registered without it are invoked with positional arguments only, and
/// the descriptor's named arguments (including the schema key) stay out of
/// the call.
#[derive(Clone)]
pub struct Callable {
    func: Arc<dyn TaskFn>,
    accepts_kwargs: bool,
}

impl Callable {
    /// Wrap a function, declaring whether it accepts named arguments.
    pub fn new(func: Arc<dyn TaskFn>, accepts_kwargs: bool) -> Self {
        Self {
            func,
            accepts_kwargs,
        }
    }

    /// Invoke the function, forwarding named arguments only when the
    /// registration declared support for them.
    pub async fn invoke(
        &self,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> anyhow::Result<Value> {
        if self.accepts_kwargs {
            self.func.call(args, kwargs).await
        } else {
            self.func.call(args, Map::new()).await
        }
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("accepts_kwargs", &self.accepts_kwargs)
            .finish_non_exhaustive()
    }
}

/// Registry of task functions, keyed by dotted name.
#[derive(Default)]
pub struct FunctionRegistry {
    funcs: RwLock<HashMap<String, Callable>>,
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function invoked with positional arguments only.
    pub async fn register(&self, name: impl Into<String>, func: impl TaskFn + 'static) {
        self.insert(name.into(), Callable::new(Arc::new(func), false))
            .await;
    }

    /// Register a function that also receives the descriptor's named
    /// arguments.
    pub async fn register_with_kwargs(&self, name: impl Into<String>, func: impl TaskFn + 'static) {
        self.insert(name.into(), Callable::new(Arc::new(func), true))
            .await;
    }

    async fn insert(&self, name: String, callable: Callable) {
        self.funcs.write().await.insert(name.clone(), callable);
        tracing::debug!("Registered task function: {}", name);
    }

    /// Get a registered function by name.
    pub async fn get(&self, name: &str) -> Option<Callable> {
        self.funcs.read().await.get(name).cloned()
    }

    /// Check if a function is registered.
    pub async fn has(&self, name: &str) -> bool {
        self.funcs.read().await.contains_key(name)
    }

    /// List all registered names.
    pub async fn list(&self) -> Vec<String> {
        self.funcs.read().await.keys().cloned().collect()
    }

    /// Number of registered functions.
    pub async fn count(&self) -> usize {
        self.funcs.read().await.len()
    }

    /// Resolve a task's function reference to an invocable function.
    ///
    /// Never fails: an unknown name resolves to `None`, which surfaces as a
    /// recorded invocation error on that task rather than a worker crash.
    pub async fn resolve(&self, func: &FuncRef) -> Option<Callable> {
        match func {
            FuncRef::Direct(callable) => Some(callable.clone()),
            FuncRef::Named(name) => self.get(name).await,
        }
    }
}
