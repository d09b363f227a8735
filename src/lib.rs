//! TenantQ — multi-tenant background task worker core.
//!
//! The heart of the crate is [`worker::Worker`]: a long-lived loop that
//! pulls task descriptors from a queue, resolves the target function,
//! enters the tenant's schema scope, executes, records the outcome on the
//! descriptor, and hands it to a result channel. Workers recycle themselves
//! after a configured task count or memory ceiling so a supervisor can
//! replace them with a fresh process.

pub mod config;
pub mod error;
pub mod hooks;
pub mod registry;
pub mod task;
pub mod tenant;
pub mod worker;

pub use config::WorkerConfig;
pub use error::Error;
pub use registry::FunctionRegistry;
pub use task::{FuncRef, Task};
pub use tenant::TenantContext;
pub use worker::{ExitStatus, QueueMessage, Worker, WorkerDeps};
