//! Worker system — queue-fed task execution with tenant scoping.
//!
//! Core components:
//! - `engine` — the worker loop (dequeue, resolve, scope, invoke, post)
//! - `recycle` — count/memory triggers for planned self-termination
//! - `timer` — the shared cell an external watchdog reads to spot hangs

pub mod engine;
pub mod recycle;
pub mod timer;

pub use engine::{ExitStatus, QueueMessage, Worker, WorkerDeps};
pub use recycle::RecyclePolicy;
pub use timer::{SharedTimer, TIMER_IDLE, TIMER_RECYCLED};
