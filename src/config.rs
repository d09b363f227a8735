//! Configuration types.

use std::time::Duration;

/// Worker configuration. Supplied by the embedding cluster; read-only to
/// the engine.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker name used in logs and process titles.
    pub name: String,
    /// Default execution timeout budget published on the shared timer while
    /// a task runs. `None` means no budget (the watchdog never fires).
    pub default_timeout: Option<Duration>,
    /// Recycle the worker after this many completed tasks (0 = never).
    pub recycle_after: u32,
    /// Resident memory ceiling in kilobytes; exceeding it triggers a
    /// recycle. `None` disables the memory trigger.
    pub max_rss_kb: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "tenantq-worker".to_string(),
            default_timeout: None,
            recycle_after: 500,
            max_rss_kb: None,
        }
    }
}

impl WorkerConfig {
    /// Create a config with the given worker name and defaults otherwise.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the default execution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Set the recycle task count (0 disables the count trigger).
    pub fn with_recycle_after(mut self, count: u32) -> Self {
        self.recycle_after = count;
        self
    }

    /// Set the resident memory ceiling in kilobytes.
    pub fn with_max_rss_kb(mut self, kb: u64) -> Self {
        self.max_rss_kb = Some(kb);
        self
    }
}
