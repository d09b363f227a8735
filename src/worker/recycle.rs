//! Recycle policy — when a worker should retire itself.

use crate::config::WorkerConfig;

/// Decides whether a worker should terminate after its current task.
///
/// Two independent triggers, either sufficient: a completed-task count and
/// a resident-memory ceiling. Recycling lets the supervisor replace a
/// long-running worker before leaks and allocator drift accumulate.
#[derive(Debug, Clone)]
pub struct RecyclePolicy {
    max_tasks: u32,
    max_rss_kb: Option<u64>,
}

impl RecyclePolicy {
    /// Create a policy. `max_tasks = 0` disables the count trigger;
    /// `max_rss_kb = None` disables the memory trigger.
    pub fn new(max_tasks: u32, max_rss_kb: Option<u64>) -> Self {
        Self {
            max_tasks,
            max_rss_kb,
        }
    }

    /// Build the policy from a worker config.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.recycle_after, config.max_rss_kb)
    }

    /// Evaluate the triggers after `completed` tasks.
    pub fn should_recycle(&self, completed: u32) -> bool {
        (self.max_tasks > 0 && completed >= self.max_tasks) || self.over_memory_ceiling()
    }

    fn over_memory_ceiling(&self) -> bool {
        match (self.max_rss_kb, resident_set_kb()) {
            (Some(ceiling), Some(rss)) => rss >= ceiling,
            _ => false,
        }
    }
}

/// Resident set size of the current process in kilobytes.
///
/// Reads the OS accounting where supported (`/proc/self/status` on Linux).
/// Elsewhere returns `None`, leaving the memory trigger inactive.
#[cfg(target_os = "linux")]
fn resident_set_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(not(target_os = "linux"))]
fn resident_set_kb() -> Option<u64> {
    None
}
