//! Error types for TenantQ.

/// Top-level error type for the worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Tenant error: {0}")]
    Tenant(#[from] TenantError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Per-task failures.
///
/// Only tasks that request synchronous semantics surface through this type;
/// everything else is recorded on the descriptor and swallowed by the loop.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task '{name}' failed: {error}")]
    Failed {
        name: String,
        error: anyhow::Error,
    },
}

/// Tenant-scoping failures.
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("unknown schema: {schema}")]
    UnknownSchema { schema: String },

    #[error("failed to activate schema {schema}: {reason}")]
    ActivationFailed { schema: String, reason: String },
}

/// Queue endpoint failures.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("result sink closed; dropping task '{task}'")]
    ResultSinkClosed { task: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_error_display_carries_cause() {
        let err = Error::Task(TaskError::Failed {
            name: "t1".to_string(),
            error: anyhow::anyhow!("boom"),
        });
        let text = err.to_string();
        assert!(text.contains("t1"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn tenant_error_display() {
        let err = TenantError::UnknownSchema {
            schema: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "unknown schema: nope");
    }

    #[test]
    fn channel_error_wraps_into_top_level() {
        let err: Error = ChannelError::ResultSinkClosed {
            task: "t1".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Channel(_)));
    }
}
