//! Tenant context — scoped access to one tenant's data partition.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::TenantError;

/// Provides scoped execution contexts for tenant schemas.
///
/// Deployments back this with their schema router / connection manager; the
/// worker only sees the trait. The guarantee required of implementations:
/// data access between `activate` and dropping the returned guard is
/// isolated to the named schema, and the prior scope is restored on drop
/// even when the scoped code fails.
#[async_trait]
pub trait TenantContext: Send + Sync {
    /// Enter the named schema, returning a guard that restores the previous
    /// scope when dropped.
    async fn activate(&self, schema: &str) -> Result<TenantGuard, TenantError>;
}

/// RAII guard for an active tenant scope.
pub struct TenantGuard {
    restore: Option<Box<dyn FnOnce() + Send>>,
}

impl TenantGuard {
    /// Build a guard from a restore action run exactly once on drop.
    pub fn new(restore: impl FnOnce() + Send + 'static) -> Self {
        Self {
            restore: Some(Box::new(restore)),
        }
    }

    /// A guard with no restore action, for providers that track nothing.
    pub fn noop() -> Self {
        Self { restore: None }
    }
}

impl Drop for TenantGuard {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

impl std::fmt::Debug for TenantGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantGuard").finish_non_exhaustive()
    }
}

/// In-process tenant context backed by a scope stack.
///
/// Tracks which schema is active without touching any database, which is
/// all a single-process deployment (or a test) needs. An optional allowlist
/// rejects schemas that were never provisioned.
#[derive(Default)]
pub struct ScopedTenants {
    schemas: Option<HashSet<String>>,
    stack: Arc<Mutex<Vec<String>>>,
}

impl ScopedTenants {
    /// Accept any schema name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only the given schema names.
    pub fn with_schemas<I, S>(schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemas: Some(schemas.into_iter().map(Into::into).collect()),
            stack: Arc::default(),
        }
    }

    /// The currently active schema, if any.
    pub fn current(&self) -> Option<String> {
        self.stack
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait]
impl TenantContext for ScopedTenants {
    async fn activate(&self, schema: &str) -> Result<TenantGuard, TenantError> {
        if let Some(known) = &self.schemas
            && !known.contains(schema)
        {
            return Err(TenantError::UnknownSchema {
                schema: schema.to_string(),
            });
        }

        self.stack
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(schema.to_string());
        tracing::debug!("Entered schema scope: {}", schema);

        let stack = Arc::clone(&self.stack);
        let schema = schema.to_string();
        Ok(TenantGuard::new(move || {
            stack.lock().unwrap_or_else(|e| e.into_inner()).pop();
            tracing::debug!("Left schema scope: {}", schema);
        }))
    }
}
