//! Connection registry.
//!
//! # Data Flow
//! ```text
//! connect request
//!     → parser decodes ConnectionRecord
//!     → registry.put(app_name, record)         (overwrites any previous record)
//!
//! span_event_data request
//!     → registry.get(batch.run_id)             (None → request refused)
//!     → translator builds resource attributes from the record
//! ```
//!
//! # Design Decisions
//! - One instance per receiver, injected through `AppState`; no process-wide state
//! - Sharded `DashMap` so concurrent requests only contend on the same shard
//! - Records are stored behind `Arc` so readers never hold a shard lock while translating
//! - No eviction: entries live as long as the registry

use dashmap::DashMap;
use std::sync::Arc;

use crate::observability::metrics;
use crate::protocol::ConnectionRecord;

/// Thread-safe map from application name to its latest connection record.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<DashMap<String, Arc<ConnectionRecord>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` under `name`, replacing any previous record.
    pub fn put(&self, name: impl Into<String>, record: ConnectionRecord) -> Arc<ConnectionRecord> {
        let record = Arc::new(record);
        let name = name.into();
        if let Some(previous) = self.inner.insert(name.clone(), Arc::clone(&record)) {
            tracing::debug!(
                app_name = %name,
                previous_pid = previous.pid,
                pid = record.pid,
                "Connection replaced"
            );
        }
        metrics::record_connections(self.inner.len());
        record
    }

    /// Latest record stored under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<ConnectionRecord>> {
        self.inner.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Number of registered applications.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
