//! In-memory ActivityLog implementation for testing.
//!
//! # Panics
//!
//! Methods may panic if internal locks are poisoned. Acceptable for test
//! code; this adapter is not meant for production.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::OrganizationId;
use crate::ports::{ActivityAction, ActivityEntry, ActivityLog, StoreError};

/// Append-only in-memory activity log.
pub struct InMemoryActivityLog {
    entries: RwLock<Vec<ActivityEntry>>,
}

impl InMemoryActivityLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// All entries in append order (for test assertions).
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .read()
            .expect("InMemoryActivityLog: lock poisoned")
            .clone()
    }

    /// Entries of one action kind (for test assertions).
    pub fn entries_of(&self, action: ActivityAction) -> Vec<ActivityEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.action == action)
            .collect()
    }
}

impl Default for InMemoryActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        self.entries
            .write()
            .expect("InMemoryActivityLog: lock poisoned")
            .push(entry);
        Ok(())
    }

    async fn list(
        &self,
        organization_id: &OrganizationId,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let mut matching: Vec<ActivityEntry> = self
            .entries()
            .into_iter()
            .filter(|e| &e.organization_id == organization_id)
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }
}
