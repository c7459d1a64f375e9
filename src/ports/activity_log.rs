//! ActivityLog port - append-only audit trail for order mutations.
//!
//! Every store-write path records what happened and who did it. The log
//! is consumed by an activity viewer that is outside this core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrganizationId, Timestamp};

use super::StoreError;

/// Kind of activity being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    OrderCreated,
    StatusUpdate,
    OrderDeleted,
}

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub timestamp: Timestamp,
    pub organization_id: OrganizationId,
    pub action: ActivityAction,
    pub details: serde_json::Value,
    pub user_id: String,
}

impl ActivityEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(
        organization_id: OrganizationId,
        action: ActivityAction,
        details: serde_json::Value,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Timestamp::now(),
            organization_id,
            action,
            details,
            user_id: user_id.into(),
        }
    }
}

/// Port for the append-only activity log.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Appends one entry. Never updates or deletes.
    async fn append(&self, entry: ActivityEntry) -> Result<(), StoreError>;

    /// Lists entries for an organization, newest first.
    async fn list(
        &self,
        organization_id: &OrganizationId,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError>;
}
