//! PostgreSQL implementation of ActivityLog.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{OrganizationId, Timestamp};
use crate::ports::{ActivityAction, ActivityEntry, ActivityLog, StoreError};

/// Append-only audit trail on PostgreSQL.
#[derive(Clone)]
pub struct PostgresActivityLog {
    pool: PgPool,
}

impl PostgresActivityLog {
    /// Creates a log over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn action_to_str(action: ActivityAction) -> &'static str {
    match action {
        ActivityAction::OrderCreated => "order_created",
        ActivityAction::StatusUpdate => "status_update",
        ActivityAction::OrderDeleted => "order_deleted",
    }
}

fn action_from_str(s: &str) -> Result<ActivityAction, StoreError> {
    match s {
        "order_created" => Ok(ActivityAction::OrderCreated),
        "status_update" => Ok(ActivityAction::StatusUpdate),
        "order_deleted" => Ok(ActivityAction::OrderDeleted),
        other => Err(StoreError::Corrupt(format!(
            "unknown activity action '{}'",
            other
        ))),
    }
}

#[async_trait]
impl ActivityLog for PostgresActivityLog {
    async fn append(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (
                occurred_at, organization_id, action, details, user_id
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.timestamp.as_datetime())
        .bind(entry.organization_id.as_str())
        .bind(action_to_str(entry.action))
        .bind(&entry.details)
        .bind(&entry.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to append activity entry: {}", e)))?;

        Ok(())
    }

    async fn list(
        &self,
        organization_id: &OrganizationId,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT occurred_at, organization_id, action, details, user_id
            FROM activity_log
            WHERE organization_id = $1
            ORDER BY occurred_at DESC
            LIMIT $2
            "#,
        )
        .bind(organization_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to list activity entries: {}", e)))?;

        rows.iter()
            .map(|row| {
                let occurred_at: chrono::DateTime<chrono::Utc> = row
                    .try_get("occurred_at")
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                let org: String = row
                    .try_get("organization_id")
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                let action_raw: String = row
                    .try_get("action")
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                Ok(ActivityEntry {
                    timestamp: Timestamp::from_datetime(occurred_at),
                    organization_id: OrganizationId::new(org),
                    action: action_from_str(&action_raw)?,
                    details: row
                        .try_get("details")
                        .map_err(|e| StoreError::Corrupt(e.to_string()))?,
                    user_id: row
                        .try_get("user_id")
                        .map_err(|e| StoreError::Corrupt(e.to_string()))?,
                })
            })
            .collect()
    }
}
