//! PostgreSQL implementation of OrderStore.
//!
//! Orders are stored one row per order with line items and feedback as
//! JSONB columns; the row id is always the normalized `ORD-<digits>` form.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{CustomerId, OrderId, OrganizationId, Timestamp};
use crate::domain::order::{Feedback, Order, OrderItem, OrderStatus};
use crate::ports::{OrderScope, OrderStore, StoreError};

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend_err(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("{}: {}", context, e))
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<Order, StoreError> {
    let status_raw: String = row
        .try_get("status")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let status = OrderStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{}'", status_raw)))?;

    let items_json: serde_json::Value = row
        .try_get("items")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let items: Vec<OrderItem> = serde_json::from_value(items_json)
        .map_err(|e| StoreError::Corrupt(format!("bad items payload: {}", e)))?;

    let feedback: Option<Feedback> = match row
        .try_get::<Option<serde_json::Value>, _>("feedback")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?
    {
        Some(value) => Some(
            serde_json::from_value(value)
                .map_err(|e| StoreError::Corrupt(format!("bad feedback payload: {}", e)))?,
        ),
        None => None,
    };

    let id: String = row
        .try_get("id")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let organization_id: String = row
        .try_get("organization_id")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let customer_id: String = row
        .try_get("customer_id")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let table_number: i32 = row
        .try_get("table_number")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let last_updated: chrono::DateTime<chrono::Utc> = row
        .try_get("last_updated")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

    Ok(Order {
        id: OrderId::normalize(&id),
        organization_id: OrganizationId::new(organization_id),
        table_number: table_number as u32,
        customer_id: CustomerId::new(customer_id),
        items,
        subtotal: row
            .try_get("subtotal")
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        total: row
            .try_get("total")
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        status,
        status_message: row
            .try_get("status_message")
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at: Timestamp::from_datetime(created_at),
        last_updated: Timestamp::from_datetime(last_updated),
        feedback,
    })
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let items = serde_json::to_value(&order.items)
            .map_err(|e| StoreError::Backend(format!("Failed to encode items: {}", e)))?;
        let feedback = order
            .feedback
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Backend(format!("Failed to encode feedback: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, organization_id, table_number, customer_id, items,
                subtotal, total, status, status_message, created_at,
                last_updated, feedback
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.organization_id.as_str())
        .bind(order.table_number as i32)
        .bind(order.customer_id.as_str())
        .bind(items)
        .bind(order.subtotal)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(&order.status_message)
        .bind(order.created_at.as_datetime())
        .bind(order.last_updated.as_datetime())
        .bind(feedback)
        .execute(&self.pool)
        .await
        .map_err(|e| backend_err("Failed to insert order", e))?;

        Ok(())
    }

    async fn find(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| backend_err("Failed to fetch order", e))?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn list(
        &self,
        scope: &OrderScope,
        before: Option<Timestamp>,
        limit: usize,
    ) -> Result<Vec<Order>, StoreError> {
        // Strictly-less-than cursor keeps paging stable under concurrent
        // inserts; the MAX_UTC fallback makes the first page use the same
        // query shape.
        let cursor = before
            .map(|t| *t.as_datetime())
            .unwrap_or_else(|| chrono::DateTime::<chrono::Utc>::MAX_UTC);

        let rows = match scope {
            OrderScope::Organization(org) => {
                sqlx::query(
                    r#"
                    SELECT * FROM orders
                    WHERE organization_id = $1 AND created_at < $2
                    ORDER BY created_at DESC
                    LIMIT $3
                    "#,
                )
                .bind(org.as_str())
                .bind(cursor)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            OrderScope::CustomerTable {
                organization_id,
                table_number,
                customer_id,
            } => {
                sqlx::query(
                    r#"
                    SELECT * FROM orders
                    WHERE organization_id = $1
                      AND table_number = $2
                      AND customer_id = $3
                      AND created_at < $4
                    ORDER BY created_at DESC
                    LIMIT $5
                    "#,
                )
                .bind(organization_id.as_str())
                .bind(*table_number as i32)
                .bind(customer_id.as_str())
                .bind(cursor)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| backend_err("Failed to list orders", e))?;

        rows.iter().map(row_to_order).collect()
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        status_message: &str,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                status_message = $3,
                last_updated = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(status_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_err("Failed to update order status", e))?;

        match row {
            Some(row) => row_to_order(&row),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }
}
