use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use aurum_core::domain::approval::{ApprovalId, ApprovalKind, ApprovalRequest, ApprovalStatus};
use aurum_core::domain::rates::Metal;
use aurum_core::domain::session::CustomerId;
use aurum_core::store::{ApprovalStore, StoreError};

use super::{backend_error, decode_error, parse_datetime, parse_optional_decimal};
use crate::DbPool;

pub struct SqlApprovalStore {
    pool: DbPool,
}

impl SqlApprovalStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, customer_id, kind, metal, grams, budget, estimated_cost,
                              status, final_price, created_at, updated_at";

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalRequest, StoreError> {
    let id: String = row.try_get("id").map_err(|e| decode_error(e.to_string()))?;
    let customer_id: String =
        row.try_get("customer_id").map_err(|e| decode_error(e.to_string()))?;
    let kind_str: String = row.try_get("kind").map_err(|e| decode_error(e.to_string()))?;
    let metal: Option<String> = row.try_get("metal").map_err(|e| decode_error(e.to_string()))?;
    let grams: Option<String> = row.try_get("grams").map_err(|e| decode_error(e.to_string()))?;
    let budget: Option<String> = row.try_get("budget").map_err(|e| decode_error(e.to_string()))?;
    let estimated_cost: Option<String> =
        row.try_get("estimated_cost").map_err(|e| decode_error(e.to_string()))?;
    let status_str: String = row.try_get("status").map_err(|e| decode_error(e.to_string()))?;
    let final_price: Option<String> =
        row.try_get("final_price").map_err(|e| decode_error(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| decode_error(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| decode_error(e.to_string()))?;

    let kind = ApprovalKind::parse(&kind_str)
        .ok_or_else(|| decode_error(format!("unknown approval kind `{kind_str}`")))?;
    let status = ApprovalStatus::parse(&status_str)
        .ok_or_else(|| decode_error(format!("unknown approval status `{status_str}`")))?;

    Ok(ApprovalRequest {
        id: ApprovalId(id),
        customer: CustomerId(customer_id),
        kind,
        metal: metal.as_deref().and_then(Metal::parse),
        grams: parse_optional_decimal("grams", grams)?,
        budget,
        estimated_cost: parse_optional_decimal("estimated_cost", estimated_cost)?,
        status,
        final_price: parse_optional_decimal("final_price", final_price)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

#[async_trait::async_trait]
impl ApprovalStore for SqlApprovalStore {
    async fn insert(&self, request: ApprovalRequest) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO approval_request (id, customer_id, kind, metal, grams, budget,
                                           estimated_cost, status, final_price, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id.0)
        .bind(&request.customer.0)
        .bind(request.kind.as_str())
        .bind(request.metal.map(|m| m.as_str()))
        .bind(request.grams.map(|g| g.to_string()))
        .bind(&request.budget)
        .bind(request.estimated_cost.map(|c| c.to_string()))
        .bind(request.status.as_str())
        .bind(request.final_price.map(|p| p.to_string()))
        .bind(request.created_at.to_rfc3339())
        .bind(request.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn find(&self, id: &ApprovalId) -> Result<Option<ApprovalRequest>, StoreError> {
        let row =
            sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM approval_request WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend_error)?;

        match row {
            Some(ref r) => Ok(Some(row_to_request(r)?)),
            None => Ok(None),
        }
    }

    async fn mark_approved(
        &self,
        id: &ApprovalId,
        final_price: Decimal,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE approval_request
             SET status = 'approved', final_price = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(final_price.to_string())
        .bind(at.to_rfc3339())
        .bind(&id.0)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<ApprovalRequest>, StoreError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM approval_request
             WHERE status = ? ORDER BY created_at DESC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        rows.iter().map(row_to_request).collect()
    }

    async fn count_by_status(&self, status: ApprovalStatus) -> Result<u64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM approval_request WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(backend_error)?;
        Ok(count as u64)
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM approval_request")
            .fetch_one(&self.pool)
            .await
            .map_err(backend_error)?;
        Ok(count as u64)
    }
}
