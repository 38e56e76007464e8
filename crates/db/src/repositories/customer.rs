use chrono::{DateTime, Utc};
use sqlx::Row;

use aurum_core::domain::customer::{InboxPatch, InboxRecord};
use aurum_core::domain::rates::{Metal, RateOrigin};
use aurum_core::domain::session::CustomerId;
use aurum_core::store::{CustomerStore, StoreError};

use super::{backend_error, decode_error, parse_datetime, parse_optional_datetime, parse_optional_decimal};
use crate::DbPool;

pub struct SqlCustomerStore {
    pool: DbPool,
}

impl SqlCustomerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "customer_id, last_query, last_contact, intent, metal, grams, budget,
                              quoted_price, price_source, requires_owner_action, bot_enabled,
                              handoff_at, handoff_reason, updated_at";

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<InboxRecord, StoreError> {
    let customer_id: String =
        row.try_get("customer_id").map_err(|e| decode_error(e.to_string()))?;
    let last_query: Option<String> =
        row.try_get("last_query").map_err(|e| decode_error(e.to_string()))?;
    let last_contact: Option<String> =
        row.try_get("last_contact").map_err(|e| decode_error(e.to_string()))?;
    let intent: Option<String> = row.try_get("intent").map_err(|e| decode_error(e.to_string()))?;
    let metal: Option<String> = row.try_get("metal").map_err(|e| decode_error(e.to_string()))?;
    let grams: Option<String> = row.try_get("grams").map_err(|e| decode_error(e.to_string()))?;
    let budget: Option<String> = row.try_get("budget").map_err(|e| decode_error(e.to_string()))?;
    let quoted_price: Option<String> =
        row.try_get("quoted_price").map_err(|e| decode_error(e.to_string()))?;
    let price_source: Option<String> =
        row.try_get("price_source").map_err(|e| decode_error(e.to_string()))?;
    let requires_owner_action: i64 =
        row.try_get("requires_owner_action").map_err(|e| decode_error(e.to_string()))?;
    let bot_enabled: i64 =
        row.try_get("bot_enabled").map_err(|e| decode_error(e.to_string()))?;
    let handoff_at: Option<String> =
        row.try_get("handoff_at").map_err(|e| decode_error(e.to_string()))?;
    let handoff_reason: Option<String> =
        row.try_get("handoff_reason").map_err(|e| decode_error(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| decode_error(e.to_string()))?;

    Ok(InboxRecord {
        customer: CustomerId(customer_id),
        last_query,
        last_contact: parse_optional_datetime(last_contact),
        intent,
        metal: metal.as_deref().and_then(Metal::parse),
        grams: parse_optional_decimal("grams", grams)?,
        budget,
        quoted_price: parse_optional_decimal("quoted_price", quoted_price)?,
        price_source: price_source.as_deref().and_then(RateOrigin::parse),
        requires_owner_action: requires_owner_action != 0,
        bot_enabled: bot_enabled != 0,
        handoff_at: parse_optional_datetime(handoff_at),
        handoff_reason,
        updated_at: parse_datetime(&updated_at),
    })
}

#[async_trait::async_trait]
impl CustomerStore for SqlCustomerStore {
    async fn find(&self, customer: &CustomerId) -> Result<Option<InboxRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM customer WHERE customer_id = ?"))
            .bind(&customer.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    async fn record_activity(
        &self,
        customer: &CustomerId,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO customer (customer_id, last_query, last_contact, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(customer_id) DO UPDATE SET
                 last_query = excluded.last_query,
                 last_contact = excluded.last_contact,
                 updated_at = excluded.updated_at",
        )
        .bind(&customer.0)
        .bind(query)
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn merge_metadata(
        &self,
        customer: &CustomerId,
        patch: InboxPatch,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let requires_owner_action = patch.requires_owner_action.map(i64::from);

        sqlx::query(
            "INSERT INTO customer (customer_id, intent, metal, grams, budget, quoted_price,
                                   price_source, requires_owner_action, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, IFNULL(?, 0), ?)
             ON CONFLICT(customer_id) DO UPDATE SET
                 intent = COALESCE(excluded.intent, customer.intent),
                 metal = COALESCE(excluded.metal, customer.metal),
                 grams = COALESCE(excluded.grams, customer.grams),
                 budget = COALESCE(excluded.budget, customer.budget),
                 quoted_price = COALESCE(excluded.quoted_price, customer.quoted_price),
                 price_source = COALESCE(excluded.price_source, customer.price_source),
                 requires_owner_action = IFNULL(?, customer.requires_owner_action),
                 updated_at = excluded.updated_at",
        )
        .bind(&customer.0)
        .bind(&patch.intent)
        .bind(patch.metal.map(|m| m.as_str()))
        .bind(patch.grams.map(|g| g.to_string()))
        .bind(&patch.budget)
        .bind(patch.quoted_price.map(|p| p.to_string()))
        .bind(patch.price_source.map(|s| s.as_str()))
        .bind(requires_owner_action)
        .bind(at.to_rfc3339())
        .bind(requires_owner_action)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn set_handoff(
        &self,
        customer: &CustomerId,
        bot_enabled: bool,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let requires_owner_action = i64::from(!bot_enabled);

        sqlx::query(
            "INSERT INTO customer (customer_id, requires_owner_action, bot_enabled, handoff_at,
                                   handoff_reason, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(customer_id) DO UPDATE SET
                 requires_owner_action = excluded.requires_owner_action,
                 bot_enabled = excluded.bot_enabled,
                 handoff_at = excluded.handoff_at,
                 handoff_reason = excluded.handoff_reason,
                 updated_at = excluded.updated_at",
        )
        .bind(&customer.0)
        .bind(requires_owner_action)
        .bind(i64::from(bot_enabled))
        .bind(at.to_rfc3339())
        .bind(reason)
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<InboxRecord>, StoreError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM customer ORDER BY last_contact DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        rows.iter().map(row_to_record).collect()
    }
}
