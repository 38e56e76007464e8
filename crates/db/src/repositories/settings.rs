use chrono::Utc;
use sqlx::Row;

use aurum_core::domain::approval::ApprovalId;
use aurum_core::domain::session::CustomerId;
use aurum_core::domain::settings::{ManualRates, OwnerContext, SettingsPatch, StoreSettings};
use aurum_core::store::{SettingsStore, StoreError};

use super::{backend_error, decode_error, parse_decimal};
use crate::DbPool;

/// Singleton-row store configuration. The row is auto-created with defaults
/// on first read, so a fresh database behaves sensibly before any operator
/// edit.
pub struct SqlSettingsStore {
    pool: DbPool,
}

impl SqlSettingsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn write(&self, settings: &StoreSettings) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO store_settings (id, store_location, map_link, owner_number,
                                         welcome_media_url, approval_threshold, manual_gold,
                                         manual_silver, manual_platinum, updated_at)
             VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 store_location = excluded.store_location,
                 map_link = excluded.map_link,
                 owner_number = excluded.owner_number,
                 welcome_media_url = excluded.welcome_media_url,
                 approval_threshold = excluded.approval_threshold,
                 manual_gold = excluded.manual_gold,
                 manual_silver = excluded.manual_silver,
                 manual_platinum = excluded.manual_platinum,
                 updated_at = excluded.updated_at",
        )
        .bind(&settings.store_location)
        .bind(&settings.map_link)
        .bind(&settings.owner_number)
        .bind(&settings.welcome_media_url)
        .bind(settings.approval_threshold.to_string())
        .bind(settings.manual_rates.gold.to_string())
        .bind(settings.manual_rates.silver.to_string())
        .bind(settings.manual_rates.platinum.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }
}

fn row_to_settings(row: &sqlx::sqlite::SqliteRow) -> Result<StoreSettings, StoreError> {
    let store_location: String =
        row.try_get("store_location").map_err(|e| decode_error(e.to_string()))?;
    let map_link: String = row.try_get("map_link").map_err(|e| decode_error(e.to_string()))?;
    let owner_number: String =
        row.try_get("owner_number").map_err(|e| decode_error(e.to_string()))?;
    let welcome_media_url: String =
        row.try_get("welcome_media_url").map_err(|e| decode_error(e.to_string()))?;
    let approval_threshold: String =
        row.try_get("approval_threshold").map_err(|e| decode_error(e.to_string()))?;
    let manual_gold: String =
        row.try_get("manual_gold").map_err(|e| decode_error(e.to_string()))?;
    let manual_silver: String =
        row.try_get("manual_silver").map_err(|e| decode_error(e.to_string()))?;
    let manual_platinum: String =
        row.try_get("manual_platinum").map_err(|e| decode_error(e.to_string()))?;

    Ok(StoreSettings {
        store_location,
        map_link,
        owner_number,
        welcome_media_url,
        approval_threshold: parse_decimal("approval_threshold", &approval_threshold)?,
        manual_rates: ManualRates {
            gold: parse_decimal("manual_gold", &manual_gold)?,
            silver: parse_decimal("manual_silver", &manual_silver)?,
            platinum: parse_decimal("manual_platinum", &manual_platinum)?,
        },
    })
}

#[async_trait::async_trait]
impl SettingsStore for SqlSettingsStore {
    async fn load(&self) -> Result<StoreSettings, StoreError> {
        let row = sqlx::query(
            "SELECT store_location, map_link, owner_number, welcome_media_url,
                    approval_threshold, manual_gold, manual_silver, manual_platinum
             FROM store_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some(ref r) => row_to_settings(r),
            None => {
                let defaults = StoreSettings::default();
                self.write(&defaults).await?;
                Ok(defaults)
            }
        }
    }

    async fn update(&self, patch: SettingsPatch) -> Result<StoreSettings, StoreError> {
        let mut settings = self.load().await?;
        patch.apply_to(&mut settings);
        self.write(&settings).await?;
        Ok(settings)
    }

    async fn owner_context(&self) -> Result<OwnerContext, StoreError> {
        let row = sqlx::query("SELECT customer_id, request_id FROM owner_context WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        let Some(row) = row else {
            return Ok(OwnerContext::default());
        };

        let customer_id: Option<String> =
            row.try_get("customer_id").map_err(|e| decode_error(e.to_string()))?;
        let request_id: Option<String> =
            row.try_get("request_id").map_err(|e| decode_error(e.to_string()))?;

        Ok(OwnerContext {
            customer: customer_id.map(CustomerId),
            request_id: request_id.map(ApprovalId),
        })
    }

    async fn set_owner_context(&self, context: OwnerContext) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO owner_context (id, customer_id, request_id, updated_at)
             VALUES (1, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 customer_id = excluded.customer_id,
                 request_id = excluded.request_id,
                 updated_at = excluded.updated_at",
        )
        .bind(context.customer.map(|c| c.0))
        .bind(context.request_id.map(|r| r.0))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }
}
