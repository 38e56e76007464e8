use sqlx::Row;

use aurum_core::domain::session::{BuyFlow, CustomerId, FlowStep, ItemCategory, Session, SessionMode};
use aurum_core::domain::rates::Metal;
use aurum_core::store::{SessionStore, StoreError};

use super::{backend_error, decode_error, parse_datetime, parse_optional_decimal};
use crate::DbPool;

pub struct SqlSessionStore {
    pool: DbPool,
}

impl SqlSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session, StoreError> {
    let customer_id: String =
        row.try_get("customer_id").map_err(|e| decode_error(e.to_string()))?;
    let step_str: String = row.try_get("step").map_err(|e| decode_error(e.to_string()))?;
    let mode_str: String = row.try_get("mode").map_err(|e| decode_error(e.to_string()))?;
    let buy_metal: Option<String> =
        row.try_get("buy_metal").map_err(|e| decode_error(e.to_string()))?;
    let buy_item: Option<String> =
        row.try_get("buy_item").map_err(|e| decode_error(e.to_string()))?;
    let buy_grams: Option<String> =
        row.try_get("buy_grams").map_err(|e| decode_error(e.to_string()))?;
    let buy_budget: Option<String> =
        row.try_get("buy_budget").map_err(|e| decode_error(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| decode_error(e.to_string()))?;

    let step = FlowStep::parse(&step_str)
        .ok_or_else(|| decode_error(format!("unknown flow step `{step_str}`")))?;
    let mode = SessionMode::parse(&mode_str)
        .ok_or_else(|| decode_error(format!("unknown session mode `{mode_str}`")))?;

    Ok(Session {
        customer: CustomerId(customer_id),
        step,
        mode,
        buy_flow: BuyFlow {
            metal: buy_metal.as_deref().and_then(Metal::parse),
            item_type: buy_item.as_deref().and_then(ItemCategory::parse),
            grams: parse_optional_decimal("buy_grams", buy_grams)?,
            budget: buy_budget,
        },
        updated_at: parse_datetime(&updated_at_str),
    })
}

#[async_trait::async_trait]
impl SessionStore for SqlSessionStore {
    async fn find(&self, customer: &CustomerId) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            "SELECT customer_id, step, mode, buy_metal, buy_item, buy_grams, buy_budget, updated_at
             FROM session WHERE customer_id = ?",
        )
        .bind(&customer.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some(ref r) => Ok(Some(row_to_session(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: Session) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO session (customer_id, step, mode, buy_metal, buy_item, buy_grams, buy_budget, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(customer_id) DO UPDATE SET
                 step = excluded.step,
                 mode = excluded.mode,
                 buy_metal = excluded.buy_metal,
                 buy_item = excluded.buy_item,
                 buy_grams = excluded.buy_grams,
                 buy_budget = excluded.buy_budget,
                 updated_at = excluded.updated_at",
        )
        .bind(&session.customer.0)
        .bind(session.step.as_str())
        .bind(session.mode.as_str())
        .bind(session.buy_flow.metal.map(|m| m.as_str()))
        .bind(session.buy_flow.item_type.map(|i| i.as_str()))
        .bind(session.buy_flow.grams.map(|g| g.to_string()))
        .bind(&session.buy_flow.budget)
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use aurum_core::domain::rates::Metal;
    use aurum_core::domain::session::{
        BuyFlow, CustomerId, FlowStep, ItemCategory, Session, SessionMode,
    };
    use aurum_core::store::SessionStore;

    use super::SqlSessionStore;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn missing_customer_yields_none() {
        let store = SqlSessionStore::new(setup().await);
        let found =
            store.find(&CustomerId("whatsapp:+910000000000".to_string())).await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn buy_flow_round_trips_exactly() {
        let store = SqlSessionStore::new(setup().await);
        let customer = CustomerId("whatsapp:+919000000001".to_string());

        let session = Session {
            customer: customer.clone(),
            step: FlowStep::BuyBudget,
            mode: SessionMode::Bot,
            buy_flow: BuyFlow {
                metal: Some(Metal::Gold),
                item_type: Some(ItemCategory::Ring),
                grams: Some(Decimal::from(10)),
                budget: Some("20000".to_string()),
            },
            updated_at: Utc::now(),
        };

        store.save(session.clone()).await.expect("save");
        let reloaded = store.find(&customer).await.expect("find").expect("session exists");

        assert_eq!(reloaded.buy_flow, session.buy_flow);
        assert_eq!(reloaded.step, FlowStep::BuyBudget);
        assert_eq!(reloaded.mode, SessionMode::Bot);
    }

    #[tokio::test]
    async fn save_upserts_on_conflict() {
        let store = SqlSessionStore::new(setup().await);
        let customer = CustomerId("whatsapp:+919000000002".to_string());

        let mut session = Session::new(customer.clone(), Utc::now());
        store.save(session.clone()).await.expect("first save");

        session.step = FlowStep::Menu;
        session.mode = SessionMode::Agent;
        store.save(session).await.expect("second save");

        let reloaded = store.find(&customer).await.expect("find").expect("session exists");
        assert_eq!(reloaded.step, FlowStep::Menu);
        assert_eq!(reloaded.mode, SessionMode::Agent);
    }
}
