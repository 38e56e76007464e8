use sqlx::Row;

use aurum_core::domain::message::MessageRecord;
use aurum_core::domain::session::CustomerId;
use aurum_core::store::{MessageStore, StoreError};

use super::{backend_error, decode_error, parse_datetime};
use crate::DbPool;

pub struct SqlMessageStore {
    pool: DbPool,
}

impl SqlMessageStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<MessageRecord, StoreError> {
    let sender: String = row.try_get("sender").map_err(|e| decode_error(e.to_string()))?;
    let recipient: String = row.try_get("recipient").map_err(|e| decode_error(e.to_string()))?;
    let body: String = row.try_get("body").map_err(|e| decode_error(e.to_string()))?;
    let sent_at: String = row.try_get("sent_at").map_err(|e| decode_error(e.to_string()))?;

    Ok(MessageRecord { sender, recipient, body, sent_at: parse_datetime(&sent_at) })
}

#[async_trait::async_trait]
impl MessageStore for SqlMessageStore {
    async fn append(&self, message: MessageRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO message (sender, recipient, body, sent_at) VALUES (?, ?, ?, ?)")
            .bind(&message.sender)
            .bind(&message.recipient)
            .bind(&message.body)
            .bind(message.sent_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn history_for(
        &self,
        customer: &CustomerId,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT sender, recipient, body, sent_at FROM message
             WHERE sender = ? OR recipient = ?
             ORDER BY sent_at ASC, id ASC
             LIMIT ?",
        )
        .bind(&customer.0)
        .bind(&customer.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        rows.iter().map(row_to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use aurum_core::domain::message::MessageRecord;
    use aurum_core::domain::session::CustomerId;
    use aurum_core::store::MessageStore;

    use super::SqlMessageStore;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlMessageStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlMessageStore::new(pool)
    }

    #[tokio::test]
    async fn history_covers_both_directions_in_order() {
        let store = setup().await;
        let customer = "whatsapp:+919000000001";
        let base = Utc::now();

        store
            .append(MessageRecord::inbound(customer, "hi", base))
            .await
            .expect("append inbound");
        store
            .append(MessageRecord::from_bot(customer, "welcome", base + chrono::Duration::seconds(1)))
            .await
            .expect("append bot reply");
        store
            .append(MessageRecord::inbound("whatsapp:+918000000000", "unrelated", base))
            .await
            .expect("append other customer");

        let history = store
            .history_for(&CustomerId(customer.to_string()), 100)
            .await
            .expect("history");

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].body, "hi");
        assert_eq!(history[1].body, "welcome");
        assert_eq!(history[1].sender, "bot");
    }
}
