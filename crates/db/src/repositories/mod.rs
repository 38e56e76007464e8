use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use aurum_core::store::StoreError;

pub mod approval;
pub mod customer;
pub mod memory;
pub mod message;
pub mod session;
pub mod settings;

pub use approval::SqlApprovalStore;
pub use customer::SqlCustomerStore;
pub use memory::{
    InMemoryApprovalStore, InMemoryCustomerStore, InMemoryMessageStore, InMemorySessionStore,
    InMemorySettingsStore,
};
pub use message::SqlMessageStore;
pub use session::SqlSessionStore;
pub use settings::SqlSettingsStore;

pub(crate) fn backend_error(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

pub(crate) fn decode_error(message: impl Into<String>) -> StoreError {
    StoreError::Decode(message.into())
}

/// Timestamps are stored as RFC 3339 text; a malformed value degrades to
/// "now" rather than poisoning the whole row.
pub(crate) fn parse_datetime(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn parse_optional_datetime(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(&value).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, StoreError> {
    raw.parse::<Decimal>()
        .map_err(|_| decode_error(format!("column `{column}` holds a non-decimal value: `{raw}`")))
}

pub(crate) fn parse_optional_decimal(
    column: &str,
    raw: Option<String>,
) -> Result<Option<Decimal>, StoreError> {
    raw.map(|value| parse_decimal(column, &value)).transpose()
}
