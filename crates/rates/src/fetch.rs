use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Raw per-gram prices as produced by a fetcher. Gold is mandatory; the
/// other metals fall back to safe constants when a provider omits them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedRates {
    pub gold: Decimal,
    pub silver: Option<Decimal>,
    pub platinum: Option<Decimal>,
}

#[derive(Debug, Error)]
pub enum RateFetchError {
    #[error("fetch process could not be spawned: {0}")]
    Spawn(String),
    #[error("fetch process exited with status {0}")]
    NonZeroExit(String),
    #[error("fetch timed out after {0}s")]
    Timeout(u64),
    #[error("fetch output could not be parsed: {0}")]
    Parse(String),
    #[error("fetch reported failure status: {0}")]
    Failed(String),
    #[error("rate endpoint request failed: {0}")]
    Http(String),
}

#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self) -> Result<FetchedRates, RateFetchError>;
}

/// Wire shape of the fetch-subprocess contract: one JSON object with a
/// status tag and at least a gold-per-gram field.
#[derive(Debug, Deserialize)]
pub(crate) struct RatePayload {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub gold_gram_inr: Option<Decimal>,
    #[serde(default)]
    pub silver_gram_inr: Option<Decimal>,
    #[serde(default)]
    pub platinum_gram_inr: Option<Decimal>,
}

pub(crate) fn payload_to_rates(payload: RatePayload) -> Result<FetchedRates, RateFetchError> {
    if payload.status != "success" {
        let detail = payload.message.unwrap_or(payload.status);
        return Err(RateFetchError::Failed(detail));
    }
    let gold = payload
        .gold_gram_inr
        .ok_or_else(|| RateFetchError::Parse("missing gold_gram_inr field".to_string()))?;

    Ok(FetchedRates { gold, silver: payload.silver_gram_inr, platinum: payload.platinum_gram_inr })
}
