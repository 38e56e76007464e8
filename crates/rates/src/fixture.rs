use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::fetch::{FetchedRates, RateFetchError, RateFetcher};

/// Deterministic rates for tests and credential-free dev runs.
pub struct StaticRateFetcher {
    rates: FetchedRates,
}

impl StaticRateFetcher {
    pub fn new(gold: Decimal, silver: Decimal, platinum: Decimal) -> Self {
        Self { rates: FetchedRates { gold, silver: Some(silver), platinum: Some(platinum) } }
    }
}

impl Default for StaticRateFetcher {
    fn default() -> Self {
        Self::new(Decimal::from(7000), Decimal::from(90), Decimal::from(3500))
    }
}

#[async_trait]
impl RateFetcher for StaticRateFetcher {
    async fn fetch(&self) -> Result<FetchedRates, RateFetchError> {
        Ok(self.rates.clone())
    }
}
