use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::fetch::{FetchedRates, RateFetchError, RateFetcher};

const OUNCE_GRAMS: &str = "31.1035";
const GOLD_22K_FACTOR: &str = "0.916";

/// goldapi.io-style provider: one authenticated JSON request per metal
/// symbol. Gold is priced at 22K; silver and platinum at standard purity.
pub struct HttpRateFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct SymbolResponse {
    #[serde(default)]
    price_gram_22k: Option<Decimal>,
    #[serde(default)]
    price_gram_24k: Option<Decimal>,
    #[serde(default)]
    price: Option<Decimal>,
}

impl HttpRateFetcher {
    pub fn new(base_url: String, api_key: SecretString, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .unwrap_or_default();
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key }
    }

    async fn symbol(&self, symbol: &str) -> Result<SymbolResponse, RateFetchError> {
        let url = format!("{}/{symbol}/INR", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-access-token", self.api_key.expose_secret())
            .send()
            .await
            .map_err(|error| RateFetchError::Http(error.to_string()))?;

        if !response.status().is_success() {
            return Err(RateFetchError::Http(format!(
                "`{url}` answered with status {}",
                response.status()
            )));
        }

        response.json::<SymbolResponse>().await.map_err(|error| RateFetchError::Parse(error.to_string()))
    }
}

fn ounce_to_gram(price_per_ounce: Decimal) -> Decimal {
    price_per_ounce / OUNCE_GRAMS.parse::<Decimal>().unwrap_or(Decimal::ONE)
}

fn gold_per_gram(response: &SymbolResponse) -> Option<Decimal> {
    response.price_gram_22k.or_else(|| {
        response
            .price
            .map(|per_ounce| ounce_to_gram(per_ounce) * GOLD_22K_FACTOR.parse::<Decimal>().unwrap_or(Decimal::ONE))
    })
}

fn standard_per_gram(response: &SymbolResponse) -> Option<Decimal> {
    response.price_gram_24k.or_else(|| response.price.map(ounce_to_gram))
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    async fn fetch(&self) -> Result<FetchedRates, RateFetchError> {
        let (gold, silver, platinum) =
            tokio::join!(self.symbol("XAU"), self.symbol("XAG"), self.symbol("XPT"));

        let gold = gold?;
        let gold = gold_per_gram(&gold)
            .ok_or_else(|| RateFetchError::Parse("gold response held no usable price".to_string()))?;

        // Silver/platinum endpoint trouble degrades to the fallback constants
        // instead of failing the whole fetch.
        let silver = silver.ok().as_ref().and_then(standard_per_gram);
        let platinum = platinum.ok().as_ref().and_then(standard_per_gram);

        Ok(FetchedRates { gold, silver, platinum })
    }
}
