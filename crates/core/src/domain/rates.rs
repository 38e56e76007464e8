use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metal {
    Gold,
    Silver,
    Platinum,
}

impl Metal {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gold => "Gold",
            Self::Silver => "Silver",
            Self::Platinum => "Platinum",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Platinum => "platinum",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "gold" => Some(Self::Gold),
            "silver" => Some(Self::Silver),
            "platinum" => Some(Self::Platinum),
            _ => None,
        }
    }
}

/// Which path produced a snapshot: a live external fetch, an operator manual
/// override layered on top of a fetch, or the hardcoded safe constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    Live,
    Manual,
    Fallback,
}

impl RateOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Manual => "manual",
            Self::Fallback => "fallback",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "live" => Some(Self::Live),
            "manual" => Some(Self::Manual),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }
}

/// Per-gram prices for all supported metals. Shared across customers and
/// replaced wholesale on every refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub gold: Decimal,
    pub silver: Decimal,
    pub platinum: Decimal,
    pub source: RateOrigin,
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Safe constants used when no fetch has ever succeeded.
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            gold: Decimal::from(7000),
            silver: Decimal::from(90),
            platinum: Decimal::from(3500),
            source: RateOrigin::Fallback,
            fetched_at: now,
        }
    }

    pub fn per_gram(&self, metal: Metal) -> Decimal {
        match metal {
            Metal::Gold => self.gold,
            Metal::Silver => self.silver,
            Metal::Platinum => self.platinum,
        }
    }
}

/// Port implemented by the rate service; the state machine orchestration only
/// sees this trait, so tests can substitute fixed rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Never fails: every failure mode resolves to a fallback snapshot.
    async fn get_rates(&self) -> RateSnapshot;
}

/// Fixed-rate provider for tests and the no-credential dev mode.
pub struct FixedRateProvider(pub RateSnapshot);

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn get_rates(&self) -> RateSnapshot {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{Metal, RateOrigin, RateSnapshot};

    #[test]
    fn fallback_snapshot_carries_fallback_origin() {
        let snapshot = RateSnapshot::fallback(Utc::now());
        assert_eq!(snapshot.source, RateOrigin::Fallback);
        assert_eq!(snapshot.per_gram(Metal::Gold), Decimal::from(7000));
        assert_eq!(snapshot.per_gram(Metal::Silver), Decimal::from(90));
        assert_eq!(snapshot.per_gram(Metal::Platinum), Decimal::from(3500));
    }

    #[test]
    fn origin_round_trips_through_storage_form() {
        for origin in [RateOrigin::Live, RateOrigin::Manual, RateOrigin::Fallback] {
            assert_eq!(RateOrigin::parse(origin.as_str()), Some(origin));
        }
    }
}
