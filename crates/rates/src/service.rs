use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::warn;

use aurum_core::clock::Clock;
use aurum_core::domain::rates::{RateOrigin, RateProvider, RateSnapshot};
use aurum_core::domain::settings::ManualRates;
use aurum_core::store::SettingsStore;

use crate::fetch::RateFetcher;

/// Cached rate source with manual override and multi-level fallback.
///
/// Within the cache window the stored snapshot is returned with no external
/// call. On expiry the fetcher runs; a failure falls back to the previous
/// snapshot if one exists (keeping its source tag), else to the hardcoded
/// safe constants. After a successful fetch any operator manual rate > 0
/// replaces the fetched value and tags the snapshot `manual`.
pub struct RateService {
    fetcher: Arc<dyn RateFetcher>,
    clock: Arc<dyn Clock>,
    settings: Arc<dyn SettingsStore>,
    ttl: Duration,
    cache: Mutex<Option<RateSnapshot>>,
}

impl RateService {
    pub fn new(
        fetcher: Arc<dyn RateFetcher>,
        clock: Arc<dyn Clock>,
        settings: Arc<dyn SettingsStore>,
        cache_secs: u64,
    ) -> Self {
        Self {
            fetcher,
            clock,
            settings,
            ttl: Duration::seconds(cache_secs.max(1) as i64),
            cache: Mutex::new(None),
        }
    }

    async fn manual_rates(&self) -> ManualRates {
        match self.settings.load().await {
            Ok(settings) => settings.manual_rates,
            Err(error) => {
                // Transient settings trouble means no overrides this round.
                warn!(error = %error, "could not load manual rates; using fetched values");
                ManualRates::default()
            }
        }
    }

    async fn refresh(&self, now: DateTime<Utc>) -> Result<RateSnapshot, ()> {
        let fetched = self.fetcher.fetch().await.map_err(|error| {
            warn!(error = %error, "rate fetch failed");
        })?;

        let defaults = RateSnapshot::fallback(now);
        let mut snapshot = RateSnapshot {
            gold: fetched.gold,
            silver: fetched.silver.unwrap_or(defaults.silver),
            platinum: fetched.platinum.unwrap_or(defaults.platinum),
            source: RateOrigin::Live,
            fetched_at: now,
        };

        let manual = self.manual_rates().await;
        if manual.gold > Decimal::ZERO {
            snapshot.gold = manual.gold;
            snapshot.source = RateOrigin::Manual;
        }
        if manual.silver > Decimal::ZERO {
            snapshot.silver = manual.silver;
            snapshot.source = RateOrigin::Manual;
        }
        if manual.platinum > Decimal::ZERO {
            snapshot.platinum = manual.platinum;
            snapshot.source = RateOrigin::Manual;
        }

        Ok(snapshot)
    }
}

#[async_trait]
impl RateProvider for RateService {
    async fn get_rates(&self) -> RateSnapshot {
        let now = self.clock.now();
        let mut cache = self.cache.lock().await;

        if let Some(snapshot) = cache.as_ref() {
            if now - snapshot.fetched_at < self.ttl {
                return snapshot.clone();
            }
        }

        match self.refresh(now).await {
            Ok(snapshot) => {
                *cache = Some(snapshot.clone());
                snapshot
            }
            // Stale snapshot beats constants; constants beat nothing. The
            // stale copy keeps its timestamp so the next call retries.
            Err(()) => match cache.as_ref() {
                Some(previous) => previous.clone(),
                None => RateSnapshot::fallback(now),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::sync::Mutex as StdMutex;

    use aurum_core::domain::rates::{RateOrigin, RateProvider};
    use aurum_core::domain::settings::{OwnerContext, SettingsPatch, StoreSettings};
    use aurum_core::store::{SettingsStore, StoreError};
    use aurum_db::repositories::InMemorySettingsStore;

    use aurum_core::clock::Clock;

    use crate::fetch::{FetchedRates, RateFetchError, RateFetcher};

    use super::RateService;

    struct ManualClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self { now: StdMutex::new(now) })
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().expect("clock lock");
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().expect("clock lock")
        }
    }

    struct ScriptedFetcher {
        script: StdMutex<VecDeque<Result<FetchedRates, RateFetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<FetchedRates, RateFetchError>>) -> Arc<Self> {
            Arc::new(Self { script: StdMutex::new(script.into()), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateFetcher for ScriptedFetcher {
        async fn fetch(&self) -> Result<FetchedRates, RateFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or(Err(RateFetchError::Failed("script exhausted".to_string())))
        }
    }

    struct FailingSettingsStore;

    #[async_trait]
    impl SettingsStore for FailingSettingsStore {
        async fn load(&self) -> Result<StoreSettings, StoreError> {
            Err(StoreError::Backend("settings unavailable".to_string()))
        }

        async fn update(&self, _patch: SettingsPatch) -> Result<StoreSettings, StoreError> {
            Err(StoreError::Backend("settings unavailable".to_string()))
        }

        async fn owner_context(&self) -> Result<OwnerContext, StoreError> {
            Ok(OwnerContext::default())
        }

        async fn set_owner_context(&self, _context: OwnerContext) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).single().expect("timestamp")
    }

    fn live(gold: i64) -> Result<FetchedRates, RateFetchError> {
        Ok(FetchedRates {
            gold: Decimal::from(gold),
            silver: Some(Decimal::from(92)),
            platinum: Some(Decimal::from(3400)),
        })
    }

    #[tokio::test]
    async fn cached_snapshot_is_served_without_refetch() {
        let clock = ManualClock::starting_at(start());
        let fetcher = ScriptedFetcher::new(vec![live(7100), live(7200)]);
        let service = RateService::new(
            fetcher.clone(),
            clock.clone(),
            Arc::new(InMemorySettingsStore::default()),
            60,
        );

        let first = service.get_rates().await;
        clock.advance(Duration::seconds(30));
        let second = service.get_rates().await;

        assert_eq!(first.gold, Decimal::from(7100));
        assert_eq!(second, first);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn expiry_triggers_a_fresh_fetch() {
        let clock = ManualClock::starting_at(start());
        let fetcher = ScriptedFetcher::new(vec![live(7100), live(7200)]);
        let service = RateService::new(
            fetcher.clone(),
            clock.clone(),
            Arc::new(InMemorySettingsStore::default()),
            60,
        );

        let first = service.get_rates().await;
        clock.advance(Duration::seconds(61));
        let second = service.get_rates().await;

        assert_eq!(first.gold, Decimal::from(7100));
        assert_eq!(second.gold, Decimal::from(7200));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_falls_back_to_previous_snapshot() {
        let clock = ManualClock::starting_at(start());
        let fetcher = ScriptedFetcher::new(vec![
            live(7100),
            Err(RateFetchError::Failed("provider down".to_string())),
        ]);
        let service = RateService::new(
            fetcher.clone(),
            clock.clone(),
            Arc::new(InMemorySettingsStore::default()),
            60,
        );

        let first = service.get_rates().await;
        clock.advance(Duration::seconds(120));
        let second = service.get_rates().await;

        assert_eq!(second.gold, first.gold);
        assert_eq!(second.source, RateOrigin::Live);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_without_cache_yields_safe_constants() {
        let clock = ManualClock::starting_at(start());
        let fetcher =
            ScriptedFetcher::new(vec![Err(RateFetchError::Failed("provider down".to_string()))]);
        let service = RateService::new(
            fetcher,
            clock,
            Arc::new(InMemorySettingsStore::default()),
            60,
        );

        let snapshot = service.get_rates().await;

        assert_eq!(snapshot.source, RateOrigin::Fallback);
        assert_eq!(snapshot.gold, Decimal::from(7000));
        assert_eq!(snapshot.silver, Decimal::from(90));
        assert_eq!(snapshot.platinum, Decimal::from(3500));
    }

    #[tokio::test]
    async fn fallback_is_not_cached_so_next_call_retries() {
        let clock = ManualClock::starting_at(start());
        let fetcher = ScriptedFetcher::new(vec![
            Err(RateFetchError::Failed("provider down".to_string())),
            live(7100),
        ]);
        let service = RateService::new(
            fetcher.clone(),
            clock,
            Arc::new(InMemorySettingsStore::default()),
            60,
        );

        let first = service.get_rates().await;
        let second = service.get_rates().await;

        assert_eq!(first.source, RateOrigin::Fallback);
        assert_eq!(second.source, RateOrigin::Live);
        assert_eq!(second.gold, Decimal::from(7100));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn manual_override_replaces_fetched_value_and_tags_manual() {
        let clock = ManualClock::starting_at(start());
        let fetcher = ScriptedFetcher::new(vec![live(7100)]);
        let settings = Arc::new(InMemorySettingsStore::with_settings(StoreSettings {
            manual_rates: aurum_core::domain::settings::ManualRates {
                gold: Decimal::from(7800),
                ..Default::default()
            },
            ..StoreSettings::default()
        }));
        let service = RateService::new(fetcher, clock, settings, 60);

        let snapshot = service.get_rates().await;

        assert_eq!(snapshot.gold, Decimal::from(7800));
        assert_eq!(snapshot.silver, Decimal::from(92), "non-overridden metals keep fetched rates");
        assert_eq!(snapshot.source, RateOrigin::Manual);
    }

    #[tokio::test]
    async fn settings_read_failure_skips_overrides() {
        let clock = ManualClock::starting_at(start());
        let fetcher = ScriptedFetcher::new(vec![live(7100)]);
        let service = RateService::new(fetcher, clock, Arc::new(FailingSettingsStore), 60);

        let snapshot = service.get_rates().await;

        assert_eq!(snapshot.gold, Decimal::from(7100));
        assert_eq!(snapshot.source, RateOrigin::Live);
    }

    #[tokio::test]
    async fn missing_metals_default_to_safe_constants() {
        let clock = ManualClock::starting_at(start());
        let fetcher = ScriptedFetcher::new(vec![Ok(FetchedRates {
            gold: Decimal::from(7100),
            silver: None,
            platinum: None,
        })]);
        let service = RateService::new(
            fetcher,
            clock,
            Arc::new(InMemorySettingsStore::default()),
            60,
        );

        let snapshot = service.get_rates().await;

        assert_eq!(snapshot.silver, Decimal::from(90));
        assert_eq!(snapshot.platinum, Decimal::from(3500));
        assert_eq!(snapshot.source, RateOrigin::Live);
    }
}
