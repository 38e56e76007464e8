use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use aurum_core::channel::{MessageChannel, NoopMessageChannel};
use aurum_core::clock::{Clock, SystemClock};
use aurum_core::config::{AppConfig, ChannelProvider, ConfigError, LoadOptions, RateProviderKind};
use aurum_core::domain::rates::RateProvider;
use aurum_core::store::{ApprovalStore, CustomerStore, MessageStore, SessionStore, SettingsStore};
use aurum_db::repositories::{
    SqlApprovalStore, SqlCustomerStore, SqlMessageStore, SqlSessionStore, SqlSettingsStore,
};
use aurum_db::{connect_with_settings, migrations, DbPool};
use aurum_rates::{
    HttpRateFetcher, RateFetcher, RateService, StaticRateFetcher, SubprocessRateFetcher,
};
use aurum_whatsapp::approvals::ApprovalWorkflow;
use aurum_whatsapp::handoff::HandoffController;
use aurum_whatsapp::ledger::ActivityLedger;
use aurum_whatsapp::notify::OwnerNotifier;
use aurum_whatsapp::provider::RestMessageChannel;
use aurum_whatsapp::router::{RouterOptions, TurnRouter, TurnRouterDeps};

/// Everything the HTTP layer needs; cheap to clone into axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<TurnRouter>,
    pub sessions: Arc<dyn SessionStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub approvals: ApprovalWorkflow,
    pub ledger: ActivityLedger,
    pub handoff: HandoffController,
    pub rates: Arc<dyn RateProvider>,
    pub channel: Arc<dyn MessageChannel>,
    pub clock: Arc<dyn Clock>,
}

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let state = build_state(&config, db_pool.clone());
    Ok(Application { config, db_pool, state })
}

fn build_state(config: &AppConfig, db_pool: DbPool) -> AppState {
    let sessions: Arc<dyn SessionStore> = Arc::new(SqlSessionStore::new(db_pool.clone()));
    let customers: Arc<dyn CustomerStore> = Arc::new(SqlCustomerStore::new(db_pool.clone()));
    let approvals_store: Arc<dyn ApprovalStore> = Arc::new(SqlApprovalStore::new(db_pool.clone()));
    let messages: Arc<dyn MessageStore> = Arc::new(SqlMessageStore::new(db_pool.clone()));
    let settings: Arc<dyn SettingsStore> = Arc::new(SqlSettingsStore::new(db_pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let channel: Arc<dyn MessageChannel> = match config.channel.provider {
        ChannelProvider::Rest => Arc::new(RestMessageChannel::new(
            config.channel.account_sid.clone(),
            config.channel.auth_token.clone(),
            config.channel.sender_number.clone(),
            config.channel.api_base_url.clone(),
        )),
        ChannelProvider::Noop => Arc::new(NoopMessageChannel),
    };

    let fetcher: Arc<dyn RateFetcher> = match config.rates.provider {
        RateProviderKind::Subprocess => Arc::new(SubprocessRateFetcher::new(
            config.rates.fetch_program.clone(),
            config.rates.timeout_secs,
        )),
        RateProviderKind::Http => Arc::new(HttpRateFetcher::new(
            config.rates.base_url.clone().unwrap_or_default(),
            config.rates.api_key.clone().unwrap_or_else(|| String::new().into()),
            config.rates.timeout_secs,
        )),
        RateProviderKind::Static => Arc::new(StaticRateFetcher::default()),
    };
    let rates: Arc<dyn RateProvider> = Arc::new(RateService::new(
        fetcher,
        clock.clone(),
        settings.clone(),
        config.rates.cache_secs,
    ));

    let ledger = ActivityLedger::new(messages.clone(), customers.clone());
    let approvals = ApprovalWorkflow::new(approvals_store.clone());
    let notifier = OwnerNotifier::new(channel.clone(), settings.clone());
    let handoff = HandoffController::new(sessions.clone(), customers.clone(), notifier);

    let router = Arc::new(TurnRouter::new(
        TurnRouterDeps {
            sessions: sessions.clone(),
            customers: customers.clone(),
            approvals: approvals_store,
            messages,
            settings: settings.clone(),
            rates: rates.clone(),
            channel: channel.clone(),
            clock: clock.clone(),
        },
        RouterOptions {
            handoff_fail_open: config.bot.handoff_fail_open,
            ..RouterOptions::default()
        },
    ));

    AppState {
        router,
        sessions,
        customers,
        settings,
        approvals,
        ledger,
        handoff,
        rates,
        channel,
        clock,
    }
}
