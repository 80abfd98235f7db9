mod api;
pub mod commands;
mod config;
mod counters;
mod feed;
mod models;
mod notify;
mod relevance;
mod scheduler;
mod storage;
mod user;
mod utils;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Result;

pub use api::{DetectionApi, HttpDetectionApi};
pub use config::EngineConfig;
pub use counters::{CounterCheck, CounterSnapshotTracker};
pub use feed::DetectionFeedClient;
pub use models::{
    AnimalCounts, AnimalType, Classification, DeltaEvent, DetectionEvent, DetectionSnapshot,
    NotificationScope, UserProfile, UserSession,
};
pub use notify::{LogNotifier, NotificationDispatcher, NotificationPayload, Notifier};
pub use relevance::{NamingConventionFilter, RelevanceFilter};
pub use scheduler::{
    BackgroundCallback, BackgroundFetchResult, BackgroundTaskOptions, BackgroundTaskRuntime,
    CheckEngine, CheckOutcome, CheckReport, CheckSummary, PollingScheduler, PollingStatus,
    TokioBackgroundRuntime,
};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use user::UserContextStore;

/// Everything the UI layer talks to, constructed once per process.
pub struct AppState {
    pub(crate) scheduler: PollingScheduler,
    pub(crate) users: Arc<UserContextStore>,
    pub(crate) tracker: Option<Arc<CounterSnapshotTracker>>,
}

impl AppState {
    /// Wires the engine from its external collaborators.
    pub fn new(
        config: &EngineConfig,
        api: Arc<dyn DetectionApi>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        background: Arc<dyn BackgroundTaskRuntime>,
    ) -> Self {
        Self::with_filter(
            config,
            api,
            store,
            notifier,
            background,
            Arc::new(NamingConventionFilter),
        )
    }

    /// Like [`AppState::new`] with a custom relevance strategy.
    pub fn with_filter(
        config: &EngineConfig,
        api: Arc<dyn DetectionApi>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        background: Arc<dyn BackgroundTaskRuntime>,
        filter: Arc<dyn RelevanceFilter>,
    ) -> Self {
        let users = Arc::new(UserContextStore::new(store.clone()));
        let tracker = config
            .counter_tracking
            .then(|| Arc::new(CounterSnapshotTracker::new(api.clone(), store)));

        let engine = Arc::new(CheckEngine::new(
            DetectionFeedClient::new(api),
            users.clone(),
            filter,
            NotificationDispatcher::new(notifier),
            tracker.clone(),
            config.check_timeout,
        ));

        let scheduler = PollingScheduler::new(
            engine,
            background,
            config.poll_interval,
            config.background_interval,
        );

        Self {
            scheduler,
            users,
            tracker,
        }
    }

    pub fn scheduler(&self) -> &PollingScheduler {
        &self.scheduler
    }

    pub fn users(&self) -> &UserContextStore {
        &self.users
    }
}

/// Headless entry point: SQLite storage, HTTP API, log notifications and
/// the tokio background runtime, polling until Ctrl-C.
pub async fn run() -> Result<()> {
    let config = EngineConfig::from_env();
    utils::logging::init(config.debug);

    log::info!("StraySafe detection engine starting up...");

    let store = Arc::new(SqliteStore::open(config.database_path())?);
    let api = Arc::new(HttpDetectionApi::from_config(&config)?);
    let state = AppState::new(
        &config,
        api,
        store,
        Arc::new(LogNotifier),
        Arc::new(TokioBackgroundRuntime::new()),
    );

    commands::initialize(&state)
        .await
        .map_err(anyhow::Error::msg)?;
    commands::register_background_task(&state)
        .await
        .map_err(anyhow::Error::msg)?;

    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown requested");

    commands::unregister_background_task(&state)
        .await
        .map_err(anyhow::Error::msg)?;
    Ok(())
}
