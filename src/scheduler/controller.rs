use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    sync::Mutex,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::config::BACKGROUND_TASK_ID;

use super::{
    background::{
        BackgroundCallback, BackgroundFetchResult, BackgroundFuture, BackgroundTaskOptions,
    },
    BackgroundTaskRuntime, CheckEngine, CheckSummary, PollingStatus,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Drives periodic checks: a foreground repeating timer and a registration
/// with the platform's background runtime. The two are independent; either,
/// both or neither may be active.
#[derive(Clone)]
pub struct PollingScheduler {
    engine: Arc<CheckEngine>,
    background: Arc<dyn BackgroundTaskRuntime>,
    /// Cancels the live foreground timer. At most one exists.
    ticker: Arc<Mutex<Option<CancellationToken>>>,
    poll_interval: Duration,
    background_interval: Duration,
}

impl PollingScheduler {
    pub fn new(
        engine: Arc<CheckEngine>,
        background: Arc<dyn BackgroundTaskRuntime>,
        poll_interval: Duration,
        background_interval: Duration,
    ) -> Self {
        Self {
            engine,
            background,
            ticker: Arc::new(Mutex::new(None)),
            poll_interval,
            background_interval,
        }
    }

    /// Starts (or restarts) foreground polling and runs one check right away
    /// instead of waiting a full interval.
    pub async fn start(&self) -> CheckSummary {
        self.spawn_ticker().await;
        log_info!(
            "Detection polling started ({}s interval)",
            self.poll_interval.as_secs()
        );
        self.run_one_check().await
    }

    /// Stops foreground polling. A check already running is left to finish.
    pub async fn stop(&self) {
        if let Some(token) = self.ticker.lock().await.take() {
            token.cancel();
            log_info!("Detection polling stopped");
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.ticker.lock().await.is_some()
    }

    pub async fn status(&self) -> PollingStatus {
        let is_background_registered =
            match self.background.is_registered(BACKGROUND_TASK_ID).await {
                Ok(registered) => registered,
                Err(err) => {
                    log_warn!("Could not query background task status: {err:#}");
                    false
                }
            };

        PollingStatus {
            is_background_registered,
            is_polling: self.is_polling().await,
        }
    }

    /// Registers the background task, establishes the counter baseline and
    /// starts foreground polling as well, which is more reliable while the
    /// app is active.
    pub async fn register_background_task(&self) -> Result<CheckSummary> {
        self.background
            .register(
                BACKGROUND_TASK_ID,
                BackgroundTaskOptions::with_interval(self.background_interval),
                self.background_callback(),
            )
            .await
            .context("failed to register background task")?;
        log_info!("Background detection task registered");

        if let Some(tracker) = self.engine.tracker() {
            tracker.initialize().await;
        }

        Ok(self.start().await)
    }

    /// Unregisters the background task and stops foreground polling. Polling
    /// is stopped even when the platform refuses the unregistration.
    pub async fn unregister_background_task(&self) -> Result<()> {
        let result = self
            .background
            .unregister(BACKGROUND_TASK_ID)
            .await
            .context("failed to unregister background task");
        self.stop().await;
        result?;
        log_info!("Background detection task unregistered");
        Ok(())
    }

    pub async fn run_one_check(&self) -> CheckSummary {
        self.engine.run_one_check().await
    }

    fn background_callback(&self) -> BackgroundCallback {
        let engine = self.engine.clone();
        Arc::new(move || -> BackgroundFuture {
            let engine = engine.clone();
            Box::pin(async move {
                let summary = engine.run_one_check().await;
                BackgroundFetchResult::from(&summary)
            })
        })
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(previous) = ticker_guard.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let engine = self.engine.clone();
        let period = self.poll_interval;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        log_debug!("Checking for detections ({}s interval)", period.as_secs());
                        engine.run_one_check().await;
                    }
                    _ = cancelled.cancelled() => break,
                }
            }
        });

        *ticker_guard = Some(token);
    }
}
