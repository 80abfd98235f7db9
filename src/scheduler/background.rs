use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::{
    sync::Mutex,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::CheckSummary;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// What a background invocation tells the OS about its work.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BackgroundFetchResult {
    NoData,
    NewData,
    Failed,
}

impl From<&CheckSummary> for BackgroundFetchResult {
    fn from(summary: &CheckSummary) -> Self {
        if !summary.success {
            BackgroundFetchResult::Failed
        } else if summary.notified {
            BackgroundFetchResult::NewData
        } else {
            BackgroundFetchResult::NoData
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundTaskOptions {
    /// A hint; the platform may run the task less often.
    pub minimum_interval: Duration,
    pub stop_on_terminate: bool,
    pub start_on_boot: bool,
}

impl BackgroundTaskOptions {
    pub fn with_interval(minimum_interval: Duration) -> Self {
        Self {
            minimum_interval,
            stop_on_terminate: false,
            start_on_boot: true,
        }
    }
}

pub type BackgroundFuture = Pin<Box<dyn Future<Output = BackgroundFetchResult> + Send>>;
pub type BackgroundCallback = Arc<dyn Fn() -> BackgroundFuture + Send + Sync>;

/// The platform's background-execution capability.
#[async_trait]
pub trait BackgroundTaskRuntime: Send + Sync {
    async fn register(
        &self,
        task_id: &str,
        options: BackgroundTaskOptions,
        callback: BackgroundCallback,
    ) -> Result<()>;
    async fn unregister(&self, task_id: &str) -> Result<()>;
    async fn is_registered(&self, task_id: &str) -> Result<bool>;
}

/// In-process stand-in for the OS scheduler: one tokio task per registered
/// id, invoking the callback every `minimum_interval`.
#[derive(Default)]
pub struct TokioBackgroundRuntime {
    tasks: Mutex<HashMap<String, CancellationToken>>,
}

impl TokioBackgroundRuntime {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackgroundTaskRuntime for TokioBackgroundRuntime {
    async fn register(
        &self,
        task_id: &str,
        options: BackgroundTaskOptions,
        callback: BackgroundCallback,
    ) -> Result<()> {
        let token = CancellationToken::new();
        if let Some(previous) = self
            .tasks
            .lock()
            .await
            .insert(task_id.to_string(), token.clone())
        {
            previous.cancel();
        }

        let task_id = task_id.to_string();
        let period = options.minimum_interval;
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let result = callback().await;
                        log_debug!("background task {task_id} finished with {result:?}");
                    }
                    _ = token.cancelled() => {
                        log_info!("background task {task_id} shutting down");
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    async fn unregister(&self, task_id: &str) -> Result<()> {
        if let Some(token) = self.tasks.lock().await.remove(task_id) {
            token.cancel();
        }
        Ok(())
    }

    async fn is_registered(&self, task_id: &str) -> Result<bool> {
        Ok(self.tasks.lock().await.contains_key(task_id))
    }
}

impl Drop for TokioBackgroundRuntime {
    fn drop(&mut self) {
        for token in self.tasks.get_mut().values() {
            token.cancel();
        }
    }
}
