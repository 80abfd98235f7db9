use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    api::DetectionApi,
    models::{DeltaEvent, DetectionSnapshot},
    storage::{self, KeyValueStore},
};

use super::diff::{compute_deltas, merge_snapshot};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const COUNTER_STORAGE_KEY: &str = "stray_safe_detection_counters";

/// Result of one counter diff.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CounterCheck {
    pub has_new_detections: bool,
    pub detections: Vec<DeltaEvent>,
    pub all_counters: DetectionSnapshot,
}

/// Diffs successive count snapshots and remembers the last one across
/// restarts.
pub struct CounterSnapshotTracker {
    api: Arc<dyn DetectionApi>,
    store: Arc<dyn KeyValueStore>,
    /// `None` until loaded from storage or baselined in this process.
    last_known: Mutex<Option<DetectionSnapshot>>,
}

impl CounterSnapshotTracker {
    pub fn new(api: Arc<dyn DetectionApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store,
            last_known: Mutex::new(None),
        }
    }

    /// Loads the persisted snapshot, or on first run fetches the current
    /// counts and stores them as the baseline. Pre-existing counts never
    /// produce notifications.
    pub async fn initialize(&self) -> Option<DetectionSnapshot> {
        let mut last_known = self.last_known.lock().await;
        match self.load_saved().await {
            Ok(Some(saved)) => {
                *last_known = Some(saved.clone());
                Some(saved)
            }
            Ok(None) => self.fetch_baseline(&mut last_known).await,
            Err(err) => {
                log_error!("Error loading saved counters: {err:#}");
                None
            }
        }
    }

    /// Fetches the current counts. Failures are logged and reported as `None`.
    pub async fn fetch_counters(&self) -> Option<DetectionSnapshot> {
        match self.api.fetch_counters().await {
            Ok(counters) => Some(counters),
            Err(err) => {
                log_error!("Error fetching counters: {err:#}");
                None
            }
        }
    }

    /// Fetches the current counts and reports every increase since the last
    /// check, then records the new counts. Returns `None` when nothing could
    /// be fetched; the stored snapshot is left untouched in that case.
    pub async fn check_for_new_detections(&self) -> Option<CounterCheck> {
        let current = self.poll().await?;
        Some(self.record(current).await)
    }

    /// The network half of a check: counts to pass to [`Self::record`].
    ///
    /// Without a baseline in this process, loads the saved one, or fetches
    /// and stores a fresh one and returns it as-is so the diff comes out
    /// empty.
    pub async fn poll(&self) -> Option<DetectionSnapshot> {
        {
            let mut last_known = self.last_known.lock().await;
            if last_known.is_none() {
                match self.load_saved().await {
                    Ok(Some(saved)) => *last_known = Some(saved),
                    Ok(None) => return self.fetch_baseline(&mut last_known).await,
                    Err(err) => {
                        log_error!("Error loading saved counters: {err:#}");
                        return None;
                    }
                }
            }
        }

        self.fetch_counters().await
    }

    /// Diffs `current` against the last-known snapshot, merges it in and
    /// persists the result.
    pub async fn record(&self, current: DetectionSnapshot) -> CounterCheck {
        let mut last_known = self.last_known.lock().await;
        let snapshot = last_known.get_or_insert_with(DetectionSnapshot::new);
        let detections = compute_deltas(snapshot, &current);
        merge_snapshot(snapshot, &current);
        let persisted = snapshot.clone();
        drop(last_known);

        self.persist(&persisted).await;

        if !detections.is_empty() {
            log_info!(
                "Counter check found {} new detection(s) across {} source(s)",
                detections.len(),
                current.len()
            );
        }

        CounterCheck {
            has_new_detections: !detections.is_empty(),
            detections,
            all_counters: current,
        }
    }

    /// Forgets every recorded count. The next check reports all current
    /// counts as new. Memory is only cleared once storage is.
    pub async fn reset(&self) -> Result<()> {
        let mut last_known = self.last_known.lock().await;
        self.store.remove(COUNTER_STORAGE_KEY).await?;
        *last_known = Some(DetectionSnapshot::new());
        log_info!("Counter tracking reset");
        Ok(())
    }

    /// The last-known snapshot, if one has been loaded.
    pub async fn last_known(&self) -> Option<DetectionSnapshot> {
        self.last_known.lock().await.clone()
    }

    /// `Ok(None)` when nothing usable is saved.
    async fn load_saved(&self) -> Result<Option<DetectionSnapshot>> {
        match storage::get_json::<DetectionSnapshot>(self.store.as_ref(), COUNTER_STORAGE_KEY)
            .await?
        {
            Some(Ok(saved)) => {
                log_info!("Loaded saved counters for {} source(s)", saved.len());
                Ok(Some(saved))
            }
            Some(Err(err)) => {
                log_warn!("Discarding unreadable saved counters: {err}");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn fetch_baseline(
        &self,
        last_known: &mut Option<DetectionSnapshot>,
    ) -> Option<DetectionSnapshot> {
        let baseline = self.fetch_counters().await?;
        *last_known = Some(baseline.clone());
        self.persist(&baseline).await;
        log_info!("Initialized counter baseline with {} source(s)", baseline.len());
        Some(baseline)
    }

    async fn persist(&self, snapshot: &DetectionSnapshot) {
        if let Err(err) =
            storage::set_json(self.store.as_ref(), COUNTER_STORAGE_KEY, snapshot).await
        {
            log_error!("Error saving counters: {err:#}");
        }
    }
}
