use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::{
    counters::CounterSnapshotTracker,
    feed::DetectionFeedClient,
    models::{DetectionEvent, DetectionSnapshot, UserSession},
    notify::NotificationDispatcher,
    relevance::RelevanceFilter,
    user::UserContextStore,
};

use super::{CheckReport, CheckSummary};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// The unit of work shared by the foreground timer, the background task and
/// manual checks.
pub struct CheckEngine {
    feed: DetectionFeedClient,
    users: Arc<UserContextStore>,
    filter: Arc<dyn RelevanceFilter>,
    dispatcher: NotificationDispatcher,
    tracker: Option<Arc<CounterSnapshotTracker>>,
    check_timeout: Duration,
    /// Serializes checks so two triggers never diff the same snapshot at once.
    in_flight: Mutex<()>,
}

impl CheckEngine {
    pub fn new(
        feed: DetectionFeedClient,
        users: Arc<UserContextStore>,
        filter: Arc<dyn RelevanceFilter>,
        dispatcher: NotificationDispatcher,
        tracker: Option<Arc<CounterSnapshotTracker>>,
        check_timeout: Duration,
    ) -> Self {
        Self {
            feed,
            users,
            filter,
            dispatcher,
            tracker,
            check_timeout,
            in_flight: Mutex::new(()),
        }
    }

    pub fn tracker(&self) -> Option<&Arc<CounterSnapshotTracker>> {
        self.tracker.as_ref()
    }

    /// Runs one check. Never fails: errors, timeouts and panics inside the
    /// check become a failed summary plus one fallback notification.
    ///
    /// The deadline only covers gathering. Once counter deltas are recorded
    /// every one of them is offered to the notifier.
    pub async fn run_one_check(self: &Arc<Self>) -> CheckSummary {
        let _serialized = self.in_flight.lock().await;

        // Spawned so a panic is contained and a dropped caller does not
        // cut the check short.
        let engine = Arc::clone(self);
        let check_timeout = self.check_timeout;
        let joined = tokio::spawn(async move {
            match tokio::time::timeout(check_timeout, engine.gather()).await {
                Ok(Ok(gathered)) => Ok(engine.deliver(gathered).await),
                Ok(Err(err)) => Err(format!("{err:#}")),
                Err(_elapsed) => Err(format!(
                    "detection check timed out after {}s",
                    check_timeout.as_secs()
                )),
            }
        })
        .await;

        let outcome = match joined {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => Err("detection check panicked".to_string()),
            Err(join_err) => Err(format!("detection check task failed: {join_err}")),
        };

        match outcome {
            Ok(report) => {
                log_info!(
                    "Check completed: {} event(s), {} relevant, {} notification(s)",
                    report.fetched_events,
                    report.relevant_events,
                    report.notifications_sent
                );
                CheckSummary::completed(report)
            }
            Err(error) => {
                log_error!("Error checking for detection events: {error}");
                self.dispatcher.emit_check_failed().await;
                CheckSummary::failed(error)
            }
        }
    }

    async fn gather(&self) -> Result<Gathered> {
        let events = self.feed.fetch_detected_animals().await;
        let session = self
            .users
            .load()
            .await
            .context("failed to load user session")?;
        let counters = match &self.tracker {
            Some(tracker) => tracker.poll().await,
            None => None,
        };

        Ok(Gathered {
            events,
            session,
            counters,
        })
    }

    async fn deliver(&self, gathered: Gathered) -> CheckReport {
        let Gathered {
            events,
            session,
            counters,
        } = gathered;

        let mut report = CheckReport {
            fetched_events: events.len(),
            ..CheckReport::default()
        };

        for event in &events {
            if !self.filter.is_relevant(event, session.as_ref()) {
                continue;
            }
            report.relevant_events += 1;
            if self.dispatcher.emit(event).await {
                report.notifications_sent += 1;
            }
        }

        if let (Some(tracker), Some(current)) = (&self.tracker, counters) {
            let check = tracker.record(current).await;
            for delta in &check.detections {
                if self.dispatcher.emit_delta(delta).await {
                    report.notifications_sent += 1;
                }
            }
            report.counters = Some(check);
        }

        report
    }
}

/// Everything a check needs from the network and storage.
struct Gathered {
    events: Vec<DetectionEvent>,
    session: Option<UserSession>,
    counters: Option<DetectionSnapshot>,
}
