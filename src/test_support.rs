//! Fakes for the engine's external collaborators.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    api::DetectionApi,
    counters::CounterSnapshotTracker,
    feed::DetectionFeedClient,
    models::{AnimalType, Classification, DetectionEvent, DetectionSnapshot, NotificationScope},
    notify::{NotificationDispatcher, NotificationPayload, Notifier},
    relevance::{NamingConventionFilter, RelevanceFilter},
    scheduler::{
        BackgroundCallback, BackgroundFetchResult, BackgroundTaskOptions, BackgroundTaskRuntime,
        CheckEngine, PollingScheduler,
    },
    storage::{KeyValueStore, MemoryStore},
    user::UserContextStore,
};

pub fn event(
    id: &str,
    source_id: &str,
    scope: NotificationScope,
    owner_id: Option<&str>,
) -> DetectionEvent {
    DetectionEvent {
        id: id.into(),
        source_id: source_id.into(),
        animal_type: AnimalType::Dog,
        classification: Classification::Stray,
        notification_scope: scope,
        owner_id: owner_id.map(str::to_string),
        timestamp: "2024-05-01T10:00:00Z".into(),
        image_url: None,
    }
}

pub fn feed_entry(id: &str, source_id: &str, scope: &str, owner_id: Option<&str>) -> Value {
    json!({
        "id": id,
        "animal_type": "dog",
        "stream_id": source_id,
        "classification": "stray",
        "notification_type": scope,
        "owner_id": owner_id,
        "timestamp": "2024-05-01T10:00:00Z",
    })
}

pub struct FakeApi {
    counters: Mutex<DetectionSnapshot>,
    detections: Mutex<Value>,
    counters_fail: AtomicBool,
    detections_fail: AtomicBool,
    detection_calls: AtomicUsize,
    counter_calls: AtomicUsize,
    detections_delay: Mutex<Option<Duration>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(DetectionSnapshot::new()),
            detections: Mutex::new(json!({ "detected_animals": [] })),
            counters_fail: AtomicBool::new(false),
            detections_fail: AtomicBool::new(false),
            detection_calls: AtomicUsize::new(0),
            counter_calls: AtomicUsize::new(0),
            detections_delay: Mutex::new(None),
        }
    }

    pub fn set_counters(&self, counters: DetectionSnapshot) {
        *self.counters.lock().unwrap() = counters;
    }

    pub fn set_detections(&self, document: Value) {
        *self.detections.lock().unwrap() = document;
    }

    pub fn fail_counters(&self, fail: bool) {
        self.counters_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_detections(&self, fail: bool) {
        self.detections_fail.store(fail, Ordering::SeqCst);
    }

    pub fn detection_calls(&self) -> usize {
        self.detection_calls.load(Ordering::SeqCst)
    }

    pub fn counter_calls(&self) -> usize {
        self.counter_calls.load(Ordering::SeqCst)
    }

    /// Makes every detections request hang for `delay` before answering.
    pub fn delay_detections(&self, delay: Option<Duration>) {
        *self.detections_delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl DetectionApi for FakeApi {
    async fn fetch_counters(&self) -> Result<DetectionSnapshot> {
        self.counter_calls.fetch_add(1, Ordering::SeqCst);
        if self.counters_fail.load(Ordering::SeqCst) {
            bail!("counts endpoint unreachable");
        }
        Ok(self.counters.lock().unwrap().clone())
    }

    async fn fetch_detections(&self) -> Result<Value> {
        self.detection_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.detections_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.detections_fail.load(Ordering::SeqCst) {
            bail!("detections endpoint unreachable");
        }
        Ok(self.detections.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationPayload>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `present` call take `delay` before it records.
    pub fn delay_next(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn present(&self, payload: NotificationPayload) -> Result<()> {
        let delay = self.delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            bail!("notifications disabled");
        }
        self.sent.lock().unwrap().push(payload);
        Ok(())
    }
}

/// A store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(anyhow!("storage offline"))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<()> {
        Err(anyhow!("storage offline"))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(anyhow!("storage offline"))
    }
}

/// In-memory store that can be switched into failing mode.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail: AtomicBool,
    writes_fail: AtomicBool,
}

impl FlakyStore {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Fails `set` only; reads and removals keep working.
    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("storage offline");
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.check()?;
        if self.writes_fail.load(Ordering::SeqCst) {
            bail!("storage is read-only");
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.inner.remove(key).await
    }
}

/// Background runtime that only runs callbacks when a test fires them.
#[derive(Default)]
pub struct FakeBackground {
    callbacks: Mutex<HashMap<String, BackgroundCallback>>,
    fail: AtomicBool,
}

impl FakeBackground {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn fire(&self, task_id: &str) -> Option<BackgroundFetchResult> {
        let callback = self.callbacks.lock().unwrap().get(task_id).cloned()?;
        Some(callback().await)
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("background execution unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl BackgroundTaskRuntime for FakeBackground {
    async fn register(
        &self,
        task_id: &str,
        _options: BackgroundTaskOptions,
        callback: BackgroundCallback,
    ) -> Result<()> {
        self.check()?;
        self.callbacks
            .lock()
            .unwrap()
            .insert(task_id.to_string(), callback);
        Ok(())
    }

    async fn unregister(&self, task_id: &str) -> Result<()> {
        self.check()?;
        self.callbacks.lock().unwrap().remove(task_id);
        Ok(())
    }

    async fn is_registered(&self, task_id: &str) -> Result<bool> {
        self.check()?;
        Ok(self.callbacks.lock().unwrap().contains_key(task_id))
    }
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub store: Arc<FlakyStore>,
    pub users: Arc<UserContextStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub background: Arc<FakeBackground>,
    pub tracker: Option<Arc<CounterSnapshotTracker>>,
    pub scheduler: PollingScheduler,
}

pub fn harness(counter_tracking: bool) -> Harness {
    harness_with_filter(counter_tracking, Arc::new(NamingConventionFilter))
}

pub fn harness_with_filter(counter_tracking: bool, filter: Arc<dyn RelevanceFilter>) -> Harness {
    let api = Arc::new(FakeApi::new());
    let store = Arc::new(FlakyStore::default());
    let notifier = Arc::new(RecordingNotifier::new());
    let background = Arc::new(FakeBackground::default());

    let users = Arc::new(UserContextStore::new(store.clone()));
    let tracker = counter_tracking
        .then(|| Arc::new(CounterSnapshotTracker::new(api.clone(), store.clone())));

    let engine = Arc::new(CheckEngine::new(
        DetectionFeedClient::new(api.clone()),
        users.clone(),
        filter,
        NotificationDispatcher::new(notifier.clone()),
        tracker.clone(),
        Duration::from_secs(25),
    ));
    let scheduler = PollingScheduler::new(
        engine,
        background.clone(),
        Duration::from_secs(30),
        Duration::from_secs(30),
    );

    Harness {
        api,
        store,
        users,
        notifier,
        background,
        tracker,
        scheduler,
    }
}
