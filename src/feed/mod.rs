use std::sync::Arc;

use serde_json::Value;

use crate::{api::DetectionApi, models::DetectionEvent};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_warn};

const FEED_FIELD: &str = "detected_animals";

/// Fetches the detected-animals feed. Never fails: network errors and
/// malformed documents come back as an empty batch.
pub struct DetectionFeedClient {
    api: Arc<dyn DetectionApi>,
}

impl DetectionFeedClient {
    pub fn new(api: Arc<dyn DetectionApi>) -> Self {
        Self { api }
    }

    pub async fn fetch_detected_animals(&self) -> Vec<DetectionEvent> {
        match self.api.fetch_detections().await {
            Ok(document) => parse_feed(&document),
            Err(err) => {
                log_error!("Error fetching detected animals: {err:#}");
                Vec::new()
            }
        }
    }
}

/// Extracts the events from a feed document, skipping entries that do not
/// parse.
pub fn parse_feed(document: &Value) -> Vec<DetectionEvent> {
    let Some(entries) = document.get(FEED_FIELD).and_then(Value::as_array) else {
        log_warn!("Feed response has no `{FEED_FIELD}` array; treating as empty");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<DetectionEvent>(entry.clone()) {
            Ok(event) => Some(event),
            Err(err) => {
                log_warn!("Skipping malformed feed entry: {err}");
                None
            }
        })
        .collect()
}
