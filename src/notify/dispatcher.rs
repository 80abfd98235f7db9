use std::sync::Arc;

use serde_json::{json, Value};

use crate::models::{DeltaEvent, DetectionEvent};

use super::{
    format::{
        delta_body, delta_title, event_body, event_title, source_label, CHECK_FAILED_BODY,
        CHECK_FAILED_TITLE,
    },
    NotificationPayload, Notifier,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Formats detections into notifications and hands them to the platform.
/// Each call is a single delivery attempt; failures are logged, never retried.
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Notifies about one feed event. Returns whether the platform accepted it.
    pub async fn emit(&self, event: &DetectionEvent) -> bool {
        let mut data = serde_json::to_value(event).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut data {
            map.insert("type".into(), json!("animal_detection"));
            map.insert("location".into(), json!(source_label(&event.source_id)));
        }

        let payload = NotificationPayload::new(event_title(event), event_body(event), data);
        let delivered = self.deliver(payload).await;
        if delivered {
            log_info!(
                "Notification sent for {} {} on {}",
                event.classification.as_str(),
                event.animal_type,
                event.source_id
            );
        }
        delivered
    }

    /// Notifies about a count increase from the counter path.
    pub async fn emit_delta(&self, delta: &DeltaEvent) -> bool {
        let data = json!({
            "type": "pet_detection",
            "cameraId": delta.source_id,
            "animalType": delta.animal_type,
            "count": delta.count,
            "newCount": delta.new_count,
            "location": source_label(&delta.source_id),
        });

        let payload = NotificationPayload::new(delta_title(delta), delta_body(delta), data);
        let delivered = self.deliver(payload).await;
        if delivered {
            log_info!(
                "Notification sent for {} new {}(s) on {}",
                delta.new_count,
                delta.animal_type,
                delta.source_id
            );
        }
        delivered
    }

    /// Best-effort "check failed" notice.
    pub async fn emit_check_failed(&self) -> bool {
        let payload = NotificationPayload::new(
            CHECK_FAILED_TITLE,
            CHECK_FAILED_BODY,
            json!({ "type": "error" }),
        );
        self.deliver(payload).await
    }

    async fn deliver(&self, payload: NotificationPayload) -> bool {
        let title = payload.title.clone();
        match self.notifier.present(payload).await {
            Ok(()) => true,
            Err(err) => {
                log_error!("Failed to present notification '{title}': {err:#}");
                false
            }
        }
    }
}
