//! Local notification dispatch.

pub mod dispatcher;
pub mod format;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use dispatcher::NotificationDispatcher;

/// What the OS notification capability receives. Shown immediately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPayload {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Structured data handed back to the UI when the notification is tapped.
    pub data: Value,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            data,
        }
    }
}

/// Platform notification adapters implement this.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn present(&self, payload: NotificationPayload) -> Result<()>;
}

/// Headless notifier: writes each notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn present(&self, payload: NotificationPayload) -> Result<()> {
        log::info!(
            "[notification {}] {} | {} | {}",
            payload.id,
            payload.title,
            payload.body,
            payload.data
        );
        Ok(())
    }
}
