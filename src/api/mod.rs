//! Transport seam for the two remote endpoints.
//!
//! Implementations return raw results; the tracker and feed client above
//! this layer decide how failures are absorbed.

mod http;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::models::DetectionSnapshot;

pub use http::HttpDetectionApi;

#[async_trait]
pub trait DetectionApi: Send + Sync {
    /// `GET <counts-url>`: per-source dog/cat totals.
    async fn fetch_counters(&self) -> Result<DetectionSnapshot>;

    /// `GET <detections-url>`: the raw feed document. Shape validation is
    /// left to the caller so one bad entry cannot sink the whole batch.
    async fn fetch_detections(&self) -> Result<Value>;
}
