use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::models::DetectionSnapshot;

use super::DetectionApi;

/// reqwest-backed client for the StraySafe detection API.
pub struct HttpDetectionApi {
    client: reqwest::Client,
    counts_url: String,
    detections_url: String,
}

impl HttpDetectionApi {
    pub fn new(
        counts_url: impl Into<String>,
        detections_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            counts_url: counts_url.into(),
            detections_url: detections_url.into(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            config.counts_url.clone(),
            config.detections_url.clone(),
            config.request_timeout,
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            bail!("{url} responded with {}", response.status());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("invalid JSON from {url}"))
    }
}

#[async_trait]
impl DetectionApi for HttpDetectionApi {
    async fn fetch_counters(&self) -> Result<DetectionSnapshot> {
        self.get_json(&self.counts_url).await
    }

    async fn fetch_detections(&self) -> Result<Value> {
        self.get_json(&self.detections_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_COUNTS_URL, DEFAULT_DETECTIONS_URL};

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let api = HttpDetectionApi::new(
            "http://127.0.0.1:9/counters",
            "http://127.0.0.1:9/detected_animals",
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(api.fetch_counters().await.is_err());
        assert!(api.fetch_detections().await.is_err());
    }

    #[tokio::test]
    #[ignore] // Run only when testing with live API
    async fn fetches_live_counters() {
        let api = HttpDetectionApi::new(
            DEFAULT_COUNTS_URL,
            DEFAULT_DETECTIONS_URL,
            Duration::from_secs(10),
        )
        .unwrap();

        let counters = api.fetch_counters().await.unwrap();
        assert!(!counters.is_empty());
    }
}
