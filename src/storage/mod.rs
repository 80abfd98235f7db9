//! Persistent key-value storage.
//!
//! The engine only needs string blobs keyed by string; callers serialize
//! with serde_json themselves.

mod memory;
mod migrations;
mod sqlite;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Reads and decodes a JSON blob. A blob that fails to decode is reported as
/// `Ok(Err(..))` so the caller can decide whether to discard it.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<std::result::Result<T, serde_json::Error>>> {
    let raw = store.get(key).await?;
    Ok(raw.map(|value| serde_json::from_str(&value)))
}

pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let serialized =
        serde_json::to_string(value).with_context(|| format!("failed to serialize {key}"))?;
    store.set(key, serialized).await
}
