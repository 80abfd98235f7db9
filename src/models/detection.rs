use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnimalType {
    Dog,
    Cat,
    #[serde(other)]
    Other,
}

impl AnimalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalType::Dog => "dog",
            AnimalType::Cat => "cat",
            AnimalType::Other => "animal",
        }
    }
}

impl fmt::Display for AnimalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Stray,
    Owned,
    #[serde(other)]
    Unknown,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Stray => "stray",
            Classification::Owned => "owned",
            Classification::Unknown => "unclassified",
        }
    }
}

/// Who a detection is addressed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationScope {
    Owner,
    Pound,
    #[serde(other)]
    Unspecified,
}

/// One entry of the `detected_animals` feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "stream_id")]
    pub source_id: String,
    pub animal_type: AnimalType,
    #[serde(default = "unknown_classification")]
    pub classification: Classification,
    #[serde(rename = "notification_type", default = "unspecified_scope")]
    pub notification_scope: NotificationScope,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn unknown_classification() -> Classification {
    Classification::Unknown
}

fn unspecified_scope() -> NotificationScope {
    NotificationScope::Unspecified
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
