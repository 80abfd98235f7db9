use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AnimalType;

/// Per-source totals as reported by the counts endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnimalCounts {
    #[serde(default)]
    pub dog: u64,
    #[serde(default)]
    pub cat: u64,
}

impl AnimalCounts {
    pub fn new(dog: u64, cat: u64) -> Self {
        Self { dog, cat }
    }

    pub fn get(&self, animal: AnimalType) -> u64 {
        match animal {
            AnimalType::Dog => self.dog,
            AnimalType::Cat => self.cat,
            AnimalType::Other => 0,
        }
    }
}

/// Source id -> counts. Ordered so deltas come out deterministically.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DetectionSnapshot(BTreeMap<String, AnimalCounts>);

impl DetectionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source_id: &str) -> Option<&AnimalCounts> {
        self.0.get(source_id)
    }

    pub fn insert(&mut self, source_id: impl Into<String>, counts: AnimalCounts) {
        self.0.insert(source_id.into(), counts);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnimalCounts)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AnimalCounts)> for DetectionSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, AnimalCounts)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Increase of one animal type at one source between two polls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaEvent {
    pub source_id: String,
    pub animal_type: AnimalType,
    /// Current total at the source.
    pub count: u64,
    /// How many of `count` are new since the last poll. Always > 0.
    pub new_count: u64,
}
