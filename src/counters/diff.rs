//! Pure snapshot arithmetic. No I/O lives here.

use crate::models::{AnimalCounts, AnimalType, DeltaEvent, DetectionSnapshot};

const TRACKED_ANIMALS: [AnimalType; 2] = [AnimalType::Dog, AnimalType::Cat];

/// Deltas between the last-known snapshot and the current one.
///
/// A source missing from `last` reports its whole current count. For known
/// sources only increases are reported; decreases and equal counts yield
/// nothing. Sources missing from `current` are ignored.
pub fn compute_deltas(last: &DetectionSnapshot, current: &DetectionSnapshot) -> Vec<DeltaEvent> {
    let mut deltas = Vec::new();

    for (source_id, counts) in current.iter() {
        let previous = last.get(source_id).copied().unwrap_or_default();

        for animal in TRACKED_ANIMALS {
            let count = counts.get(animal);
            let new_count = count.saturating_sub(previous.get(animal));
            if new_count > 0 {
                deltas.push(DeltaEvent {
                    source_id: source_id.clone(),
                    animal_type: animal,
                    count,
                    new_count,
                });
            }
        }
    }

    deltas
}

/// Folds `current` into `last`: present sources are overwritten, absent ones
/// keep their previous counts so a transient omission never erases history.
pub fn merge_snapshot(last: &mut DetectionSnapshot, current: &DetectionSnapshot) {
    for (source_id, counts) in current.iter() {
        last.insert(source_id.clone(), *counts);
    }
}
