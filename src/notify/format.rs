//! Deterministic notification text. Same input, same words.

use crate::models::{Classification, DeltaEvent, DetectionEvent};

pub const CHECK_FAILED_TITLE: &str = "Detection Check Failed";
pub const CHECK_FAILED_BODY: &str =
    "Could not check for new pet detections. Please try again later.";

/// Turns a source slug into a display label: dashes become spaces and each
/// word starts upper-case (`cam-5` -> `Cam 5`).
pub fn source_label(source_id: &str) -> String {
    let mut label = String::with_capacity(source_id.len());
    let mut at_word_start = true;

    for ch in source_id.chars() {
        let ch = if ch == '-' { ' ' } else { ch };
        let is_word_char = ch.is_alphanumeric() || ch == '_';
        if is_word_char && at_word_start {
            label.extend(ch.to_uppercase());
        } else {
            label.push(ch);
        }
        at_word_start = !is_word_char;
    }

    label
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn event_title(event: &DetectionEvent) -> String {
    let animal = capitalize(event.animal_type.as_str());
    match event.classification {
        Classification::Stray => format!("Stray {animal} Detected!"),
        Classification::Owned => format!("Your {animal} Was Spotted!"),
        Classification::Unknown => format!("{animal} Detected!"),
    }
}

pub fn event_body(event: &DetectionEvent) -> String {
    let location = source_label(&event.source_id);
    match event.classification {
        Classification::Stray => format!(
            "Camera {location} has detected a stray {}.",
            event.animal_type
        ),
        Classification::Owned => format!(
            "Camera {location} has detected your registered {}.",
            event.animal_type
        ),
        Classification::Unknown => {
            format!("Camera {location} has detected a {}.", event.animal_type)
        }
    }
}

pub fn delta_title(delta: &DeltaEvent) -> String {
    let animal = capitalize(delta.animal_type.as_str());
    if delta.new_count == 1 {
        format!("New {animal} Detected!")
    } else {
        format!("{} New {animal}s Detected!", delta.new_count)
    }
}

pub fn delta_body(delta: &DeltaEvent) -> String {
    let plural = if delta.new_count > 1 { "s" } else { "" };
    format!(
        "Camera {} has detected {} new {}{plural}. Total count: {}",
        source_label(&delta.source_id),
        delta.new_count,
        delta.animal_type,
        delta.count
    )
}
