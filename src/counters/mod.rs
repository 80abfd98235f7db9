pub mod diff;
pub mod tracker;

pub use tracker::{CounterCheck, CounterSnapshotTracker, COUNTER_STORAGE_KEY};
