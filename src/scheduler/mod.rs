pub mod background;
pub mod check;
pub mod controller;
pub mod state;

pub use background::{
    BackgroundCallback, BackgroundFetchResult, BackgroundTaskOptions, BackgroundTaskRuntime,
    TokioBackgroundRuntime,
};
pub use check::CheckEngine;
pub use controller::PollingScheduler;
pub use state::{CheckOutcome, CheckReport, CheckSummary, PollingStatus};
