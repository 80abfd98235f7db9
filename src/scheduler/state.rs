use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::counters::CounterCheck;

/// Reflection of the two independent polling mechanisms. Rebuilt on demand,
/// never persisted.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PollingStatus {
    pub is_background_registered: bool,
    pub is_polling: bool,
}

/// What one successful check saw and did.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub fetched_events: usize,
    pub relevant_events: usize,
    pub notifications_sent: usize,
    /// `None` when counter tracking is disabled or the counts were unavailable.
    pub counters: Option<CounterCheck>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub success: bool,
    /// On failure this means a fallback notice was attempted.
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CheckReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CheckOutcome {
    NewDetections,
    NoNewDetections,
    Failed,
}

impl CheckSummary {
    pub fn completed(report: CheckReport) -> Self {
        Self {
            success: true,
            notified: report.notifications_sent > 0,
            data: Some(report),
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            notified: true,
            data: None,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn outcome(&self) -> CheckOutcome {
        match (self.success, self.notified) {
            (false, _) => CheckOutcome::Failed,
            (true, true) => CheckOutcome::NewDetections,
            (true, false) => CheckOutcome::NoNewDetections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_distinguishable() {
        let nothing = CheckSummary::completed(CheckReport::default());
        assert_eq!(nothing.outcome(), CheckOutcome::NoNewDetections);

        let some = CheckSummary::completed(CheckReport {
            fetched_events: 2,
            relevant_events: 1,
            notifications_sent: 1,
            counters: None,
        });
        assert_eq!(some.outcome(), CheckOutcome::NewDetections);

        let failed = CheckSummary::failed("boom");
        assert_eq!(failed.outcome(), CheckOutcome::Failed);
        assert!(failed.notified);
    }

    #[test]
    fn status_serializes_camel_case() {
        let status = PollingStatus {
            is_background_registered: true,
            is_polling: false,
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["isBackgroundRegistered"], true);
        assert_eq!(json["isPolling"], false);
    }
}
