//! Operations exposed to the UI layer. Errors cross this boundary as strings.

use serde::Serialize;

use crate::{
    models::UserSession,
    scheduler::{CheckSummary, PollingStatus},
    AppState,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResetResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Restores the persisted session and counter baseline at app start.
pub async fn initialize(state: &AppState) -> Result<(), String> {
    state.users.load().await.map_err(|e| format!("{e:#}"))?;

    if let Some(tracker) = &state.tracker {
        if tracker.initialize().await.is_none() {
            log::warn!("Counter baseline unavailable; it will be retried on the next check");
        }
    }

    log::info!("Notification service initialized");
    Ok(())
}

pub async fn start_polling(state: &AppState) -> Result<CheckSummary, String> {
    Ok(state.scheduler.start().await)
}

pub async fn stop_polling(state: &AppState) -> Result<(), String> {
    state.scheduler.stop().await;
    Ok(())
}

/// Manual check. The summary's `outcome()` separates new detections,
/// nothing new and failure.
pub async fn check_now(state: &AppState) -> Result<CheckSummary, String> {
    Ok(state.scheduler.run_one_check().await)
}

pub async fn reset_counters(state: &AppState) -> Result<ResetResult, String> {
    let Some(tracker) = &state.tracker else {
        return Ok(ResetResult {
            success: false,
            message: None,
            error: Some("counter tracking is disabled".into()),
        });
    };

    Ok(match tracker.reset().await {
        Ok(()) => ResetResult {
            success: true,
            message: Some("Detection counters reset successfully".into()),
            error: None,
        },
        Err(err) => {
            log::error!("Error resetting detection counters: {err:#}");
            ResetResult {
                success: false,
                message: None,
                error: Some(format!("{err:#}")),
            }
        }
    })
}

/// Stores the signed-in user; `None` or a nameless session logs out.
pub async fn update_user(state: &AppState, session: Option<UserSession>) -> Result<bool, String> {
    Ok(state.users.update(session).await)
}

pub async fn logout(state: &AppState) -> Result<(), String> {
    state.users.clear().await.map_err(|e| format!("{e:#}"))
}

pub async fn get_status(state: &AppState) -> Result<PollingStatus, String> {
    Ok(state.scheduler.status().await)
}

pub async fn register_background_task(state: &AppState) -> Result<CheckSummary, String> {
    state
        .scheduler
        .register_background_task()
        .await
        .map_err(|e| format!("{e:#}"))
}

pub async fn unregister_background_task(state: &AppState) -> Result<(), String> {
    state
        .scheduler
        .unregister_background_task()
        .await
        .map_err(|e| format!("{e:#}"))
}
