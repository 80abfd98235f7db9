use std::sync::{Arc, RwLock};

use anyhow::Result;

use crate::{
    models::UserSession,
    storage::{self, KeyValueStore},
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const USER_STORAGE_KEY: &str = "stray_safe_user_session";

/// Owns the authenticated identity used to decide notification relevance.
/// The session is persisted so a background check without a live UI can
/// still evaluate it.
pub struct UserContextStore {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<UserSession>>,
}

impl UserContextStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    /// Reads the persisted session. A session that does not parse or has no
    /// display name is discarded. Storage failures are returned as errors.
    pub async fn load(&self) -> Result<Option<UserSession>> {
        let session = match storage::get_json::<UserSession>(self.store.as_ref(), USER_STORAGE_KEY)
            .await?
        {
            Some(Ok(session)) if session.is_valid() => Some(session),
            Some(Ok(_)) => {
                log_warn!("Persisted session has no display name; clearing it");
                self.store.remove(USER_STORAGE_KEY).await?;
                None
            }
            Some(Err(err)) => {
                log_warn!("Persisted session is unreadable ({err}); clearing it");
                self.store.remove(USER_STORAGE_KEY).await?;
                None
            }
            None => None,
        };

        self.set_current(session.clone());
        Ok(session)
    }

    /// Stores a new session. Anything invalid (including `None`) clears the
    /// existing session instead and returns `false`.
    pub async fn update(&self, session: Option<UserSession>) -> bool {
        let Some(session) = session.filter(UserSession::is_valid) else {
            log_warn!("Rejected session update without a display name");
            if let Err(err) = self.clear().await {
                log::error!("Failed to clear session after rejected update: {err:#}");
            }
            return false;
        };

        if let Err(err) = storage::set_json(self.store.as_ref(), USER_STORAGE_KEY, &session).await
        {
            log::error!("Failed to persist session: {err:#}");
            // The previous session must not outlive a failed switch.
            if let Err(err) = self.clear().await {
                log::error!("Failed to clear previous session: {err:#}");
            }
            return false;
        }

        log_info!("Session updated for {}", session.profile.name);
        self.set_current(Some(session));
        true
    }

    /// Removes the session (logout).
    pub async fn clear(&self) -> Result<()> {
        self.set_current(None);
        self.store.remove(USER_STORAGE_KEY).await
    }

    /// The cached session, without touching storage.
    pub fn current(&self) -> Option<UserSession> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_current(&self, session: Option<UserSession>) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = session;
    }
}
