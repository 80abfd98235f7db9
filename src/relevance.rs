use crate::models::{DetectionEvent, NotificationScope, UserSession};

/// Decides whether a detection should be surfaced to the current session.
pub trait RelevanceFilter: Send + Sync {
    fn is_relevant(&self, event: &DetectionEvent, session: Option<&UserSession>) -> bool;
}

/// Matches recipients by naming convention: owners by exact profile name,
/// pound operators by a "pound" substring in the profile name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingConventionFilter;

const POUND_MARKER: &str = "pound";

impl RelevanceFilter for NamingConventionFilter {
    fn is_relevant(&self, event: &DetectionEvent, session: Option<&UserSession>) -> bool {
        let Some(session) = session.filter(|s| s.display_name().is_some()) else {
            return false;
        };
        let name = session.profile.name.as_str();

        match event.notification_scope {
            NotificationScope::Owner => event.owner_id.as_deref() == Some(name),
            NotificationScope::Pound => name.to_lowercase().contains(POUND_MARKER),
            NotificationScope::Unspecified => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::event;

    fn session(name: &str) -> UserSession {
        UserSession::new(name, "", "")
    }

    #[test]
    fn owner_scope_matches_exact_name() {
        let filter = NamingConventionFilter;
        let owned = event("1", "cam-1", NotificationScope::Owner, Some("alice"));

        assert!(filter.is_relevant(&owned, Some(&session("alice"))));
        assert!(!filter.is_relevant(&owned, Some(&session("bob"))));
        assert!(!filter.is_relevant(&owned, Some(&session("Alice"))));
    }

    #[test]
    fn pound_scope_matches_substring_case_insensitively() {
        let filter = NamingConventionFilter;
        let stray = event("2", "cam-2", NotificationScope::Pound, None);

        assert!(filter.is_relevant(&stray, Some(&session("CityPound"))));
        assert!(filter.is_relevant(&stray, Some(&session("north POUND office"))));
        assert!(!filter.is_relevant(&stray, Some(&session("alice"))));
    }

    #[test]
    fn owner_scope_without_owner_id_is_never_relevant() {
        let filter = NamingConventionFilter;
        let orphan = event("3", "cam-3", NotificationScope::Owner, None);
        assert!(!filter.is_relevant(&orphan, Some(&session("alice"))));
    }

    #[test]
    fn pound_name_does_not_receive_owner_events() {
        let filter = NamingConventionFilter;
        let owned = event("4", "cam-4", NotificationScope::Owner, Some("alice"));
        assert!(!filter.is_relevant(&owned, Some(&session("CityPound"))));
    }

    #[test]
    fn missing_session_or_scope_is_never_relevant() {
        let filter = NamingConventionFilter;
        let owned = event("5", "cam-5", NotificationScope::Owner, Some("alice"));
        let unscoped = event("6", "cam-6", NotificationScope::Unspecified, Some("alice"));

        assert!(!filter.is_relevant(&owned, None));
        assert!(!filter.is_relevant(&unscoped, Some(&session("alice"))));
        assert!(!filter.is_relevant(&owned, Some(&session(""))));
    }

    #[test]
    fn owner_match_uses_the_untrimmed_name() {
        let filter = NamingConventionFilter;
        let owned = event("7", "cam-7", NotificationScope::Owner, Some("alice"));
        let padded = event("8", "cam-8", NotificationScope::Owner, Some(" alice "));

        assert!(!filter.is_relevant(&owned, Some(&session(" alice "))));
        assert!(filter.is_relevant(&padded, Some(&session(" alice "))));
    }
}
