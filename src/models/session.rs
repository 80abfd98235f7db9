use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Remaining profile fields (avatar, phone, ...) passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub profile: UserProfile,
}

impl UserSession {
    pub fn new(name: impl Into<String>, email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            token: token.into(),
            profile: UserProfile {
                name: name.into(),
                email: email.into(),
                extra: Map::new(),
            },
        }
    }

    /// The display name, if present and non-blank.
    pub fn display_name(&self) -> Option<&str> {
        let name = self.profile.name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.display_name().is_some()
    }
}
