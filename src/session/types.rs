//! Session payload types.

use serde::{Deserialize, Serialize};

/// Dashboard role, as issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// Identity of the signed-in staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The signed credential bundle stored in the `session` cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    /// A session may only be persisted when every credential field is present.
    pub fn is_complete(&self) -> bool {
        !self.user.id.is_empty()
            && !self.user.email.is_empty()
            && !self.access_token.is_empty()
            && !self.refresh_token.is_empty()
    }

    /// Copy of this session with refreshed tokens. The refresh token is kept
    /// when the backend does not rotate it.
    pub fn with_tokens(&self, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            user: self.user.clone(),
            access_token,
            refresh_token: refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.refresh_token.clone()),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_session() -> Session {
    Session {
        user: SessionUser {
            id: "665f1c2e9b1d".to_string(),
            name: "Rahim".to_string(),
            email: "rahim@example.com".to_string(),
            role: Role::Admin,
            image: None,
        },
        access_token: "a1".to_string(),
        refresh_token: "r1".to_string(),
    }
}
