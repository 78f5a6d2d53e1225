//! Session-related types.
//!
//! Types stored in the session for authentication state.

use printloom_api::{BackendSession, User};
use printloom_core::UserId;
use serde::{Deserialize, Serialize};

/// Session-stored user identity.
///
/// Minimal data kept in the session to render the navbar and prefill forms.
/// The backend stays the source of truth; `/account` refetches the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl CurrentUser {
    /// First word of the name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A signed-in shopper: who they are and the backend cookie that proves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: CurrentUser,
    pub backend: BackendSession,
}

/// Session keys.
pub mod keys {
    /// Key for the signed-in user and their backend cookie.
    pub const AUTH: &str = "auth";

    /// Key for the one-shot toast shown on the next page.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let user = CurrentUser {
            id: UserId::new(1),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        };
        assert_eq!(user.first_name(), "Ada");
    }

    #[test]
    fn test_auth_session_debug_hides_cookie() {
        let auth = AuthSession {
            user: CurrentUser {
                id: UserId::new(1),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            backend: BackendSession::new("sid=topsecret"),
        };
        assert!(!format!("{auth:?}").contains("topsecret"));
    }
}
