//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use printloom_api::{BackendSession, User};
use printloom_core::UserId;
use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Backend user ID.
    pub id: UserId,
    /// Admin's email address.
    pub email: String,
    /// Admin's display name.
    pub name: String,
}

impl CurrentAdmin {
    /// Build from a backend user, refusing accounts without the admin role.
    #[must_use]
    pub fn from_user(user: &User) -> Option<Self> {
        user.is_admin().then(|| Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        })
    }
}

/// A signed-in admin and the backend cookie their calls are made with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub admin: CurrentAdmin,
    pub backend: BackendSession,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the one-shot toast shown on the next page.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admins_become_current_admin() {
        let admin: User = serde_json::from_str(
            r#"{"id":1,"name":"Root","email":"root@printloom.test","role":"admin"}"#,
        )
        .unwrap();
        let customer: User =
            serde_json::from_str(r#"{"id":2,"name":"Ada","email":"ada@printloom.test"}"#).unwrap();

        assert_eq!(CurrentAdmin::from_user(&admin).unwrap().name, "Root");
        assert!(CurrentAdmin::from_user(&customer).is_none());
    }
}
