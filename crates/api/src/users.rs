//! `/api/users` endpoints.

use printloom_core::UserId;
use reqwest::Method;
use tracing::instrument;

use crate::Result;
use crate::client::{ApiClient, BackendSession};
use crate::types::{ProfileUpdate, User};

impl ApiClient {
    /// All customer accounts (admin only).
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn list_users(&self, session: &BackendSession) -> Result<Vec<User>> {
        self.get("/api/users", Some(session)).await
    }

    /// One account.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::NotFound`] for unknown ids.
    #[instrument(skip(self, session))]
    pub async fn get_user(&self, session: &BackendSession, id: UserId) -> Result<User> {
        self.get(&format!("/api/users/{id}"), Some(session)).await
    }

    /// Update profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Status`] with the backend's message when
    /// the update is rejected.
    #[instrument(skip(self, session, update))]
    pub async fn update_user(
        &self,
        session: &BackendSession,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User> {
        self.request(
            Method::PUT,
            &format!("/api/users/{id}"),
            Some(update),
            Some(session),
        )
        .await
    }
}
