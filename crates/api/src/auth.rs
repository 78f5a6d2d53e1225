//! `/api/auth/*` endpoints.

use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use crate::client::{ApiClient, BackendSession};
use crate::types::{Credentials, NewUser, PasswordChange, User};
use crate::{ApiError, Result};

/// Login and registration answer either `{"user": {...}}` or the bare user.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Wrapped { user: User },
    Bare(User),
}

impl From<AuthResponse> for User {
    fn from(response: AuthResponse) -> Self {
        match response {
            AuthResponse::Wrapped { user } | AuthResponse::Bare(user) => user,
        }
    }
}

impl ApiClient {
    /// Log in and capture the backend session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials, or
    /// [`ApiError::Decode`] if the backend did not set a session cookie.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, BackendSession)> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.authenticate("/api/auth/login", &body).await
    }

    /// Create an account; the backend signs the new user in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with the backend's message when the
    /// account cannot be created (e.g. the email is taken).
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, new_user: &NewUser) -> Result<(User, BackendSession)> {
        self.authenticate("/api/auth/register", new_user).await
    }

    async fn authenticate<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(User, BackendSession)> {
        let builder = self.builder(Method::POST, path, None)?.json(body);
        let response = self.execute(builder).await?;
        let session = Self::capture_session(&response)
            .ok_or_else(|| ApiError::Decode("backend did not set a session cookie".to_string()))?;
        let user: AuthResponse = Self::decode(response).await?;
        Ok((user.into(), session))
    }

    /// End the backend session.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn logout(&self, session: &BackendSession) -> Result<()> {
        self.request_empty::<()>(Method::POST, "/api/auth/logout", None, Some(session))
            .await
    }

    /// The user the session belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the session has expired.
    #[instrument(skip(self, session))]
    pub async fn me(&self, session: &BackendSession) -> Result<User> {
        let response: AuthResponse = self.get("/api/auth/me", Some(session)).await?;
        Ok(response.into())
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] if the current password is wrong or the
    /// new one is rejected.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        session: &BackendSession,
        change: &PasswordChange,
    ) -> Result<()> {
        self.request_empty(
            Method::POST,
            "/api/auth/change-password",
            Some(change),
            Some(session),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_shapes() {
        let wrapped: AuthResponse = serde_json::from_str(
            r#"{"user":{"id":1,"name":"Ada","email":"ada@example.com"}}"#,
        )
        .unwrap();
        let bare: AuthResponse =
            serde_json::from_str(r#"{"id":1,"name":"Ada","email":"ada@example.com"}"#).unwrap();
        assert_eq!(User::from(wrapped), User::from(bare));
    }
}
