//! `/api/settings` endpoints.

use reqwest::Method;
use tracing::{debug, instrument};

use crate::Result;
use crate::cache::{CacheKey, CacheValue};
use crate::client::{ApiClient, BackendSession};
use crate::types::Settings;

impl ApiClient {
    /// Store settings.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> Result<Settings> {
        if let Some(CacheValue::Settings(settings)) = self.cached(&CacheKey::Settings).await {
            debug!("Cache hit for settings");
            return Ok(settings);
        }

        let settings: Settings = self.get("/api/settings", None).await?;
        self.store(CacheKey::Settings, CacheValue::Settings(settings.clone()))
            .await;
        Ok(settings)
    }

    /// Store settings, falling back to defaults when the backend is
    /// unavailable. Price displays keep working without tax or shipping.
    pub async fn settings_or_default(&self) -> Settings {
        self.get_settings().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch settings, using defaults");
            Settings::default()
        })
    }

    /// Check that the backend answers, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend is unreachable or fails.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<()> {
        self.request_empty::<()>(Method::GET, "/api/settings", None, None)
            .await
    }

    /// Replace store settings (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Status`] when the backend rejects them.
    #[instrument(skip(self, session))]
    pub async fn update_settings(
        &self,
        session: &BackendSession,
        settings: &Settings,
    ) -> Result<Settings> {
        let updated: Settings = self
            .request(Method::PUT, "/api/settings", Some(settings), Some(session))
            .await?;
        self.invalidate(&[CacheKey::Settings]).await;
        Ok(updated)
    }
}
