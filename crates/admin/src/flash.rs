//! One-shot toast messages carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// `true` for a success toast, `false` for an error toast.
    pub ok: bool,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }

    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        if self.ok { "success" } else { "error" }
    }
}

/// Queue a toast for the next page.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the queued toast, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flash message");
            None
        })
}

/// Toast for the outcome of a backend mutation.
pub fn outcome<T, E: std::fmt::Display>(
    result: &std::result::Result<T, E>,
    success: impl Into<String>,
    failure: impl FnOnce(&E) -> String,
) -> Flash {
    match result {
        Ok(_) => Flash::success(success),
        Err(e) => Flash::error(failure(e)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_flash(&session, Flash::success("Saved")).await;

        let flash = take_flash(&session).await.unwrap();
        assert_eq!(flash.message, "Saved");
        assert_eq!(flash.css_class(), "success");
        assert!(take_flash(&session).await.is_none());
    }

    #[test]
    fn test_outcome() {
        let ok: std::result::Result<(), String> = Ok(());
        assert!(outcome(&ok, "Done", Clone::clone).ok);

        let err: std::result::Result<(), String> = Err("Nope".to_string());
        let flash = outcome(&err, "Done", Clone::clone);
        assert!(!flash.ok);
        assert_eq!(flash.message, "Nope");
    }
}
