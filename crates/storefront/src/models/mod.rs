//! Session-held models for the storefront.

pub mod session;

pub use session::{AuthSession, CurrentUser, keys as session_keys};
