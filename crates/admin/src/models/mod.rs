//! Session-held models for the admin console.

pub mod session;

pub use session::{AdminSession, CurrentAdmin, keys as session_keys};
