//! Account email addresses as typed into sign-up and profile forms.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a form email was rejected. The messages are shown to shoppers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Please enter your email address.")]
    Missing,
    #[error("Email addresses are limited to {max} characters.")]
    TooLong { max: usize },
    #[error("Please enter a valid email address.")]
    Malformed,
}

/// A normalized account email: trimmed, lowercased, `local@host.tld`.
///
/// The backend matches logins on the exact string, so every form that sends
/// an email goes through [`Email::from_form_input`] first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Longest address accepted (RFC 5321 path limit).
    pub const MAX_LENGTH: usize = 254;

    /// Normalize and check form input.
    ///
    /// ```
    /// use printloom_core::Email;
    ///
    /// let email = Email::from_form_input("  Ada@Example.COM ").unwrap();
    /// assert_eq!(email.as_str(), "ada@example.com");
    /// assert!(Email::from_form_input("ada@localhost").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] when the input is blank, too long, or not of
    /// the form `local@host.tld`.
    pub fn from_form_input(input: &str) -> Result<Self, EmailError> {
        let email = input.trim().to_lowercase();
        if email.is_empty() {
            return Err(EmailError::Missing);
        }
        if email.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !is_well_formed(&email) {
            return Err(EmailError::Malformed);
        }
        Ok(Self(email))
    }

    /// The normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the normalized address.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// One `@`, no whitespace, a non-empty local part and a dotted host whose
/// labels are all non-empty.
fn is_well_formed(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !host.contains('@')
        && host.contains('.')
        && host.split('.').all(|label| !label.is_empty())
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let email = Email::from_form_input("\tGrace.Hopper+shop@Navy.MIL \n").unwrap();
        assert_eq!(email.as_str(), "grace.hopper+shop@navy.mil");
        assert_eq!(email.to_string(), "grace.hopper+shop@navy.mil");
    }

    #[test]
    fn test_blank_is_missing() {
        assert_eq!(Email::from_form_input("   "), Err(EmailError::Missing));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            Email::from_form_input(&long),
            Err(EmailError::TooLong { max: 254 })
        );
    }

    #[test]
    fn test_malformed() {
        for input in [
            "no-at-symbol",
            "@example.com",
            "ada@",
            "ada@localhost",
            "ada@example..com",
            "ada@.com",
            "ada lovelace@example.com",
            "a@b@example.com",
        ] {
            assert_eq!(
                Email::from_form_input(input),
                Err(EmailError::Malformed),
                "{input}"
            );
        }
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(
            EmailError::Malformed.to_string(),
            "Please enter a valid email address."
        );
    }
}
