//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// English plural suffix for a count.
///
/// Usage in templates: `{{ count }} order{{ count|pluralize }}`
#[askama::filter_fn]
pub fn pluralize(count: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    let count = count.to_string();
    Ok(if count == "1" { "" } else { "s" })
}
