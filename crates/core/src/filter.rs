//! List filtering helpers used by catalog and back-office list pages.

use std::str::FromStr;

/// Case-insensitive substring search over several fields.
///
/// The term is trimmed; an empty term matches everything.
///
/// ```rust
/// use printloom_core::matches_search;
///
/// assert!(matches_search(["Ada Lovelace", "ada@example.com"], "  LOVE "));
/// assert!(!matches_search(["Ada Lovelace"], "babbage"));
/// assert!(matches_search(["anything"], ""));
/// ```
#[must_use]
pub fn matches_search<I, S>(haystacks: I, term: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystacks
        .into_iter()
        .any(|h| h.as_ref().to_lowercase().contains(&needle))
}

/// A status filter from a list page's query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<T> {
    /// No filtering.
    #[default]
    All,
    /// Keep only items with this status.
    Only(T),
}

impl<T: FromStr + PartialEq + Copy> StatusFilter<T> {
    /// Parse a query value. Missing, empty, `ALL` or unparseable values mean
    /// no filtering.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::All,
            Some(v) if v.eq_ignore_ascii_case("all") => Self::All,
            Some(v) => v.parse::<T>().map_or(Self::All, Self::Only),
        }
    }

    /// Whether an item with `status` passes the filter.
    #[must_use]
    pub fn matches(&self, status: T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }

    /// The selected status, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<T> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(*status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(StatusFilter::<OrderStatus>::from_query(None), StatusFilter::All);
        assert_eq!(
            StatusFilter::<OrderStatus>::from_query(Some("ALL")),
            StatusFilter::All
        );
        assert_eq!(
            StatusFilter::<OrderStatus>::from_query(Some("CANCELLED")),
            StatusFilter::Only(OrderStatus::Cancelled)
        );
        assert_eq!(
            StatusFilter::<OrderStatus>::from_query(Some("bogus")),
            StatusFilter::All
        );
    }

    #[test]
    fn test_status_filter_matches() {
        let filter = StatusFilter::Only(OrderStatus::Cancelled);
        assert!(filter.matches(OrderStatus::Cancelled));
        assert!(!filter.matches(OrderStatus::Pending));
        assert!(StatusFilter::<OrderStatus>::All.matches(OrderStatus::Pending));
    }

    #[test]
    fn test_cancelled_filter_with_unmatched_name_is_empty() {
        let orders = [
            ("Ada Lovelace", OrderStatus::Cancelled),
            ("Grace Hopper", OrderStatus::Pending),
        ];
        let filter = StatusFilter::Only(OrderStatus::Cancelled);
        let hits: Vec<_> = orders
            .iter()
            .filter(|(name, status)| filter.matches(*status) && matches_search([name], "turing"))
            .collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_matches_search_unicode_case() {
        assert!(matches_search(["Zoë Ünal"], "ünal"));
    }
}
