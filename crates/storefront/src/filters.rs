//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Longest product blurb shown on a catalog card.
const EXCERPT_CHARS: usize = 90;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// First line of a product description, cut at a word boundary.
///
/// Usage in templates: `{{ product.description|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string(), EXCERPT_CHARS))
}

fn shorten(text: &str, max_chars: usize) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if line.chars().count() <= max_chars {
        return line.to_string();
    }

    let cut: String = line.chars().take(max_chars).collect();
    let cut = cut.rsplit_once(' ').map_or(cut.as_str(), |(head, _)| head);
    format!("{}…", cut.trim_end_matches([',', '.', ';', ':', ' ']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(shorten("Ceramic, 330 ml.", 90), "Ceramic, 330 ml.");
    }

    #[test]
    fn test_first_non_blank_line() {
        assert_eq!(shorten("\n  Matte A2 print\nShips rolled.", 90), "Matte A2 print");
    }

    #[test]
    fn test_cut_at_word_boundary() {
        assert_eq!(
            shorten("Heavyweight cotton tee, printed to order", 24),
            "Heavyweight cotton tee…"
        );
    }
}
