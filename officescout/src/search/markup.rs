//! Heuristic for match windows that are document plumbing rather than prose.
//!
//! Legacy `.doc` text comes straight out of the piece table, so field
//! instructions such as `HYPERLINK "http://..."` or `TOC \o` appear inline
//! with the visible text. A window is treated as markup when it carries at
//! least two markup tokens, when it opens with a bare URL, or when it is
//! dominated by separator punctuation.

/// Decides whether a match window should be dropped
pub type MarkupPolicy = fn(&str) -> bool;

/// Tokens typical of field codes and leaked XML
const MARKUP_TOKENS: &[&str] = &[
    "<w:",
    "</",
    "xmlns",
    "<?xml",
    "HYPERLINK",
    "MERGEFORMAT",
    "PAGEREF",
    "TOC \\",
];

/// Windows shorter than this are never judged by punctuation density
const MIN_DENSITY_LEN: usize = 20;
const MAX_SEPARATOR_DENSITY: f64 = 0.15;

pub fn looks_like_markup(window: &str) -> bool {
    let token_hits = MARKUP_TOKENS
        .iter()
        .filter(|token| window.contains(*token))
        .count();
    if token_hits >= 2 {
        return true;
    }

    if starts_with_url(window.trim_start()) {
        return true;
    }

    let chars = window.chars().count();
    if chars >= MIN_DENSITY_LEN {
        let separators = window
            .chars()
            .filter(|c| matches!(c, ',' | '/' | ':'))
            .count();
        if separators as f64 / chars as f64 > MAX_SEPARATOR_DENSITY {
            return true;
        }
    }

    false
}

fn starts_with_url(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once("://") else {
        return false;
    };
    !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prose_passes() {
        assert!(!looks_like_markup(
            "The quarterly budget review is scheduled for Monday morning."
        ));
        assert!(!looks_like_markup("see also: budget"));
    }

    #[test]
    fn test_field_codes_are_markup() {
        assert!(looks_like_markup(
            " HYPERLINK \"http://intranet/budget\" \\* MERGEFORMAT budget"
        ));
        assert!(looks_like_markup("TOC \\o \"1-3\" PAGEREF _Toc123 budget"));
    }

    #[test]
    fn test_single_token_is_not_enough() {
        assert!(!looks_like_markup("click the HYPERLINK below to open the budget"));
    }

    #[test]
    fn test_bare_url_is_markup() {
        assert!(looks_like_markup("  https://example.com/budget"));
        assert!(!looks_like_markup("budget at https://example.com today"));
    }

    #[test]
    fn test_separator_density() {
        assert!(looks_like_markup("a/b/c:d,e/f/g:h,i/j/budget"));
        // Short windows are not judged by density
        assert!(!looks_like_markup("a/b:c"));
    }
}
