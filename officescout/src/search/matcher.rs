use std::borrow::Cow;
use std::iter;

/// Characters of context kept on each side of a text match
pub const CONTEXT_CHARS: usize = 50;

/// One keyword occurrence in document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch<'k> {
    pub keyword: &'k str,
    /// Character offset of the occurrence in the full text
    pub position: usize,
    /// Up to [`CONTEXT_CHARS`] characters either side of the occurrence
    pub context: String,
}

/// Lower-cases `s` one character at a time.
///
/// Characters whose lower-case form is more than one character are kept
/// unchanged, so the result always has the same number of characters as the
/// input and offsets carry over to the original text.
pub fn simple_lowercase(s: &str) -> String {
    s.chars()
        .map(|c| {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => l,
                _ => c,
            }
        })
        .collect()
}

/// Matches a fixed keyword list against cells and document text
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    /// Keywords as compared against folded content
    needles: Vec<String>,
    case_sensitive: bool,
}

impl KeywordMatcher {
    /// Creates a matcher; empty keywords are dropped
    pub fn new(keywords: Vec<String>, case_sensitive: bool) -> Self {
        let keywords: Vec<String> = keywords.into_iter().filter(|k| !k.is_empty()).collect();
        let needles = keywords
            .iter()
            .map(|k| {
                if case_sensitive {
                    k.clone()
                } else {
                    simple_lowercase(k)
                }
            })
            .collect();
        Self {
            keywords,
            needles,
            case_sensitive,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    fn fold<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.case_sensitive {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(simple_lowercase(text))
        }
    }

    /// Keywords contained in a cell, in keyword-list order.
    ///
    /// The whole cell is the match unit: each keyword appears at most once.
    pub fn find_in_cell(&self, cell: &str) -> Vec<&str> {
        let haystack = self.fold(cell);
        self.keywords
            .iter()
            .zip(&self.needles)
            .filter(|(_, needle)| haystack.contains(needle.as_str()))
            .map(|(keyword, _)| keyword.as_str())
            .collect()
    }

    /// Every occurrence of every keyword in `text`.
    ///
    /// Scanning resumes one character after each hit, so overlapping
    /// occurrences are all reported. The result is ordered by position with
    /// ties in keyword-list order.
    pub fn find_in_text(&self, text: &str) -> Vec<TextMatch<'_>> {
        let haystack = self.fold(text);
        let text_starts: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(iter::once(text.len()))
            .collect();
        let haystack_starts: Vec<usize> = haystack.char_indices().map(|(i, _)| i).collect();
        let total_chars = text_starts.len() - 1;

        let mut matches = Vec::new();
        for (keyword, needle) in self.keywords.iter().zip(&self.needles) {
            let needle_chars = needle.chars().count();
            let mut from = 0;
            while let Some(found) = haystack[from..].find(needle.as_str()) {
                let byte = from + found;
                let position = haystack_starts
                    .binary_search(&byte)
                    .unwrap_or_else(|insert_at| insert_at);

                let start = position.saturating_sub(CONTEXT_CHARS);
                let end = (position + needle_chars + CONTEXT_CHARS).min(total_chars);
                matches.push(TextMatch {
                    keyword,
                    position,
                    context: text[text_starts[start]..text_starts[end]].to_string(),
                });

                from = byte + haystack[byte..].chars().next().map_or(1, char::len_utf8);
            }
        }

        matches.sort_by_key(|m| m.position);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(keywords: &[&str], case_sensitive: bool) -> KeywordMatcher {
        KeywordMatcher::new(
            keywords.iter().map(|k| k.to_string()).collect(),
            case_sensitive,
        )
    }

    #[test]
    fn test_cell_whole_text_match() {
        let m = matcher(&["2024"], false);
        assert_eq!(m.find_in_cell("Invoice 2024"), vec!["2024"]);
        assert!(m.find_in_cell("Invoice 2023").is_empty());
    }

    #[test]
    fn test_cell_matches_each_keyword_once() {
        let m = matcher(&["b", "a"], false);
        // "a" occurs twice but the cell counts once per keyword
        assert_eq!(m.find_in_cell("a b a"), vec!["b", "a"]);
    }

    #[test]
    fn test_cell_case_rules() {
        let sensitive = matcher(&["Total"], true);
        assert!(sensitive.find_in_cell("grand total").is_empty());
        let insensitive = matcher(&["Total"], false);
        assert_eq!(insensitive.find_in_cell("GRAND TOTAL"), vec!["Total"]);
    }

    #[test]
    fn test_text_window_and_position() {
        let text = "the quick brown fox jumps";
        let m = matcher(&["fox"], false);
        let found = m.find_in_text(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, 16);
        assert_eq!(found[0].context, text);
        assert_eq!(found[0].keyword, "fox");
    }

    #[test]
    fn test_text_window_is_clamped_to_fifty_chars() {
        let text = format!("{}needle{}", "a".repeat(80), "b".repeat(80));
        let m = matcher(&["needle"], true);
        let found = m.find_in_text(&text);
        assert_eq!(found[0].position, 80);
        assert_eq!(
            found[0].context,
            format!("{}needle{}", "a".repeat(50), "b".repeat(50))
        );
    }

    #[test]
    fn test_overlapping_occurrences() {
        let m = matcher(&["aa"], true);
        let positions: Vec<_> = m.find_in_text("aaaa").iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_two_keywords_ordered_by_offset() {
        let m = matcher(&["foo", "bar"], false);
        let found = m.find_in_text("bar then foo");
        let order: Vec<_> = found.iter().map(|f| (f.keyword, f.position)).collect();
        assert_eq!(order, vec![("bar", 0), ("foo", 9)]);
    }

    #[test]
    fn test_same_offset_ties_follow_keyword_order() {
        let m = matcher(&["food", "foo"], false);
        let found = m.find_in_text("food");
        let order: Vec<_> = found.iter().map(|f| f.keyword).collect();
        assert_eq!(order, vec!["food", "foo"]);
    }

    #[test]
    fn test_offsets_are_characters() {
        let text = "Größe: ümlaut Straße";
        let m = matcher(&["straße"], false);
        let found = m.find_in_text(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, 14);
        assert!(found[0].context.ends_with("Straße"));
    }

    #[test]
    fn test_case_insensitive_equals_search_over_lowered_text() {
        let samples = [
            ("Hello HELLO hello", "HeLLo"),
            ("ÄÖÜ äöü", "äö"),
            ("İstanbul istanbul", "i"),
            ("mixed Case CASE case", "case"),
        ];
        for (text, keyword) in samples {
            let original_matcher = matcher(&[keyword], false);
            let original = original_matcher.find_in_text(text);

            let lowered_text = simple_lowercase(text);
            let lowered_keyword = simple_lowercase(keyword);
            let lowered_matcher = matcher(&[&lowered_keyword], false);
            let lowered = lowered_matcher.find_in_text(&lowered_text);

            let original_positions: Vec<_> = original.iter().map(|m| m.position).collect();
            let lowered_positions: Vec<_> = lowered.iter().map(|m| m.position).collect();
            assert_eq!(original_positions, lowered_positions, "text: {}", text);
            for (o, l) in original.iter().zip(&lowered) {
                assert_eq!(simple_lowercase(&o.context), l.context);
            }
        }
    }

    #[test]
    fn test_simple_lowercase_preserves_char_count() {
        let s = "İSTANBUL Straße ΣΑΣ";
        assert_eq!(simple_lowercase(s).chars().count(), s.chars().count());
        assert_eq!(simple_lowercase("ABC"), "abc");
    }

    #[test]
    fn test_no_match_and_empty_keywords() {
        let m = matcher(&["", "zzz"], false);
        assert_eq!(m.keywords(), &["zzz".to_string()]);
        assert!(m.find_in_text("abc").is_empty());
        assert!(matcher(&[], false).is_empty());
    }
}
