//! Fuzzy string matching utilities using Levenshtein distance
//!
//! Speech recognizers mangle short phrases ("pauza" for "pause", dropped
//! diacritics), so commands are compared with edit-distance similarity
//! and word overlap in addition to exact matching.

use unicode_normalization::UnicodeNormalization;

/// Fuzzy match using Levenshtein distance, allows ~30% errors
pub fn fuzzy_match(expected: &str, actual: &str) -> bool {
    if expected == actual {
        return true;
    }
    let max_dist = (expected.chars().count() / 3).max(1);
    levenshtein(expected, actual) <= max_dist
}

/// Calculate Levenshtein distance between two strings
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0; b.len() + 1]; a.len() + 1];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        dp[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

/// Edit-distance similarity in 0..=1, normalized by the longer string.
///
/// `1 - distance / max(len_a, len_b)`, counted in chars. Two empty
/// strings are identical.
pub fn similarity(a: &str, b: &str) -> f32 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / longest as f32
}

/// Fraction of `pattern` words present in `text`, over the larger word count
pub fn word_overlap(text: &str, pattern: &str) -> f32 {
    let text_words: Vec<&str> = text.split_whitespace().collect();
    let pattern_words: Vec<&str> = pattern.split_whitespace().collect();
    let longest = text_words.len().max(pattern_words.len());
    if longest == 0 {
        return 0.0;
    }
    let matching = pattern_words
        .iter()
        .filter(|w| text_words.contains(w))
        .count();
    matching as f32 / longest as f32
}

/// Normalize a transcript or pattern for matching.
///
/// NFC, lowercase, trailing punctuation stripped, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let composed: String = text.nfc().collect::<String>().to_lowercase();
    let trimmed = composed
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c == '…');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a single word for matching: lowercase, alphabetic only
pub fn clean_for_matching(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(fuzzy_match("computer", "computer"));
        assert!(fuzzy_match("play", "play"));
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(fuzzy_match("computer", "komputer"));
        assert!(fuzzy_match("computer", "compuer"));
        assert!(fuzzy_match("play", "pley"));
    }

    #[test]
    fn test_no_match() {
        assert!(!fuzzy_match("computer", "commander"));
        assert!(!fuzzy_match("play", "stop"));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        // counted in chars, not bytes
        assert_eq!(levenshtein("přehrát", "prehrat"), 2);
    }

    #[test]
    fn test_similarity_identity_and_symmetry() {
        for s in ["", "a", "play", "přehrát", "volume up", "ztlumit"] {
            assert_eq!(similarity(s, s), 1.0);
        }
        let pairs = [
            ("play", "pley"),
            ("next track", "next"),
            ("ztlumit", "ztlumi"),
            ("", "mute"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_similarity_values() {
        assert_eq!(similarity("mute", ""), 0.0);
        assert!((similarity("pause", "pauza") - 0.6).abs() < 1e-6);
        assert!((similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-6);
    }

    #[test]
    fn test_word_overlap() {
        assert_eq!(word_overlap("volume up", "volume up"), 1.0);
        assert_eq!(word_overlap("turn the volume up", "volume up"), 0.5);
        assert_eq!(word_overlap("hello", "volume up"), 0.0);
        assert_eq!(word_overlap("", ""), 0.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Volume   UP! "), "volume up");
        assert_eq!(normalize("Přehrát."), "přehrát");
        // decomposed input composes to the same string
        assert_eq!(normalize("pr\u{030C}ehra\u{0301}t"), "přehrát");
    }

    #[test]
    fn test_clean_for_matching() {
        assert_eq!(clean_for_matching("Computer,"), "computer");
    }
}
