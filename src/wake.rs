//! Wake prefix handling - "computer, play" is the same command as "play"

use crate::fuzzy::{clean_for_matching, fuzzy_match};

/// Optional wake prefix stripped from the front of transcripts
#[derive(Debug, Clone)]
pub struct WakePrefix {
    words: Vec<String>,
}

impl WakePrefix {
    pub fn new(phrase: &str) -> Self {
        Self {
            words: phrase
                .to_lowercase()
                .split_whitespace()
                .map(String::from)
                .collect(),
        }
    }

    /// Remove the prefix (fuzzy) if present, otherwise return the text unchanged
    pub fn strip<'a>(&self, text: &'a str) -> &'a str {
        if self.words.is_empty() {
            return text;
        }

        let text_words: Vec<&str> = text.split_whitespace().collect();
        if text_words.len() < self.words.len() {
            return text;
        }

        for (i, wake_word) in self.words.iter().enumerate() {
            let spoken_clean = clean_for_matching(text_words[i]);
            if !fuzzy_match(wake_word, &spoken_clean) {
                return text;
            }
        }

        // Byte offset just past the last prefix word
        let mut rest = text;
        for _ in 0..self.words.len() {
            rest = rest.trim_start();
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            rest = &rest[end..];
        }
        rest.trim_start_matches([',', '!', '.', ' '])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_prefix() {
        let wake = WakePrefix::new("computer");
        assert_eq!(wake.strip("computer play"), "play");
        assert_eq!(wake.strip("computer, volume up"), "volume up");
        assert_eq!(wake.strip("komputer next track"), "next track");
    }

    #[test]
    fn test_leaves_other_text() {
        let wake = WakePrefix::new("computer");
        assert_eq!(wake.strip("play"), "play");
        assert_eq!(wake.strip("make it so"), "make it so");
        assert_eq!(wake.strip("computer"), "");
    }

    #[test]
    fn test_empty_prefix_is_disabled() {
        let wake = WakePrefix::new("");
        assert_eq!(wake.strip("computer play"), "computer play");
    }

    #[test]
    fn test_multi_word_prefix() {
        let wake = WakePrefix::new("hey player");
        assert_eq!(wake.strip("hey player pause"), "pause");
        assert_eq!(wake.strip("hey pause"), "hey pause");
    }
}
