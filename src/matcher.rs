//! Command matcher - transcript + confidence in, best action out
//!
//! Methods are tried in priority order; the first one whose best candidate
//! scores above the threshold wins:
//! 1. Exact    - score = confidence
//! 2. Contains - score = confidence * 0.8
//! 3. Fuzzy    - score = confidence * similarity * 0.6 (similarity >= minimum)
//! 4. Partial  - score = confidence * word overlap * 0.4

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::command::{Action, CommandEntry, CommandTable, Pattern};
use crate::config::MatchingConfig;
use crate::fuzzy::{normalize, similarity, word_overlap};
use crate::wake::WakePrefix;

/// How a command was recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Contains,
    Fuzzy,
    Partial,
}

impl MatchMethod {
    /// Priority order
    pub const ALL: [MatchMethod; 4] = [
        MatchMethod::Exact,
        MatchMethod::Contains,
        MatchMethod::Fuzzy,
        MatchMethod::Partial,
    ];

    pub fn weight(self) -> f32 {
        match self {
            MatchMethod::Exact => 1.0,
            MatchMethod::Contains => 0.8,
            MatchMethod::Fuzzy => 0.6,
            MatchMethod::Partial => 0.4,
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Contains => write!(f, "contains"),
            MatchMethod::Fuzzy => write!(f, "fuzzy"),
            MatchMethod::Partial => write!(f, "partial"),
        }
    }
}

/// Result of matching one utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub action: Action,
    /// 0..=1
    pub score: f32,
    pub method: MatchMethod,
    /// The registered phrase that produced the match
    pub pattern: String,
}

pub struct CommandMatcher {
    table: CommandTable,
    wake: Option<WakePrefix>,
    threshold: f32,
    fuzzy_min_similarity: f32,
}

impl CommandMatcher {
    pub fn new(table: CommandTable, config: &MatchingConfig) -> Self {
        let wake = config
            .wake_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(WakePrefix::new);
        Self {
            table,
            wake,
            threshold: config.match_threshold,
            fuzzy_min_similarity: config.fuzzy_min_similarity,
        }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Register an additional entry; it loses ties to every existing entry
    pub fn push(&mut self, entry: CommandEntry) {
        self.table.push(entry);
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Find the best command for a transcript, or None if nothing scores
    /// above the threshold
    #[hotpath::measure]
    pub fn find(&self, transcript: &str, confidence: f32) -> Option<MatchResult> {
        let normalized = normalize(transcript);
        let text = match &self.wake {
            Some(wake) => wake.strip(&normalized),
            None => normalized.as_str(),
        };
        if text.is_empty() {
            return None;
        }
        let confidence = confidence.clamp(0.0, 1.0);

        for method in MatchMethod::ALL {
            let Some(best) = self.best_for(method, text, confidence) else {
                continue;
            };
            if best.score > self.threshold {
                debug!(
                    "'{}' -> {} via {} '{}' (score {:.2})",
                    text, best.action, best.method, best.pattern, best.score
                );
                return Some(best);
            }
            debug!(
                "'{}': best {} candidate '{}' scored {:.2}, below {:.2}",
                text, method, best.pattern, best.score, self.threshold
            );
        }

        None
    }

    /// Highest scoring candidate for one method; ties keep the first registered
    fn best_for(&self, method: MatchMethod, text: &str, confidence: f32) -> Option<MatchResult> {
        let mut best: Option<(&CommandEntry, &Pattern, f32)> = None;

        for entry in self.table.entries() {
            for pattern in &entry.patterns {
                let Some(score) = self.score(method, pattern, text, confidence) else {
                    continue;
                };
                if best.is_none_or(|(_, _, top)| score > top) {
                    best = Some((entry, pattern, score));
                }
            }
        }

        best.map(|(entry, pattern, score)| MatchResult {
            action: entry.action.clone(),
            score,
            method,
            pattern: pattern.phrase().to_string(),
        })
    }

    fn score(&self, method: MatchMethod, pattern: &Pattern, text: &str, confidence: f32) -> Option<f32> {
        let factor = match method {
            MatchMethod::Exact => pattern.is_exact(text).then_some(1.0)?,
            MatchMethod::Contains => pattern.is_within(text).then_some(1.0)?,
            MatchMethod::Fuzzy => {
                let sim = similarity(text, pattern.phrase());
                (sim >= self.fuzzy_min_similarity).then_some(sim)?
            }
            MatchMethod::Partial => {
                let overlap = word_overlap(text, pattern.phrase());
                (overlap > 0.0).then_some(overlap)?
            }
        };
        Some(confidence * factor * method.weight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> CommandMatcher {
        CommandMatcher::new(CommandTable::builtin().unwrap(), &MatchingConfig::default())
    }

    #[test]
    fn test_exact_phrase_scores_confidence() {
        let matcher = matcher();
        for entry in matcher.table().entries() {
            for pattern in &entry.patterns {
                let m = matcher.find(pattern.phrase(), 0.87).unwrap();
                assert_eq!(m.action, entry.action, "phrase '{}'", pattern.phrase());
                assert_eq!(m.method, MatchMethod::Exact);
                assert_eq!(m.score, 0.87);
            }
        }
    }

    #[test]
    fn test_czech_commands() {
        let matcher = matcher();
        assert_eq!(matcher.find("přehrát", 0.9).unwrap().action, Action::Play);
        assert_eq!(matcher.find("ztlumit", 0.9).unwrap().action, Action::Mute);
        assert_eq!(matcher.find("Další skladbu.", 0.9).unwrap().action, Action::Next);
    }

    #[test]
    fn test_wake_prefix_is_optional() {
        let matcher = matcher();
        let m = matcher.find("Computer, pause", 0.8).unwrap();
        assert_eq!(m.action, Action::Pause);
        assert_eq!(m.method, MatchMethod::Exact);
        assert!(matcher.find("computer", 0.9).is_none());
    }

    #[test]
    fn test_contains_on_word_boundaries() {
        let matcher = matcher();
        let m = matcher.find("please unmute the player", 1.0).unwrap();
        assert_eq!(m.action, Action::Unmute);
        assert_eq!(m.method, MatchMethod::Contains);
        assert!((m.score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_fuzzy_match() {
        let matcher = matcher();
        // one dropped letter
        let m = matcher.find("ztlumt", 1.0).unwrap();
        assert_eq!(m.action, Action::Mute);
        assert_eq!(m.method, MatchMethod::Fuzzy);
        let expected = similarity("ztlumt", "ztlumit") * 0.6;
        assert!((m.score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_partial_match() {
        let config = MatchingConfig {
            match_threshold: 0.1,
            ..MatchingConfig::default()
        };
        let matcher = CommandMatcher::new(CommandTable::builtin().unwrap(), &config);
        let m = matcher
            .find("could you turn the sound off right now please", 1.0)
            .unwrap();
        assert_eq!(m.method, MatchMethod::Partial);
        assert_eq!(m.action, Action::Mute);
    }

    #[test]
    fn test_gibberish_is_unrecognized() {
        let matcher = matcher();
        assert!(matcher.find("qwertyuiop asdfghjkl zxcvbnm", 1.0).is_none());
        assert!(matcher.find("", 1.0).is_none());
    }

    #[test]
    fn test_score_never_exceeds_confidence() {
        let matcher = matcher();
        for text in ["play", "please play", "pley", "turn off the sound"] {
            if let Some(m) = matcher.find(text, 0.6) {
                assert!(m.score <= 0.6);
            }
        }
    }

    #[test]
    fn test_low_confidence_never_matches() {
        let matcher = matcher();
        let threshold = matcher.threshold();
        for text in ["play", "ztlumit", "volume up", "please unmute"] {
            assert!(matcher.find(text, threshold).is_none());
            assert!(matcher.find(text, threshold / 2.0).is_none());
        }
    }

    #[test]
    fn test_ties_go_to_first_registered() {
        let mut table = CommandTable::new();
        table.push(CommandEntry::new(Action::Custom("first".into()), "", &["lights"]).unwrap());
        table.push(CommandEntry::new(Action::Custom("second".into()), "", &["lights"]).unwrap());
        let matcher = CommandMatcher::new(table, &MatchingConfig::default());
        assert_eq!(
            matcher.find("lights", 1.0).unwrap().action,
            Action::Custom("first".into())
        );
    }
}
