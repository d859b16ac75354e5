//! Bounded command history, newest first

use std::collections::VecDeque;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::command::Action;

/// One accepted utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transcript: String,
    /// None when nothing matched
    #[serde(default)]
    pub action: Option<Action>,
    pub confidence: f32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(transcript: &str, action: Option<Action>, confidence: f32) -> Self {
        Self {
            transcript: transcript.to_string(),
            action,
            confidence,
            timestamp: Utc::now().trunc_subsecs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl CommandHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries.min(256)),
            max_entries,
        }
    }

    /// Record an entry, evicting the oldest beyond the cap
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.max_entries);
    }

    /// Up to `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace contents with previously persisted entries (newest first)
    pub fn restore(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = entries.into_iter().take(self.max_entries).collect();
    }

    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut history = CommandHistory::new(10);
        history.push(HistoryEntry::new("play", Some(Action::Play), 0.9));
        history.push(HistoryEntry::new("pause", Some(Action::Pause), 0.8));
        let recent = history.recent(10);
        assert_eq!(recent[0].transcript, "pause");
        assert_eq!(recent[1].transcript, "play");
        assert_eq!(history.latest().unwrap().action, Some(Action::Pause));
    }

    #[test]
    fn test_never_exceeds_cap() {
        let mut history = CommandHistory::new(5);
        for i in 0..23 {
            history.push(HistoryEntry::new(&format!("cmd {i}"), None, 0.9));
            assert!(history.len() <= 5);
        }
        assert_eq!(history.recent(1)[0].transcript, "cmd 22");
        assert_eq!(history.recent(100).last().unwrap().transcript, "cmd 18");
    }

    #[test]
    fn test_restore_truncates() {
        let mut history = CommandHistory::new(2);
        let entries = (0..4)
            .map(|i| HistoryEntry::new(&i.to_string(), None, 1.0))
            .collect();
        history.restore(entries);
        assert_eq!(history.len(), 2);
        assert_eq!(history.recent(5)[0].transcript, "0");
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = HistoryEntry::new("hlasitěji", Some(Action::VolumeUp), 0.75);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "volume_up");
        let back: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
