//! Command table - ordered list of trigger phrases and the player action each maps to
//!
//! Entries are evaluated in registration order, so earlier entries win ties.
//! Every phrase compiles into two predicates:
//! 1. exact - the whole (prefix-stripped) transcript is the phrase
//! 2. within - the phrase occurs inside the transcript on word boundaries

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fuzzy::normalize;

/// Player actions a voice command can trigger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Play,
    Pause,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
    Shuffle,
    Repeat,
    Restart,
    Status,
    Time,
    Bookmark,
    Fullscreen,
    Minimize,
    Engage,
    RedAlert,
    /// Caller-registered command, dispatched to a named handler
    Custom(String),
}

impl Action {
    /// Stable identifier, e.g. `volume_up` or `custom:lights`
    pub fn id(&self) -> String {
        match self {
            Action::Custom(name) => format!("custom:{name}"),
            other => other.builtin_id().to_string(),
        }
    }

    fn builtin_id(&self) -> &'static str {
        match self {
            Action::Play => "play",
            Action::Pause => "pause",
            Action::Next => "next",
            Action::Previous => "previous",
            Action::VolumeUp => "volume_up",
            Action::VolumeDown => "volume_down",
            Action::Mute => "mute",
            Action::Unmute => "unmute",
            Action::Shuffle => "shuffle",
            Action::Repeat => "repeat",
            Action::Restart => "restart",
            Action::Status => "status",
            Action::Time => "time",
            Action::Bookmark => "bookmark",
            Action::Fullscreen => "fullscreen",
            Action::Minimize => "minimize",
            Action::Engage => "engage",
            Action::RedAlert => "red_alert",
            Action::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Parse action string from config into an Action
impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix("custom:") {
            if name.is_empty() {
                return Err(Error::UnknownAction(s.to_string()));
            }
            return Ok(Action::Custom(name.to_string()));
        }

        let action = match s.to_lowercase().replace('-', "_").as_str() {
            "play" => Action::Play,
            "pause" => Action::Pause,
            "next" => Action::Next,
            "previous" | "prev" => Action::Previous,
            "volume_up" | "volumeup" => Action::VolumeUp,
            "volume_down" | "volumedown" => Action::VolumeDown,
            "mute" => Action::Mute,
            "unmute" => Action::Unmute,
            "shuffle" => Action::Shuffle,
            "repeat" | "loop" => Action::Repeat,
            "restart" | "reset" => Action::Restart,
            "status" => Action::Status,
            "time" => Action::Time,
            "bookmark" => Action::Bookmark,
            "fullscreen" => Action::Fullscreen,
            "minimize" => Action::Minimize,
            "engage" => Action::Engage,
            "red_alert" | "redalert" => Action::RedAlert,
            _ => return Err(Error::UnknownAction(s.to_string())),
        };
        Ok(action)
    }
}

/// A single trigger phrase with its compiled predicates
#[derive(Debug, Clone)]
pub struct Pattern {
    phrase: String,
    exact: Regex,
    within: Regex,
}

impl Pattern {
    pub fn new(raw: &str) -> Result<Self> {
        let phrase = normalize(raw);
        if phrase.is_empty() {
            return Err(Error::EmptyPattern(raw.to_string()));
        }
        let body = phrase
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let exact = Regex::new(&format!("^{body}$"))?;
        let within = Regex::new(&format!(r"\b{body}\b"))?;
        Ok(Self {
            phrase,
            exact,
            within,
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// The whole transcript is this phrase
    pub fn is_exact(&self, text: &str) -> bool {
        self.exact.is_match(text)
    }

    /// The phrase occurs inside the transcript on word boundaries
    pub fn is_within(&self, text: &str) -> bool {
        self.within.is_match(text)
    }
}

/// Command entry: trigger phrases, the action they map to, and a description
#[derive(Debug, Clone)]
pub struct CommandEntry {
    pub patterns: Vec<Pattern>,
    pub action: Action,
    pub description: String,
}

impl CommandEntry {
    pub fn new(action: Action, description: &str, phrases: &[&str]) -> Result<Self> {
        Ok(Self {
            patterns: phrases
                .iter()
                .map(|p| Pattern::new(p))
                .collect::<Result<Vec<_>>>()?,
            action,
            description: description.to_string(),
        })
    }

    /// Add phrases `head suffix` for every head/suffix pair
    fn with_suffixes(mut self, heads: &[&str], suffixes: &[&str]) -> Result<Self> {
        for head in heads {
            for suffix in suffixes {
                self.patterns.push(Pattern::new(&format!("{head} {suffix}"))?);
            }
        }
        Ok(self)
    }
}

/// Ordered command table
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

impl CommandTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry; existing entries keep precedence
    pub fn push(&mut self, entry: CommandEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct action identifiers in registration order
    pub fn action_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for entry in &self.entries {
            let id = entry.action.id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Print all available voice commands
    pub fn help_text(&self) -> String {
        let mut out = String::from("Voice commands (optionally prefixed with the wake word):\n");
        for entry in &self.entries {
            let phrases: Vec<&str> = entry.patterns.iter().map(|p| p.phrase()).take(6).collect();
            out.push_str(&format!(
                "  {:<12} {:<34} {}\n",
                entry.action.id(),
                entry.description,
                phrases.join(" / ")
            ));
        }
        out
    }
}

impl CommandTable {
    /// The built-in player commands, English and Czech phrases
    pub fn builtin() -> Result<Self> {
        let track = ["track", "song", "skladbu"];
        let mut table = Self::new();

        table.push(CommandEntry::new(
            Action::Play,
            "Start or resume playback",
            &[
                "play", "start", "begin", "spustit", "přehrát", "resume", "continue",
                "pokračovat",
            ],
        )?);
        table.push(CommandEntry::new(
            Action::Pause,
            "Pause playback",
            &["pause", "stop", "zastavit", "pozastavit", "halt", "freeze", "zmrazit"],
        )?);
        table.push(
            CommandEntry::new(
                Action::Next,
                "Skip to the next track",
                &["next", "další", "forward", "skip", "advance", "advance to next", "pokračuj"],
            )?
            .with_suffixes(&["next", "další", "forward", "skip"], &track)?,
        );
        table.push(
            CommandEntry::new(
                Action::Previous,
                "Go back to the previous track",
                &["previous", "předchozí", "back", "zpět", "go back", "vrať se"],
            )?
            .with_suffixes(&["previous", "předchozí", "back", "zpět"], &track)?,
        );
        table.push(CommandEntry::new(
            Action::VolumeUp,
            "Raise the volume by 10%",
            &[
                "volume up",
                "increase volume",
                "zvýšit hlasitost",
                "zvýši hlasitost",
                "hlasitěji",
                "louder",
                "more volume",
            ],
        )?);
        table.push(CommandEntry::new(
            Action::VolumeDown,
            "Lower the volume by 10%",
            &[
                "volume down",
                "decrease volume",
                "snížit hlasitost",
                "sníži hlasitost",
                "tišeji",
                "quieter",
                "less volume",
            ],
        )?);
        table.push(CommandEntry::new(
            Action::Mute,
            "Mute the sound",
            &["mute", "ztlumit", "silence", "ticho", "turn off sound", "vypnout zvuk"],
        )?);
        table.push(CommandEntry::new(
            Action::Unmute,
            "Restore the sound",
            &["unmute", "zapnout zvuk", "sound on"],
        )?);
        table.push(
            CommandEntry::new(
                Action::Shuffle,
                "Toggle shuffle",
                &["shuffle", "náhodně", "random", "mix", "randomize", "zamíchej"],
            )?
            .with_suffixes(&["shuffle", "náhodně", "random", "mix"], &["playlist", "tracky"])?,
        );
        table.push(
            CommandEntry::new(
                Action::Repeat,
                "Toggle repeat",
                &["repeat", "loop", "opakovat", "smyčka", "replay", "znovu"],
            )?
            .with_suffixes(
                &["repeat", "loop", "opakovat", "smyčka"],
                &["this", "track", "song"],
            )?,
        );
        table.push(CommandEntry::new(
            Action::Restart,
            "Restart the current track",
            &[
                "restart",
                "začátek",
                "beginning",
                "reset",
                "znovu od začátku",
                "start over",
                "od začátku",
            ],
        )?);
        table.push(CommandEntry::new(
            Action::Status,
            "Report what is playing",
            &[
                "what's playing",
                "co hraje",
                "current track",
                "aktuální skladba",
                "status",
                "report",
                "stav",
            ],
        )?);
        table.push(CommandEntry::new(
            Action::Time,
            "Report the time and time remaining",
            &[
                "what time",
                "kolik je hodin",
                "current time",
                "time remaining",
                "zbývající čas",
            ],
        )?);
        table.push(
            CommandEntry::new(
                Action::Bookmark,
                "Bookmark the current position",
                &[
                    "bookmark",
                    "záložka",
                    "mark this",
                    "označ toto",
                    "save position",
                    "ulož pozici",
                ],
            )?
            .with_suffixes(&["bookmark", "záložka", "mark this"], &["position"])?
            .with_suffixes(&["záložka", "označ toto"], &["pozici"])?,
        );
        table.push(CommandEntry::new(
            Action::Fullscreen,
            "Enter fullscreen",
            &["fullscreen", "full screen", "celá obrazovka", "maximize", "maximalizovat"],
        )?);
        table.push(CommandEntry::new(
            Action::Minimize,
            "Leave fullscreen",
            &["minimize", "exit fullscreen", "ukončit celou obrazovku"],
        )?);
        table.push(CommandEntry::new(
            Action::Engage,
            "Engage! Starts playback",
            &["engage", "make it so"],
        )?);
        table.push(CommandEntry::new(
            Action::RedAlert,
            "Full volume and play",
            &["red alert", "poplach"],
        )?);

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_action_ids_round_trip_through_parse() {
        for id in CommandTable::builtin().unwrap().action_ids() {
            let action: Action = id.parse().unwrap();
            assert_eq!(action.id(), id);
        }
    }

    #[test]
    fn test_parse_custom_and_aliases() {
        assert_eq!("custom:lights".parse::<Action>().unwrap(), Action::Custom("lights".into()));
        assert_eq!("volume-up".parse::<Action>().unwrap(), Action::VolumeUp);
        assert_eq!("loop".parse::<Action>().unwrap(), Action::Repeat);
        assert!("custom:".parse::<Action>().is_err());
        assert!("warp9".parse::<Action>().is_err());
    }

    #[test]
    fn test_phrases_are_unique_across_entries() {
        let table = CommandTable::builtin().unwrap();
        let mut seen: HashMap<&str, &Action> = HashMap::new();
        for entry in table.entries() {
            for pattern in &entry.patterns {
                if let Some(previous) = seen.insert(pattern.phrase(), &entry.action) {
                    assert_eq!(
                        previous, &entry.action,
                        "phrase '{}' maps to two actions",
                        pattern.phrase()
                    );
                }
            }
        }
    }

    #[test]
    fn test_pattern_predicates() {
        let pattern = Pattern::new("Volume Up").unwrap();
        assert_eq!(pattern.phrase(), "volume up");
        assert!(pattern.is_exact("volume up"));
        assert!(pattern.is_exact("volume   up"));
        assert!(!pattern.is_exact("volume up please"));
        assert!(pattern.is_within("please volume up now"));
        assert!(!pattern.is_within("volume upstairs"));
    }

    #[test]
    fn test_empty_phrase_is_rejected() {
        for raw in ["", "   ", "?!"] {
            assert!(matches!(Pattern::new(raw), Err(Error::EmptyPattern(_))), "{raw:?}");
        }
        assert!(CommandEntry::new(Action::Next, "", &["next", " "]).is_err());
    }

    #[test]
    fn test_word_boundaries_are_unicode_aware() {
        let mute = Pattern::new("mute").unwrap();
        assert!(!mute.is_within("unmute"));
        let play = Pattern::new("přehrát").unwrap();
        assert!(play.is_within("prosím přehrát hudbu"));
        assert!(!play.is_within("přehráty"));
    }

    #[test]
    fn test_suffix_expansion() {
        let table = CommandTable::builtin().unwrap();
        let next = table
            .entries()
            .iter()
            .find(|e| e.action == Action::Next)
            .unwrap();
        let phrases: Vec<&str> = next.patterns.iter().map(|p| p.phrase()).collect();
        assert!(phrases.contains(&"next track"));
        assert!(phrases.contains(&"další skladbu"));
    }

    #[test]
    fn test_help_lists_every_entry() {
        let table = CommandTable::builtin().unwrap();
        let help = table.help_text();
        assert_eq!(help.lines().count(), table.len() + 1);
        assert!(help.contains("red_alert"));
    }
}
