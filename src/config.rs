use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::command::{Action, CommandEntry};
use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "engage.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub restart: RestartConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    /// Where voice settings are persisted; platform data dir when unset
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            matching: MatchingConfig::default(),
            history: HistoryConfig::default(),
            feedback: FeedbackConfig::default(),
            restart: RestartConfig::default(),
            retry: RetryConfig::default(),
            commands: CommandsConfig::default(),
            settings_path: None,
        }
    }
}

// ============================================================================
// Recognition Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionConfig {
    /// BCP-47 language tag handed to the recognizer
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: u32,
    #[serde(default = "default_true")]
    pub continuous: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            max_alternatives: default_max_alternatives(),
            continuous: true,
        }
    }
}

fn default_language() -> String {
    "cs-CZ".into()
}

fn default_max_alternatives() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Matching Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    /// Utterances below this recognizer confidence are ignored entirely
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// A match must score strictly above this
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,

    #[serde(default = "default_fuzzy_min_similarity")]
    pub fuzzy_min_similarity: f32,

    /// Optional word(s) in front of a command; empty disables
    #[serde(default = "default_wake_prefix")]
    pub wake_prefix: Option<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            match_threshold: default_match_threshold(),
            fuzzy_min_similarity: default_fuzzy_min_similarity(),
            wake_prefix: default_wake_prefix(),
        }
    }
}

fn default_min_confidence() -> f32 {
    0.7
}

fn default_match_threshold() -> f32 {
    0.3
}

fn default_fuzzy_min_similarity() -> f32 {
    0.5
}

fn default_wake_prefix() -> Option<String> {
    Some("computer".into())
}

// ============================================================================
// History / Feedback Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// How many of the newest entries are saved with the settings
    #[serde(default = "default_persisted_entries")]
    pub persisted_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            persisted_entries: default_persisted_entries(),
        }
    }
}

fn default_max_entries() -> usize {
    50
}

fn default_persisted_entries() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    /// Speak confirmations
    #[serde(default = "default_true")]
    pub voice: bool,
    #[serde(default = "default_one")]
    pub rate: f32,
    #[serde(default = "default_one")]
    pub pitch: f32,
    #[serde(default = "default_feedback_volume")]
    pub volume: f32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            voice: true,
            rate: 1.0,
            pitch: 1.0,
            volume: default_feedback_volume(),
        }
    }
}

fn default_one() -> f32 {
    1.0
}

fn default_feedback_volume() -> f32 {
    0.8
}

// ============================================================================
// Restart / Retry Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RestartConfig {
    /// Restart recognition when a session ends while enabled
    #[serde(default = "default_true")]
    pub auto_restart: bool,
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,
    #[serde(default = "default_language_change_delay")]
    pub language_change_delay_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            auto_restart: true,
            min_interval_ms: default_min_interval(),
            language_change_delay_ms: default_language_change_delay(),
        }
    }
}

fn default_min_interval() -> u64 {
    1000
}

fn default_language_change_delay() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    8000
}

// ============================================================================
// Commands Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
    /// Enable built-in commands
    #[serde(default = "default_true")]
    pub enable_builtin: bool,

    /// Extra phrases, appended after the built-in table
    #[serde(default)]
    pub custom: Vec<CustomCommand>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            enable_builtin: true,
            custom: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CustomCommand {
    pub phrase: String,
    /// Built-in action id or `custom:<name>`
    pub action: String,
}

impl CustomCommand {
    pub fn to_entry(&self) -> Result<CommandEntry> {
        let action: Action = self.action.parse()?;
        CommandEntry::new(action, "Configured phrase", &[self.phrase.as_str()])
    }
}

impl Config {
    /// Load from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("engage")
                .join("voice-settings.json")
        })
    }
}
