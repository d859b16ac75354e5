//! Persisted voice settings and the export bundle
//!
//! The blob keeps the field names web clients of the player already store
//! (`isEnabled`, `confidenceThreshold`, ...), with millisecond timestamps.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::history::HistoryEntry;

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSettings {
    /// Stored for reference; never re-applied on load
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub confidence_threshold: Option<f32>,
    #[serde(default)]
    pub command_history: Vec<HistoryEntry>,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

pub trait SettingsStore: Send {
    /// None when nothing has been saved yet
    fn load(&mut self) -> Result<Option<PersistedSettings>>;

    fn save(&mut self, settings: &PersistedSettings) -> Result<()>;
}

/// Settings as a JSON file on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<PersistedSettings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let settings = serde_json::from_str(&content)?;
        debug!("Loaded voice settings from {}", self.path.display());
        Ok(Some(settings))
    }

    fn save(&mut self, settings: &PersistedSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::io(&self.path, e))?;
        Ok(())
    }
}

/// In-memory store; clones share contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Option<PersistedSettings>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(settings: PersistedSettings) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Some(settings))),
        }
    }

    pub fn saved(&self) -> Option<PersistedSettings> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&mut self) -> Result<Option<PersistedSettings>> {
        Ok(self.saved())
    }

    fn save(&mut self, settings: &PersistedSettings) -> Result<()> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSettings {
    pub language: String,
    pub confidence_threshold: f32,
}

/// Everything a user may want to carry to another machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub settings: ExportedSettings,
    pub command_history: Vec<HistoryEntry>,
    /// Action identifiers of the command table
    pub command_patterns: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl ExportBundle {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Suggested file name, dated
    pub fn file_name(date: NaiveDate) -> String {
        format!("voice-settings-{}.json", date.format("%Y-%m-%d"))
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(Self::file_name(self.timestamp.date_naive()));
        fs::write(&path, self.to_json()?).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Action;

    fn sample() -> PersistedSettings {
        PersistedSettings {
            is_enabled: true,
            language: Some("en-US".into()),
            confidence_threshold: Some(0.8),
            command_history: vec![HistoryEntry::new("play", Some(Action::Play), 0.9)],
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        }
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested/settings.json"));
        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_blob_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["isEnabled"], true);
        assert_eq!(json["confidenceThreshold"].as_f64().unwrap() as f32, 0.8);
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        assert_eq!(json["commandHistory"][0]["transcript"], "play");
    }

    #[test]
    fn test_partial_blob_loads() {
        let settings: PersistedSettings = serde_json::from_str(r#"{"language":"cs-CZ"}"#).unwrap();
        assert_eq!(settings.language.as_deref(), Some("cs-CZ"));
        assert!(settings.confidence_threshold.is_none());
        assert!(settings.command_history.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonFileStore::new(&path).load(), Err(Error::Json(_))));
    }

    #[test]
    fn test_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ExportBundle {
            settings: ExportedSettings {
                language: "cs-CZ".into(),
                confidence_threshold: 0.7,
            },
            command_history: Vec::new(),
            command_patterns: vec!["play".into(), "pause".into()],
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            version: EXPORT_VERSION.into(),
        };
        let path = bundle.write_to(dir.path()).unwrap();
        assert!(path.ends_with("voice-settings-2023-11-14.json"));
        let back: ExportBundle = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, bundle);
    }
}
