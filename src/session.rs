//! Voice session - owns the recognizer, matcher, dispatcher and feedback queue
//!
//! Everything runs on the caller's thread, one event at a time. The session
//! never reads the clock for scheduling: callers pass `now` in and wait
//! until `next_deadline()` before calling `poll()`.

use std::time::{Duration, Instant};

use chrono::{SubsecRound, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::command::{Action, CommandEntry, CommandTable};
use crate::config::Config;
use crate::dispatch::{ActionDispatcher, PlayerTarget};
use crate::error::Result;
use crate::fuzzy::normalize;
use crate::history::{CommandHistory, HistoryEntry};
use crate::matcher::{CommandMatcher, MatchResult};
use crate::notify::{Level, Notifier};
use crate::recovery::{RestartGate, RetryBudget};
use crate::responses::{ResponseKind, TEST_PHRASE};
use crate::settings::{
    EXPORT_VERSION, ExportBundle, ExportedSettings, PersistedSettings, SettingsStore,
};
use crate::speech::{
    ErrorClass, RecognitionError, RecognitionParams, RecognizerEvent, SpeechSink,
    TranscriptionSource,
};
use crate::tts::SpeechQueue;

/// Runtime bounds for the adjustable confidence gate
pub const MIN_CONFIDENCE_RANGE: (f32, f32) = (0.5, 0.95);

/// Boundary collaborators injected at construction
pub struct Collaborators {
    pub recognizer: Box<dyn TranscriptionSource>,
    pub speech: Box<dyn SpeechSink>,
    pub player: Box<dyn PlayerTarget>,
    pub store: Box<dyn SettingsStore>,
    pub notifier: Box<dyn Notifier>,
}

/// What happened to one final transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Recognizer confidence below the gate; not recorded
    Ignored { confidence: f32 },
    Executed {
        matched: MatchResult,
        confirmation: Option<String>,
    },
    NotUnderstood { transcript: String },
}

pub struct VoiceSession {
    params: RecognitionParams,
    min_confidence: f32,
    persisted_entries: usize,
    auto_restart: bool,
    language_change_delay: Duration,

    matcher: CommandMatcher,
    dispatcher: ActionDispatcher,
    speech: SpeechQueue,
    recognizer: Box<dyn TranscriptionSource>,
    store: Box<dyn SettingsStore>,
    notifier: Box<dyn Notifier>,

    history: CommandHistory,
    retry: RetryBudget,
    gate: RestartGate,

    enabled: bool,
    /// start() accepted, waiting for Started
    starting: bool,
    listening: bool,
    restart_at: Option<Instant>,
    /// A restart came due while feedback was playing
    restart_after_speech: bool,
}

impl VoiceSession {
    /// Build the command table from config, then apply stored settings
    pub fn new(config: &Config, parts: Collaborators) -> Result<Self> {
        let mut table = if config.commands.enable_builtin {
            CommandTable::builtin()?
        } else {
            CommandTable::new()
        };
        for custom in &config.commands.custom {
            table.push(custom.to_entry()?);
        }

        let mut session = Self {
            params: RecognitionParams {
                language: config.recognition.language.clone(),
                max_alternatives: config.recognition.max_alternatives,
                continuous: config.recognition.continuous,
            },
            min_confidence: config.matching.min_confidence,
            persisted_entries: config.history.persisted_entries,
            auto_restart: config.restart.auto_restart,
            language_change_delay: Duration::from_millis(config.restart.language_change_delay_ms),

            matcher: CommandMatcher::new(table, &config.matching),
            dispatcher: ActionDispatcher::new(parts.player),
            speech: SpeechQueue::new(parts.speech, &config.feedback),
            recognizer: parts.recognizer,
            store: parts.store,
            notifier: parts.notifier,

            history: CommandHistory::new(config.history.max_entries),
            retry: RetryBudget::new(&config.retry),
            gate: RestartGate::new(&config.restart),

            enabled: false,
            starting: false,
            listening: false,
            restart_at: None,
            restart_after_speech: false,
        };
        session.load_settings();
        info!(
            "Voice session ready: {} commands, language {}",
            session.matcher.table().len(),
            session.params.language
        );
        Ok(session)
    }

    /// Deterministic confirmation phrases
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.dispatcher = self.dispatcher.with_seed(seed);
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn enable(&mut self, now: Instant) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.retry.reset();
        self.start_listening(now);
        // A failed start may have switched us straight back off
        if !self.enabled {
            return;
        }
        self.say_kind(ResponseKind::Listening);
        self.notify("🎤 Voice Control aktivován", Level::Success);
        self.save();
    }

    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.cancel_restart();
        self.stop_listening();
        self.say_kind(ResponseKind::Offline);
        self.notify("🎤 Voice Control deaktivován", Level::Info);
        self.save();
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.enabled {
            self.disable();
        } else {
            self.enable(now);
        }
    }

    /// Stop everything and flush settings
    pub fn dispose(mut self) {
        self.enabled = false;
        self.cancel_restart();
        self.stop_listening();
        self.speech.cancel();
        self.save();
        info!("Voice session disposed");
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn handle_event(&mut self, event: RecognizerEvent, now: Instant) -> Option<Outcome> {
        match event {
            RecognizerEvent::Started => {
                self.starting = false;
                self.listening = true;
                info!("Recognition started ({})", self.params.language);
                None
            }
            RecognizerEvent::Result {
                transcript,
                confidence,
                is_final,
            } => {
                if !is_final {
                    debug!("Interim: {}", transcript);
                    return None;
                }
                if !self.enabled {
                    debug!("Dropping result while disabled: {}", transcript);
                    return None;
                }
                // Recognizers report Started before failing, so only a result counts as recovery
                self.retry.reset();
                Some(self.process_command(&transcript, confidence))
            }
            RecognizerEvent::Ended => {
                self.starting = false;
                self.listening = false;
                debug!("Recognition ended");
                if self.enabled && self.auto_restart {
                    let at = self.gate.earliest(now);
                    self.schedule_restart(at);
                }
                None
            }
            RecognizerEvent::Error(error) => {
                self.handle_error(error, now);
                None
            }
        }
    }

    /// Gate, match, record and execute one final transcript
    pub fn process_command(&mut self, transcript: &str, confidence: f32) -> Outcome {
        if !confidence.is_finite() || confidence < self.min_confidence {
            debug!(
                "Ignoring '{}': confidence {:.2} below {:.2}",
                transcript, confidence, self.min_confidence
            );
            return Outcome::Ignored { confidence };
        }

        let matched = self.matcher.find(transcript, confidence);
        let text = normalize(transcript);
        self.history.push(HistoryEntry::new(
            &text,
            matched.as_ref().map(|m| m.action.clone()),
            confidence,
        ));
        self.save();

        match matched {
            Some(matched) => {
                let confirmation = self.dispatcher.dispatch(&matched.action);
                if let Some(line) = &confirmation {
                    self.say(line);
                }
                let shown = confirmation.clone().unwrap_or_else(|| matched.action.id());
                self.notify(&format!("🎤 \"{text}\" → {shown}"), Level::Success);
                Outcome::Executed {
                    matched,
                    confirmation,
                }
            }
            None => {
                if let Some(line) = self.dispatcher.respond(ResponseKind::Error) {
                    self.say(&line);
                }
                self.notify(&format!("🎤 Nerozpoznaný příkaz: \"{text}\""), Level::Warn);
                Outcome::NotUnderstood { transcript: text }
            }
        }
    }

    /// The speech sink finished the current utterance
    pub fn speech_finished(&mut self, now: Instant) {
        let drained = self.speech.finished();
        if drained && self.restart_after_speech {
            self.restart_after_speech = false;
            debug!("Feedback done, retrying deferred restart");
            self.try_restart(now);
        }
    }

    /// Run whatever came due by `now`
    pub fn poll(&mut self, now: Instant) {
        match self.restart_at {
            Some(at) if at <= now => {
                self.restart_at = None;
                self.try_restart(now);
            }
            _ => {}
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.restart_at
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Switch recognizer language; a live session restarts shortly after
    pub fn change_language(&mut self, language: &str, now: Instant) {
        let language = language.trim();
        if language.is_empty() {
            return;
        }
        self.params.language = language.to_string();
        self.save();

        if self.listening || self.starting {
            self.stop_listening();
            self.schedule_restart(now + self.language_change_delay);
        }
        self.notify(&format!("Jazyk změněn na: {language}"), Level::Info);
    }

    /// Set the confidence gate, clamped to 0.5..=0.95. Returns the applied value.
    pub fn set_confidence_threshold(&mut self, value: f32) -> f32 {
        if value.is_finite() {
            let (low, high) = MIN_CONFIDENCE_RANGE;
            self.min_confidence = value.clamp(low, high);
            self.save();
        }
        self.min_confidence
    }

    pub fn set_voice_feedback(&mut self, on: bool) {
        self.speech.set_enabled(on);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.save();
        self.notify("Historie příkazů vymazána", Level::Info);
    }

    /// Register phrases for a named handler; they lose ties to existing entries
    pub fn add_custom_command(
        &mut self,
        phrases: &[&str],
        name: &str,
        handler: Box<dyn FnMut() + Send>,
    ) -> Result<()> {
        let entry = CommandEntry::new(Action::Custom(name.to_string()), "Custom command", phrases)?;
        self.matcher.push(entry);
        self.dispatcher.register(name, handler);
        debug!("Registered custom command '{}' ({:?})", name, phrases);
        Ok(())
    }

    pub fn export(&mut self) -> ExportBundle {
        let bundle = ExportBundle {
            settings: ExportedSettings {
                language: self.params.language.clone(),
                confidence_threshold: self.min_confidence,
            },
            command_history: self.history.all(),
            command_patterns: self.matcher.table().action_ids(),
            timestamp: Utc::now().trunc_subsecs(3),
            version: EXPORT_VERSION.to_string(),
        };
        self.notify("📁 Nastavení hlasu exportována", Level::Success);
        bundle
    }

    /// Speak the test phrase
    pub fn test_voice(&mut self) -> bool {
        self.say(TEST_PHRASE)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_speaking(&self) -> bool {
        self.speech.is_speaking()
    }

    /// Newest first
    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history.recent(limit)
    }

    pub fn language(&self) -> &str {
        &self.params.language
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.min_confidence
    }

    pub fn commands(&self) -> &CommandTable {
        self.matcher.table()
    }

    pub fn player(&self) -> &dyn PlayerTarget {
        self.dispatcher.player()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn start_listening(&mut self, now: Instant) {
        if self.listening || self.starting {
            return;
        }
        match self.recognizer.start(&self.params) {
            Ok(()) => {
                self.starting = true;
                self.gate.record(now);
                debug!("Recognizer start requested");
            }
            Err(error) => {
                warn!("Failed to start voice recognition: {}", error);
                self.handle_error(error, now);
            }
        }
    }

    fn stop_listening(&mut self) {
        if self.listening || self.starting {
            self.recognizer.stop();
        }
        self.listening = false;
        self.starting = false;
    }

    fn try_restart(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        if self.speech.is_speaking() {
            debug!("Restart deferred until feedback finishes");
            self.restart_after_speech = true;
            return;
        }
        let earliest = self.gate.earliest(now);
        if earliest > now {
            self.schedule_restart(earliest);
            return;
        }
        self.start_listening(now);
    }

    /// Keep the later of the pending and requested times
    fn schedule_restart(&mut self, at: Instant) {
        let at = self.restart_at.map_or(at, |pending| pending.max(at));
        self.restart_at = Some(at);
    }

    fn cancel_restart(&mut self) {
        self.restart_at = None;
        self.restart_after_speech = false;
    }

    fn handle_error(&mut self, error: RecognitionError, now: Instant) {
        match error.class() {
            ErrorClass::Benign => debug!("Recognizer: {}", error),
            ErrorClass::Permission => {
                warn!("Recognizer permission denied: {}", error);
                self.notify(error.user_message(), Level::Error);
                self.shut_down();
            }
            ErrorClass::Transient => match self.retry.next_delay() {
                Some(delay) => {
                    warn!(
                        "Recognizer error '{}', retry {} in {:?}",
                        error.code(),
                        self.retry.attempts(),
                        delay
                    );
                    self.listening = false;
                    self.starting = false;
                    if self.enabled {
                        self.schedule_restart(now + delay);
                    }
                }
                None => {
                    warn!("Recognizer error '{}', giving up", error.code());
                    self.notify(error.user_message(), Level::Error);
                    self.shut_down();
                }
            },
        }
    }

    /// Forced disable after an unrecoverable error
    fn shut_down(&mut self) {
        self.enabled = false;
        self.cancel_restart();
        self.stop_listening();
        self.save();
    }

    fn say(&mut self, text: &str) -> bool {
        self.speech.say(text, &self.params.language)
    }

    fn say_kind(&mut self, kind: ResponseKind<'_>) {
        if let Some(line) = self.dispatcher.respond(kind) {
            self.say(&line);
        }
    }

    fn notify(&mut self, message: &str, level: Level) {
        self.notifier.notify(message, level);
    }

    fn load_settings(&mut self) {
        let settings = match self.store.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not load voice settings: {}", e);
                return;
            }
        };
        if let Some(language) = settings.language.filter(|l| !l.trim().is_empty()) {
            self.params.language = language;
        }
        if let Some(threshold) = settings
            .confidence_threshold
            .filter(|t| t.is_finite())
        {
            let (low, high) = MIN_CONFIDENCE_RANGE;
            self.min_confidence = threshold.clamp(low, high);
        }
        self.history.restore(settings.command_history);
        debug!(
            "Restored settings: language {}, threshold {:.2}, {} history entries",
            self.params.language,
            self.min_confidence,
            self.history.len()
        );
    }

    fn save(&mut self) {
        let settings = PersistedSettings {
            is_enabled: self.enabled,
            language: Some(self.params.language.clone()),
            confidence_threshold: Some(self.min_confidence),
            command_history: self.history.recent(self.persisted_entries),
            timestamp: Utc::now().trunc_subsecs(3),
        };
        if let Err(e) = self.store.save(&settings) {
            warn!("Could not save voice settings: {}", e);
        }
    }
}
