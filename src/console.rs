//! Terminal stand-ins for the platform speech services
//!
//! Typed lines play the part of final recognizer results; spoken feedback is
//! printed and "finishes" after a length-based delay driven by the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use flume::Sender;
use tracing::debug;

use crate::notify::{Level, Notifier};
use crate::speech::{
    RecognitionError, RecognitionParams, RecognizerEvent, SpeechSink, TranscriptionSource, Utterance,
};
use crate::ui;

/// Recognizer fed from the terminal. Events go out on a channel; typed
/// transcripts are only forwarded while a recognition session is live.
pub struct StdinRecognizer {
    events: Sender<RecognizerEvent>,
    live: Arc<AtomicBool>,
}

impl StdinRecognizer {
    pub fn new(events: Sender<RecognizerEvent>) -> Self {
        Self {
            events,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for the input thread
    pub fn feed(&self) -> TranscriptFeed {
        TranscriptFeed {
            events: self.events.clone(),
            live: Arc::clone(&self.live),
        }
    }
}

impl TranscriptionSource for StdinRecognizer {
    fn start(&mut self, params: &RecognitionParams) -> Result<(), RecognitionError> {
        if self.live.swap(true, Ordering::SeqCst) {
            return Err(RecognitionError::Other("already-started".into()));
        }
        debug!("Console recognizer started ({})", params.language);
        self.events
            .send(RecognizerEvent::Started)
            .map_err(|_| RecognitionError::AudioCapture)
    }

    fn stop(&mut self) {
        if self.live.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(RecognizerEvent::Ended);
        }
    }
}

/// Sending side used by the input thread
#[derive(Clone)]
pub struct TranscriptFeed {
    events: Sender<RecognizerEvent>,
    live: Arc<AtomicBool>,
}

impl TranscriptFeed {
    /// Forward a transcript; false if nothing is listening
    pub fn heard(&self, transcript: &str, confidence: f32) -> bool {
        if !self.live.load(Ordering::SeqCst) {
            return false;
        }
        self.events
            .send(RecognizerEvent::heard(transcript, confidence))
            .is_ok()
    }

    /// Recognition session ends on its own (silence timeout)
    pub fn end(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(RecognizerEvent::Ended);
        }
    }

    /// Recognizer failure followed by the end of the session
    pub fn fail(&self, error: RecognitionError) {
        let _ = self.events.send(RecognizerEvent::Error(error));
        self.end();
    }
}

/// What the console sink did, for the driving loop
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Started(Utterance),
    Cancelled,
}

pub struct ConsoleSink {
    events: Sender<SpeechEvent>,
}

impl ConsoleSink {
    pub fn new(events: Sender<SpeechEvent>) -> Self {
        Self { events }
    }
}

impl SpeechSink for ConsoleSink {
    fn speak(&mut self, utterance: &Utterance) {
        ui::speaking(&utterance.text);
        let _ = self.events.send(SpeechEvent::Started(utterance.clone()));
    }

    fn cancel(&mut self) {
        let _ = self.events.send(SpeechEvent::Cancelled);
    }
}

/// Rough time a synthesizer needs for an utterance
pub fn speaking_time(utterance: &Utterance) -> Duration {
    let chars = utterance.text.chars().count() as f32;
    let rate = if utterance.rate > 0.0 { utterance.rate } else { 1.0 };
    Duration::from_millis((chars * 60.0 / rate).max(400.0) as u64)
}

/// Prints notifications in the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, message: &str, level: Level) {
        debug!(target: "engage::notify", %level, "{}", message);
        ui::notification(message, level);
    }
}
