//! Spoken feedback - FIFO queue in front of a SpeechSink
//!
//! Only one utterance is handed to the sink at a time. The next one goes
//! out when the sink reports the previous one finished.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::FeedbackConfig;
use crate::speech::{SpeechSink, Utterance};

pub struct SpeechQueue {
    sink: Box<dyn SpeechSink>,
    pending: VecDeque<Utterance>,
    current: Option<Utterance>,
    enabled: bool,
    rate: f32,
    pitch: f32,
    volume: f32,
}

impl SpeechQueue {
    pub fn new(sink: Box<dyn SpeechSink>, config: &FeedbackConfig) -> Self {
        Self {
            sink,
            pending: VecDeque::new(),
            current: None,
            enabled: config.voice,
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume.clamp(0.0, 1.0),
        }
    }

    /// Queue a line for speaking. Returns false if voice feedback is off.
    pub fn say(&mut self, text: &str, lang: &str) -> bool {
        if !self.enabled || text.trim().is_empty() {
            return false;
        }
        let utterance = Utterance {
            text: text.to_string(),
            lang: lang.to_string(),
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
        };
        if self.current.is_some() {
            debug!("Queued speech ({} waiting): {}", self.pending.len() + 1, utterance);
            self.pending.push_back(utterance);
        } else {
            self.start(utterance);
        }
        true
    }

    /// The sink finished the current utterance; start the next one.
    /// Returns true once the queue has drained.
    pub fn finished(&mut self) -> bool {
        self.current = None;
        match self.pending.pop_front() {
            Some(next) => {
                self.start(next);
                false
            }
            None => true,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop everything queued and silence the sink
    pub fn cancel(&mut self) {
        self.pending.clear();
        if self.current.take().is_some() {
            self.sink.cancel();
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.cancel();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn start(&mut self, utterance: Utterance) {
        self.sink.speak(&utterance);
        self.current = Some(utterance);
    }
}
