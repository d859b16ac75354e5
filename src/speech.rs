//! Speech collaborators - recognizer in, synthesizer out
//!
//! Both sides are platform services; the session only sees these traits and
//! the event model.

use std::fmt;

/// Recognition error as reported by the recognizer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("no speech detected")]
    NoSpeech,
    #[error("recognition aborted")]
    Aborted,
    #[error("audio capture failed")]
    AudioCapture,
    #[error("network error")]
    Network,
    #[error("microphone access denied")]
    NotAllowed,
    #[error("recognition service not allowed")]
    ServiceNotAllowed,
    #[error("recognizer error: {0}")]
    Other(String),
}

/// How the session reacts to a recognition error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Ignored
    Benign,
    /// Disables the feature and notifies
    Permission,
    /// Retried with backoff
    Transient,
}

impl RecognitionError {
    /// Map a recognizer error code (`no-speech`, `not-allowed`, ...)
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => RecognitionError::NoSpeech,
            "aborted" => RecognitionError::Aborted,
            "audio-capture" => RecognitionError::AudioCapture,
            "network" => RecognitionError::Network,
            "not-allowed" => RecognitionError::NotAllowed,
            "service-not-allowed" => RecognitionError::ServiceNotAllowed,
            other => RecognitionError::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            RecognitionError::NoSpeech => "no-speech",
            RecognitionError::Aborted => "aborted",
            RecognitionError::AudioCapture => "audio-capture",
            RecognitionError::Network => "network",
            RecognitionError::NotAllowed => "not-allowed",
            RecognitionError::ServiceNotAllowed => "service-not-allowed",
            RecognitionError::Other(code) => code,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            RecognitionError::NoSpeech | RecognitionError::Aborted => ErrorClass::Benign,
            RecognitionError::NotAllowed | RecognitionError::ServiceNotAllowed => {
                ErrorClass::Permission
            }
            RecognitionError::AudioCapture
            | RecognitionError::Network
            | RecognitionError::Other(_) => ErrorClass::Transient,
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            RecognitionError::NoSpeech => "Žádný hlas nebyl detekován",
            RecognitionError::AudioCapture => "Chyba při záznamu zvuku",
            RecognitionError::NotAllowed => "Přístup k mikrofonu byl odepřen",
            RecognitionError::Network => "Chyba sítě při rozpoznávání",
            RecognitionError::ServiceNotAllowed => "Služba rozpoznávání není povolena",
            RecognitionError::Aborted | RecognitionError::Other(_) => {
                "Chyba hlasového rozpoznávání"
            }
        }
    }
}

/// Events emitted by a recognizer, fed to the session in order
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    Started,
    Result {
        transcript: String,
        confidence: f32,
        is_final: bool,
    },
    /// Recognition session ended (naturally or after stop)
    Ended,
    Error(RecognitionError),
}

impl RecognizerEvent {
    /// A final result, the shape most adapters produce
    pub fn heard(transcript: impl Into<String>, confidence: f32) -> Self {
        RecognizerEvent::Result {
            transcript: transcript.into(),
            confidence,
            is_final: true,
        }
    }
}

/// Recognizer settings applied on start
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionParams {
    pub language: String,
    pub max_alternatives: u32,
    pub continuous: bool,
}

/// Platform speech-to-text
pub trait TranscriptionSource: Send {
    /// Begin a recognition session; `Started` arrives as an event
    fn start(&mut self, params: &RecognitionParams) -> Result<(), RecognitionError>;

    /// End the current session; `Ended` arrives as an event
    fn stop(&mut self);
}

/// One queued line of spoken feedback
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Platform text-to-speech; completion is reported back to the session
pub trait SpeechSink: Send {
    fn speak(&mut self, utterance: &Utterance);

    /// Drop whatever is being spoken
    fn cancel(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_round_trip() {
        for code in [
            "no-speech",
            "aborted",
            "audio-capture",
            "network",
            "not-allowed",
            "service-not-allowed",
            "bad-grammar",
        ] {
            assert_eq!(RecognitionError::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(RecognitionError::NoSpeech.class(), ErrorClass::Benign);
        assert_eq!(RecognitionError::Aborted.class(), ErrorClass::Benign);
        assert_eq!(RecognitionError::NotAllowed.class(), ErrorClass::Permission);
        assert_eq!(
            RecognitionError::ServiceNotAllowed.class(),
            ErrorClass::Permission
        );
        assert_eq!(RecognitionError::Network.class(), ErrorClass::Transient);
        assert_eq!(RecognitionError::AudioCapture.class(), ErrorClass::Transient);
        assert_eq!(
            RecognitionError::from_code("language-not-supported").class(),
            ErrorClass::Transient
        );
    }
}
