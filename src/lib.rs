//! Voice command control for an audio player.
//!
//! Final transcripts from a recognizer are matched against a table of
//! command phrases (English and Czech, optional "computer" wake prefix) and
//! the winning action is executed against a [`dispatch::PlayerTarget`].
//! [`session::VoiceSession`] owns the whole loop.

pub mod command;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod fuzzy;
pub mod history;
pub mod matcher;
pub mod notify;
pub mod recovery;
pub mod repl;
pub mod responses;
pub mod session;
pub mod settings;
pub mod sim;
pub mod speech;
pub mod tts;
pub mod ui;
pub mod wake;

pub use command::{Action, CommandEntry, CommandTable};
pub use config::Config;
pub use error::{Error, Result};
pub use matcher::{CommandMatcher, MatchMethod, MatchResult};
pub use session::{Collaborators, Outcome, VoiceSession};
