//! Action dispatcher - runs a matched action against the player
//!
//! A missing control or player is a no-op, logged at debug level.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{Local, NaiveTime};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::command::Action;
use crate::responses::{self, ResponseKind};

/// Player buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Play,
    Pause,
    Next,
    Previous,
    Mute,
    Shuffle,
    Loop,
    Reset,
    Fullscreen,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Control::Play => "play-button",
            Control::Pause => "pause-button",
            Control::Next => "next-button",
            Control::Previous => "prev-button",
            Control::Mute => "mute-button",
            Control::Shuffle => "shuffle-button",
            Control::Loop => "loop-button",
            Control::Reset => "reset-button",
            Control::Fullscreen => "fullscreen-toggle",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("{0} is not available")]
    Missing(String),
}

impl TargetError {
    pub fn missing(what: impl fmt::Display) -> Self {
        TargetError::Missing(what.to_string())
    }
}

/// Player state as seen by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub paused: bool,
    pub muted: bool,
    /// 0..=1
    pub volume: f32,
    pub position: Duration,
    /// None while unknown (nothing loaded, live stream)
    pub duration: Option<Duration>,
    pub title: Option<String>,
    pub fullscreen: bool,
}

/// The audio player being controlled
pub trait PlayerTarget: Send {
    fn press(&mut self, control: Control) -> Result<(), TargetError>;

    /// None when no player is present
    fn snapshot(&self) -> Option<PlayerSnapshot>;

    fn set_volume(&mut self, volume: f32) -> Result<(), TargetError>;

    fn exit_fullscreen(&mut self) -> Result<(), TargetError>;

    fn add_bookmark(&mut self) -> Result<(), TargetError>;
}

type Handler = Box<dyn FnMut() + Send>;

const VOLUME_STEP: f32 = 0.1;
const NO_PLAYER: &str = "Audio přehrávač není dostupný";
const NO_BOOKMARKS: &str = "Bookmark manager není dostupný";
const UNKNOWN_TRACK: &str = "Neznámý track";

pub struct ActionDispatcher {
    player: Box<dyn PlayerTarget>,
    handlers: HashMap<String, Handler>,
    rng: StdRng,
}

impl ActionDispatcher {
    pub fn new(player: Box<dyn PlayerTarget>) -> Self {
        Self {
            player,
            handlers: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic response choice
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn register(&mut self, name: &str, handler: Handler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn player(&self) -> &dyn PlayerTarget {
        self.player.as_ref()
    }

    /// Random line for a non-action response (error, listening, offline)
    pub fn respond(&mut self, kind: ResponseKind<'_>) -> Option<String> {
        responses::pick(&kind, &mut self.rng).map(String::from)
    }

    /// Execute an action. Returns the confirmation to speak, if any.
    pub fn dispatch(&mut self, action: &Action) -> Option<String> {
        debug!("Executing {}", action);
        let mut confirmation = self.respond(ResponseKind::Action(action));

        match action {
            Action::Play | Action::Engage => {
                if self.player.snapshot().is_some_and(|s| s.paused) {
                    self.press(Control::Play);
                }
            }
            Action::Pause => {
                if self.player.snapshot().is_some_and(|s| !s.paused) {
                    self.press(Control::Pause);
                }
            }
            Action::Next => self.press(Control::Next),
            Action::Previous => self.press(Control::Previous),
            Action::VolumeUp => self.adjust_volume(VOLUME_STEP),
            Action::VolumeDown => self.adjust_volume(-VOLUME_STEP),
            Action::Mute => self.press(Control::Mute),
            Action::Unmute => {
                if self.player.snapshot().is_some_and(|s| s.muted) {
                    self.press(Control::Mute);
                }
            }
            Action::Shuffle => self.press(Control::Shuffle),
            Action::Repeat => self.press(Control::Loop),
            Action::Restart => self.press(Control::Reset),
            Action::Fullscreen => self.press(Control::Fullscreen),
            Action::Minimize => {
                if self.player.snapshot().is_some_and(|s| s.fullscreen) {
                    let result = self.player.exit_fullscreen();
                    ignore_missing(action, result);
                }
            }
            Action::Status => {
                confirmation = Some(status_message(self.player.snapshot().as_ref()));
            }
            Action::Time => {
                let now = Local::now().time();
                confirmation = Some(time_message(now, self.player.snapshot().as_ref()));
            }
            Action::Bookmark => {
                if let Err(e) = self.player.add_bookmark() {
                    debug!("bookmark: {}", e);
                    confirmation = Some(NO_BOOKMARKS.to_string());
                }
            }
            Action::RedAlert => {
                if self.player.snapshot().is_some() {
                    let result = self.player.set_volume(1.0);
                    ignore_missing(action, result);
                    self.press(Control::Play);
                }
            }
            Action::Custom(name) => match self.handlers.get_mut(name) {
                Some(handler) => handler(),
                None => debug!("No handler registered for custom command '{}'", name),
            },
        }

        confirmation
    }

    fn press(&mut self, control: Control) {
        if let Err(e) = self.player.press(control) {
            debug!("press {}: {}", control, e);
        }
    }

    fn adjust_volume(&mut self, delta: f32) {
        let Some(snapshot) = self.player.snapshot() else {
            debug!("volume: no player");
            return;
        };
        let volume = (snapshot.volume + delta).clamp(0.0, 1.0);
        if let Err(e) = self.player.set_volume(volume) {
            debug!("volume: {}", e);
        }
    }
}

fn ignore_missing(action: &Action, result: Result<(), TargetError>) {
    if let Err(e) = result {
        debug!("{}: {}", action, e);
    }
}

/// Spoken duration: "{h} hodin {m} minut", "{m} minut {s} sekund" or "{s} sekund"
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h} hodin {m} minut")
    } else if m > 0 {
        format!("{m} minut {s} sekund")
    } else {
        format!("{s} sekund")
    }
}

pub fn status_message(snapshot: Option<&PlayerSnapshot>) -> String {
    let Some(player) = snapshot else {
        return NO_PLAYER.to_string();
    };
    let state = if player.paused { "pozastaven" } else { "přehrává" };
    let title = player
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNKNOWN_TRACK);
    let volume = (player.volume * 100.0).round() as u32;
    format!(
        "Aktuálně {state}: {title}. Hlasitost {volume} procent. Pozice {}.",
        format_duration(player.position)
    )
}

pub fn time_message(now: NaiveTime, snapshot: Option<&PlayerSnapshot>) -> String {
    let mut message = format!("Aktuální čas: {}", now.format("%H:%M:%S"));
    let known = snapshot.and_then(|s| s.duration.filter(|d| !d.is_zero()).map(|d| (d, s.position)));
    if let Some((duration, position)) = known {
        let remaining = duration.saturating_sub(position);
        message.push_str(&format!(". Zbývá {} skladby.", format_duration(remaining)));
    }
    message
}
