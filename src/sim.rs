//! In-memory audio player, used by the CLI and tests

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::dispatch::{Control, PlayerSnapshot, PlayerTarget, TargetError};

#[derive(Debug, Clone)]
struct Track {
    title: String,
    length: Duration,
}

#[derive(Debug)]
struct SimState {
    present: bool,
    paused: bool,
    muted: bool,
    volume: f32,
    position: Duration,
    fullscreen: bool,
    shuffle: bool,
    looping: bool,
    tracks: Vec<Track>,
    current: usize,
    bookmarks: Vec<(String, Duration)>,
    presses: Vec<Control>,
}

/// Cloning shares the same player
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    inner: Arc<Mutex<SimState>>,
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlayer {
    /// Paused player with a short playlist loaded
    pub fn new() -> Self {
        let tracks = [
            ("Where No One Has Gone Before", 222),
            ("The Enterprise", 337),
            ("Red Alert", 95),
        ]
        .into_iter()
        .map(|(title, secs)| Track {
            title: title.to_string(),
            length: Duration::from_secs(secs),
        })
        .collect();

        Self {
            inner: Arc::new(Mutex::new(SimState {
                present: true,
                paused: true,
                muted: false,
                volume: 0.8,
                position: Duration::ZERO,
                fullscreen: false,
                shuffle: false,
                looping: false,
                tracks,
                current: 0,
                bookmarks: Vec::new(),
                presses: Vec::new(),
            })),
        }
    }

    /// No player on the page; every call fails as missing
    pub fn absent() -> Self {
        let player = Self::new();
        player.lock().present = false;
        player
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every control pressed so far, in order
    pub fn presses(&self) -> Vec<Control> {
        self.lock().presses.clone()
    }

    pub fn state(&self) -> PlayerSnapshot {
        let state = self.lock();
        snapshot_of(&state)
    }

    pub fn bookmarks(&self) -> Vec<(String, Duration)> {
        self.lock().bookmarks.clone()
    }

    pub fn shuffle(&self) -> bool {
        self.lock().shuffle
    }

    pub fn looping(&self) -> bool {
        self.lock().looping
    }

    /// Move the playhead, e.g. to give status reports something to say
    pub fn seek(&self, position: Duration) {
        let mut state = self.lock();
        let length = state.tracks[state.current].length;
        state.position = position.min(length);
    }
}

fn snapshot_of(state: &SimState) -> PlayerSnapshot {
    let track = &state.tracks[state.current];
    PlayerSnapshot {
        paused: state.paused,
        muted: state.muted,
        volume: state.volume,
        position: state.position,
        duration: Some(track.length),
        title: Some(track.title.clone()),
        fullscreen: state.fullscreen,
    }
}

impl PlayerTarget for SimulatedPlayer {
    fn press(&mut self, control: Control) -> Result<(), TargetError> {
        let mut state = self.lock();
        if !state.present {
            return Err(TargetError::missing(control));
        }
        state.presses.push(control);

        let count = state.tracks.len();
        match control {
            Control::Play => state.paused = false,
            Control::Pause => state.paused = true,
            Control::Next => {
                state.current = (state.current + 1) % count;
                state.position = Duration::ZERO;
            }
            Control::Previous => {
                state.current = (state.current + count - 1) % count;
                state.position = Duration::ZERO;
            }
            Control::Mute => state.muted = !state.muted,
            Control::Shuffle => state.shuffle = !state.shuffle,
            Control::Loop => state.looping = !state.looping,
            Control::Reset => state.position = Duration::ZERO,
            Control::Fullscreen => state.fullscreen = !state.fullscreen,
        }
        Ok(())
    }

    fn snapshot(&self) -> Option<PlayerSnapshot> {
        let state = self.lock();
        state.present.then(|| snapshot_of(&state))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), TargetError> {
        let mut state = self.lock();
        if !state.present {
            return Err(TargetError::missing("volume-slider"));
        }
        state.volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), TargetError> {
        let mut state = self.lock();
        if !state.present {
            return Err(TargetError::missing("fullscreen"));
        }
        state.fullscreen = false;
        Ok(())
    }

    fn add_bookmark(&mut self) -> Result<(), TargetError> {
        let mut state = self.lock();
        if !state.present {
            return Err(TargetError::missing("bookmark manager"));
        }
        let mark = (state.tracks[state.current].title.clone(), state.position);
        state.bookmarks.push(mark);
        Ok(())
    }
}
