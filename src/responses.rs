//! Canned spoken responses, picked at random per action

use rand::Rng;
use rand::seq::SliceRandom;

use crate::command::Action;

/// Which response list to draw from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind<'a> {
    Action(&'a Action),
    Error,
    Listening,
    Offline,
}

const PLAY: &[&str] = &["Zahajuji přehrávání", "Engaged", "Přehrávání spuštěno", "Aye, captain"];
const PAUSE: &[&str] = &["Přehrávání pozastaveno", "Paused", "Zastaveno", "Acknowledged"];
const NEXT: &[&str] = &["Další skladba", "Advancing to next track", "Pokračuji", "Next track loaded"];
const PREVIOUS: &[&str] = &["Předchozí skladba", "Previous track", "Vracím se", "Going back"];
const VOLUME_UP: &[&str] = &["Zvyšuji hlasitost", "Volume increased", "Hlasitěji", "Audio enhanced"];
const VOLUME_DOWN: &[&str] = &["Snižuji hlasitost", "Volume decreased", "Tišeji", "Audio reduced"];
const MUTE: &[&str] = &["Zvuk ztlumen", "Audio muted", "Ticho", "Sound off"];
const UNMUTE: &[&str] = &["Zvuk obnoven", "Audio restored", "Zvuk zapnut", "Sound on"];
const SHUFFLE: &[&str] = &["Náhodné přehrávání", "Shuffle enabled", "Míchám playlist", "Random mode"];
const REPEAT: &[&str] = &["Opakování zapnuto", "Repeat enabled", "Smyčka aktivní", "Loop engaged"];
const RESTART: &[&str] = &["Začínám znovu", "Restarting track", "Od začátku", "Track reset"];
const BOOKMARK: &[&str] = &["Pozice uložena", "Bookmark saved", "Záložka vytvořena", "Position marked"];
const FULLSCREEN: &[&str] = &["Celá obrazovka", "Fullscreen mode", "Maximalizováno", "Full display"];
const MINIMIZE: &[&str] = &["Obrazovka obnovena", "Fullscreen off", "Zmenšeno", "Normal view"];
const ENGAGE: &[&str] = &["Engaged, captain!", "Make it so!", "Warp speed ahead!", "Systems online!"];
const RED_ALERT: &[&str] = &[
    "Red alert! All hands to battle stations!",
    "Poplach! Všichni na pozice!",
];
const ERROR: &[&str] = &["Příkaz nerozpoznán", "Command not understood", "Neznámý příkaz", "Unable to comply"];
const LISTENING: &[&str] = &["Poslouchám", "Ready for commands", "Computer online", "Standing by"];
const OFFLINE: &[&str] = &["Voice control deaktivován", "Computer offline", "Hlasové ovládání vypnuto"];

/// Spoken by the settings "test voice" control
pub const TEST_PHRASE: &str = "Voice control test successful, captain!";

/// Response list for a kind. Status and time compose their own message and
/// custom commands stay silent.
pub fn lines(kind: &ResponseKind<'_>) -> &'static [&'static str] {
    match kind {
        ResponseKind::Action(action) => match action {
            Action::Play => PLAY,
            Action::Pause => PAUSE,
            Action::Next => NEXT,
            Action::Previous => PREVIOUS,
            Action::VolumeUp => VOLUME_UP,
            Action::VolumeDown => VOLUME_DOWN,
            Action::Mute => MUTE,
            Action::Unmute => UNMUTE,
            Action::Shuffle => SHUFFLE,
            Action::Repeat => REPEAT,
            Action::Restart => RESTART,
            Action::Bookmark => BOOKMARK,
            Action::Fullscreen => FULLSCREEN,
            Action::Minimize => MINIMIZE,
            Action::Engage => ENGAGE,
            Action::RedAlert => RED_ALERT,
            Action::Status | Action::Time | Action::Custom(_) => &[],
        },
        ResponseKind::Error => ERROR,
        ResponseKind::Listening => LISTENING,
        ResponseKind::Offline => OFFLINE,
    }
}

/// Pick a random line, or None when the kind has no canned lines
pub fn pick<R: Rng + ?Sized>(kind: &ResponseKind<'_>, rng: &mut R) -> Option<&'static str> {
    lines(kind).choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_every_player_action_has_lines() {
        let silent = [Action::Status, Action::Time, Action::Custom("x".into())];
        for id in crate::command::CommandTable::builtin().unwrap().action_ids() {
            let action: Action = id.parse().unwrap();
            let kind = ResponseKind::Action(&action);
            assert_eq!(lines(&kind).is_empty(), silent.contains(&action), "{id}");
        }
    }

    #[test]
    fn test_pick_is_from_list() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let line = pick(&ResponseKind::Error, &mut rng).unwrap();
            assert!(ERROR.contains(&line));
        }
        assert!(pick(&ResponseKind::Action(&Action::Status), &mut rng).is_none());
    }
}
