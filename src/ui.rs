use std::io::Write;

use crate::history::HistoryEntry;
use crate::matcher::MatchResult;
use crate::notify::Level;
use crate::session::Outcome;

pub fn speaking(text: &str) {
    print!("\r\x1b[K\x1b[35m♪ {}\x1b[0m\n", text);
    std::io::stdout().flush().ok();
}

pub fn clear_line() {
    print!("\r\x1b[K");
    std::io::stdout().flush().ok();
}

pub fn notification(message: &str, level: Level) {
    let color = match level {
        Level::Info => "36",
        Level::Success => "32",
        Level::Warn => "33",
        Level::Error => "31",
    };
    print!("\r\x1b[K\x1b[{}m[{}]\x1b[0m {}\n", color, level, message);
    std::io::stdout().flush().ok();
}

pub fn show_match(result: &MatchResult) {
    println!(
        "{} \x1b[90m({} on '{}', score {:.2})\x1b[0m",
        result.action, result.method, result.pattern, result.score
    );
}

pub fn show_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Ignored { confidence } => {
            println!("\r\x1b[K\x1b[90m(ignored, confidence {:.2})\x1b[0m", confidence);
        }
        Outcome::Executed { matched, .. } => {
            print!("\r\x1b[K→ ");
            show_match(matched);
        }
        Outcome::NotUnderstood { .. } => {}
    }
}

pub fn show_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("\x1b[90m(no commands yet)\x1b[0m");
        return;
    }
    for entry in entries {
        let action = entry
            .action
            .as_ref()
            .map(|a| a.id())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "\x1b[90m{}\x1b[0m  {:<12} {:.2}  {}",
            entry.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
            action,
            entry.confidence,
            entry.transcript
        );
    }
}
