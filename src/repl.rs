//! REPL input handling - typed transcripts and slash commands

/// Confidence assumed for typed lines without an explicit value
pub const TYPED_CONFIDENCE: f32 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A line standing in for a final recognizer result
    Heard { transcript: String, confidence: f32 },
    Command(SlashCommand),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    On,
    Off,
    History(usize),
    Lang(String),
    Threshold(f32),
    Clear,
    Export,
    Test,
    Status,
    /// Recognition session ends on its own
    End,
    /// Inject a recognizer error code
    Fail(String),
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
  <words>[|confidence]  speak a command, e.g. `computer, play|0.9`
  /on /off              enable or disable voice control
  /history [n]          recent commands (default 10)
  /lang <code>          recognizer language, e.g. en-US
  /threshold <0..1>     confidence gate (clamped to 0.50..0.95)
  /clear                clear command history
  /export               write settings bundle to the current directory
  /test                 speak the test phrase
  /status               session and player state
  /end                  simulate the recognizer timing out
  /error <code>         simulate a recognizer error (network, not-allowed, ...)
  /quit                 exit";

/// Parse one typed line
pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if let Some(rest) = line.strip_prefix('/') {
        return Input::Command(parse_command(rest));
    }

    // "transcript|confidence"; a tail that is not a number is part of the text
    if let Some((text, tail)) = line.rsplit_once('|') {
        if let Some(confidence) = tail.trim().parse::<f32>().ok().filter(|c| c.is_finite()) {
            return Input::Heard {
                transcript: text.trim().to_string(),
                confidence: confidence.clamp(0.0, 1.0),
            };
        }
    }
    Input::Heard {
        transcript: line.to_string(),
        confidence: TYPED_CONFIDENCE,
    }
}

fn parse_command(rest: &str) -> SlashCommand {
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.collect::<Vec<_>>().join(" ");

    match name.as_str() {
        "on" | "enable" => SlashCommand::On,
        "off" | "disable" => SlashCommand::Off,
        "history" | "h" => {
            if arg.is_empty() {
                SlashCommand::History(10)
            } else {
                match arg.parse() {
                    Ok(n) => SlashCommand::History(n),
                    Err(_) => SlashCommand::Invalid(format!("/history expects a number, got '{arg}'")),
                }
            }
        }
        "lang" | "language" if !arg.is_empty() => SlashCommand::Lang(arg),
        "lang" | "language" => SlashCommand::Invalid("/lang expects a language code".into()),
        "threshold" | "confidence" => match arg.parse::<f32>() {
            Ok(value) => SlashCommand::Threshold(value),
            Err(_) => SlashCommand::Invalid(format!("/threshold expects a number, got '{arg}'")),
        },
        "clear" => SlashCommand::Clear,
        "export" => SlashCommand::Export,
        "test" => SlashCommand::Test,
        "status" => SlashCommand::Status,
        "end" => SlashCommand::End,
        "error" if !arg.is_empty() => SlashCommand::Fail(arg),
        "error" => SlashCommand::Invalid("/error expects an error code".into()),
        "help" | "?" => SlashCommand::Help,
        "quit" | "exit" | "q" => SlashCommand::Quit,
        other => SlashCommand::Invalid(format!("Unknown command /{other}, try /help")),
    }
}
