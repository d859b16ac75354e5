use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use engage::config::{Config, DEFAULT_CONFIG_FILE};
use engage::console::{self, ConsoleNotifier, ConsoleSink, SpeechEvent, StdinRecognizer};
use engage::dispatch::status_message;
use engage::repl::{self, Input, SlashCommand};
use engage::settings::{JsonFileStore, SettingsStore};
use engage::sim::SimulatedPlayer;
use engage::speech::{RecognitionError, RecognizerEvent};
use engage::{CommandMatcher, CommandTable, Collaborators, VoiceSession, ui};

#[derive(Parser)]
#[command(name = "engage", version, about = "Voice commands for an audio player")]
struct Cli {
    /// Config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Drive a session from typed transcripts against a simulated player (default)
    Listen,

    /// Match one transcript and print the result
    Match {
        transcript: String,
        /// Recognizer confidence for the transcript
        #[arg(long, default_value_t = 1.0)]
        confidence: f32,
    },

    /// List the voice commands
    Commands,

    /// Show the persisted command history
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[hotpath::main]
fn main() -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => run_listen(config).await,
        Command::Match {
            transcript,
            confidence,
        } => run_match(&config, &transcript, confidence),
        Command::Commands => {
            print!("{}", command_table(&config)?.help_text());
            Ok(())
        }
        Command::History { limit } => run_history(&config, limit),
    }
}

fn command_table(config: &Config) -> Result<CommandTable> {
    let mut table = if config.commands.enable_builtin {
        CommandTable::builtin()?
    } else {
        CommandTable::new()
    };
    for custom in &config.commands.custom {
        let entry = custom
            .to_entry()
            .with_context(|| format!("Invalid custom command '{}'", custom.phrase))?;
        table.push(entry);
    }
    Ok(table)
}

fn run_match(config: &Config, transcript: &str, confidence: f32) -> Result<()> {
    if !confidence.is_finite() || confidence < config.matching.min_confidence {
        println!(
            "ignored: confidence {:.2} below {:.2}",
            confidence, config.matching.min_confidence
        );
        return Ok(());
    }
    let matcher = CommandMatcher::new(command_table(config)?, &config.matching);
    match matcher.find(transcript, confidence) {
        Some(result) => ui::show_match(&result),
        None => println!("not understood"),
    }
    Ok(())
}

fn run_history(config: &Config, limit: usize) -> Result<()> {
    let path = config.settings_path();
    let mut store = JsonFileStore::new(&path);
    let settings = store
        .load()
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries = settings
        .map(|s| s.command_history.into_iter().take(limit).collect::<Vec<_>>())
        .unwrap_or_default();
    ui::show_history(&entries);
    Ok(())
}

async fn run_listen(config: Config) -> Result<()> {
    let (event_tx, event_rx) = flume::unbounded::<RecognizerEvent>();
    let (speech_tx, speech_rx) = flume::unbounded::<SpeechEvent>();
    let (input_tx, input_rx) = flume::unbounded::<SlashCommand>();
    let (quit_tx, quit_rx) = flume::bounded::<()>(1);

    let recognizer = StdinRecognizer::new(event_tx);
    let feed = recognizer.feed();
    let player = SimulatedPlayer::new();
    let store = JsonFileStore::new(config.settings_path());
    debug!("Voice settings at {}", store.path().display());

    let mut session = VoiceSession::new(
        &config,
        Collaborators {
            recognizer: Box::new(recognizer),
            speech: Box::new(ConsoleSink::new(speech_tx)),
            player: Box::new(player.clone()),
            store: Box::new(store),
            notifier: Box::new(ConsoleNotifier),
        },
    )
    .context("Failed to create voice session")?;

    ctrlc::set_handler(move || {
        let _ = quit_tx.try_send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    // Input thread: transcripts go straight to the recognizer feed
    let input_feed = feed.clone();
    thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            match repl::parse_line(&line) {
                Input::Heard {
                    transcript,
                    confidence,
                } => {
                    if !input_feed.heard(&transcript, confidence) {
                        println!("\x1b[90m(not listening, /on to enable)\x1b[0m");
                    }
                }
                Input::Command(command) => {
                    if input_tx.send(command).is_err() {
                        return;
                    }
                }
                Input::Empty => {}
            }
        }
        let _ = input_tx.send(SlashCommand::Quit);
    });

    println!(
        "Type commands as if spoken, e.g. \"computer, play\" or \"ztlumit|0.8\". /help for more.\n"
    );
    session.enable(Instant::now());

    let mut speech_done: Option<tokio::time::Instant> = None;

    loop {
        let restart_deadline = session.next_deadline().map(tokio::time::Instant::from_std);
        let restart_fut = async move {
            match restart_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        let speech_deadline = speech_done;
        let speech_fut = async move {
            match speech_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            Ok(()) = quit_rx.recv_async() => break,

            Ok(command) = input_rx.recv_async() => {
                if !handle_command(command, &mut session, &feed, &player) {
                    break;
                }
            }

            Ok(event) = event_rx.recv_async() => {
                if let Some(outcome) = session.handle_event(event, Instant::now()) {
                    ui::show_outcome(&outcome);
                }
            }

            Ok(event) = speech_rx.recv_async() => {
                speech_done = match event {
                    SpeechEvent::Started(utterance) => {
                        Some(tokio::time::Instant::now() + console::speaking_time(&utterance))
                    }
                    SpeechEvent::Cancelled => None,
                };
            }

            _ = speech_fut, if speech_done.is_some() => {
                speech_done = None;
                session.speech_finished(Instant::now());
            }

            _ = restart_fut, if restart_deadline.is_some() => {
                session.poll(Instant::now());
            }
        }
    }

    ui::clear_line();
    session.dispose();
    println!("Computer offline.");
    Ok(())
}

/// Returns false when the session should end
fn handle_command(
    command: SlashCommand,
    session: &mut VoiceSession,
    feed: &console::TranscriptFeed,
    player: &SimulatedPlayer,
) -> bool {
    let now = Instant::now();
    match command {
        SlashCommand::On => session.enable(now),
        SlashCommand::Off => session.disable(),
        SlashCommand::History(limit) => ui::show_history(&session.history(limit)),
        SlashCommand::Lang(code) => session.change_language(&code, now),
        SlashCommand::Threshold(value) => {
            let applied = session.set_confidence_threshold(value);
            println!("Confidence threshold {:.0}%", applied * 100.0);
        }
        SlashCommand::Clear => session.clear_history(),
        SlashCommand::Export => {
            let bundle = session.export();
            let written = std::env::current_dir()
                .map_err(anyhow::Error::from)
                .and_then(|dir| bundle.write_to(&dir).map_err(anyhow::Error::from));
            match written {
                Ok(path) => println!("Wrote {}", path.display()),
                Err(e) => eprintln!("Export failed: {e:#}"),
            }
        }
        SlashCommand::Test => {
            if !session.test_voice() {
                println!("Voice feedback is off");
            }
        }
        SlashCommand::Status => {
            println!(
                "enabled: {}  listening: {}  language: {}  threshold: {:.2}",
                session.is_enabled(),
                session.is_listening(),
                session.language(),
                session.confidence_threshold()
            );
            println!("{}", status_message(Some(&player.state())));
        }
        SlashCommand::End => feed.end(),
        SlashCommand::Fail(code) => feed.fail(RecognitionError::from_code(&code)),
        SlashCommand::Help => println!("{}", repl::HELP),
        SlashCommand::Quit => return false,
        SlashCommand::Invalid(message) => println!("{message}"),
    }
    true
}
