//! Workout Timer - headless runner
//!
//! Runs one workout in the terminal: announces each round, plays the cue,
//! and exits once the session is back at setup.

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use workout_timer::config::{config_path, Config};
use workout_timer::tts::Announcer;
use workout_timer::{controller, logging, Session, SessionStatus};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of rounds (defaults to the configured value)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: Option<u32>,

    /// Cue clip URL or file path
    #[arg(short, long)]
    audio: Option<String>,

    /// Speech engine: system, speechd or none
    #[arg(long)]
    tts: Option<String>,

    /// Preferred voice (case-insensitive name fragment)
    #[arg(long)]
    voice: Option<String>,

    /// List available voices and exit
    #[arg(long)]
    list_voices: bool,

    /// Write the given overrides to the config file
    #[arg(long)]
    save_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(rounds) = self.rounds {
            config.default_rounds = rounds;
        }
        if let Some(audio) = &self.audio {
            config.audio_source = audio.clone();
        }
        if let Some(tts) = &self.tts {
            config.tts_engine = tts.clone();
        }
        if let Some(voice) = &self.voice {
            config.preferred_voice = voice.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    args.apply(&mut config);

    logging::init(args.verbose, &config.log_level)?;
    info!("🏋️ Workout Timer v{} starting...", env!("CARGO_PKG_VERSION"));

    if args.save_config {
        config.save()?;
        info!("💾 Config saved to {}", config_path().display());
    }

    if args.list_voices {
        return list_voices(&config).await;
    }

    let (controller, handle) = controller::from_config(&config).await?;
    let controller_task = controller.spawn();
    let mut snapshots = handle.subscribe();
    handle.start()?;

    println!("Commands: [Enter] or p = pause/resume, c = cancel, q = quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut tracker = RunTracker::default();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = snapshots.borrow_and_update().clone();
                if let Some(line) = tracker.observe(&session) {
                    println!("{}", line);
                }
                if tracker.finished {
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => match line? {
                Some(line) => match line.trim() {
                    "" | "p" => handle.toggle_pause()?,
                    "c" => handle.cancel()?,
                    "q" => {
                        handle.cancel()?;
                        break;
                    }
                    other => warn!("Unknown command '{}'", other),
                },
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Interrupted");
                handle.cancel()?;
                break;
            }
        }
    }

    handle.shutdown()?;
    controller_task.await?;

    match tracker.error {
        Some(error) => Err(anyhow::anyhow!(error)),
        None => Ok(()),
    }
}

async fn list_voices(config: &Config) -> Result<()> {
    let announcer = Announcer::from_config(config).await;
    let selected = announcer.selected_voice();
    let voices = announcer.voices();

    if voices.is_empty() {
        println!("No voices reported by '{}'", announcer.engine_name());
    }
    for voice in voices {
        let marker = if selected.as_deref() == Some(voice.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, voice);
    }

    announcer.shutdown();
    Ok(())
}

/// Turns session snapshots into terminal output and decides when the run is over
#[derive(Debug, Default)]
struct RunTracker {
    /// The session left idle setup at least once
    engaged: bool,
    finished: bool,
    error: Option<String>,
    last_line: Option<String>,
}

impl RunTracker {
    fn observe(&mut self, session: &Session) -> Option<String> {
        let idle = session.status() == SessionStatus::Setup && !session.cue_pending();
        if !idle {
            self.engaged = true;
        } else if self.engaged || session.last_error().is_some() {
            self.finished = true;
            self.error = session.last_error().map(str::to_string);
        }

        let line = describe(session);
        if self.last_line.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last_line = Some(line.clone());
        Some(line)
    }
}

fn describe(session: &Session) -> String {
    if let Some(error) = session.last_error() {
        return format!("⚠️ {}", error);
    }
    match session.status() {
        SessionStatus::Setup if session.cue_pending() => {
            format!("📢 Round {}...", session.current_round())
        }
        SessionStatus::Setup => "Ready".to_string(),
        SessionStatus::Playing | SessionStatus::Paused => {
            // Ten-percent steps keep the terminal readable
            let decile = (session.progress_percent() / 10.0).floor() as u32 * 10;
            let paused = if session.status() == SessionStatus::Paused {
                " (paused)"
            } else {
                ""
            };
            format!(
                "Round {}/{} {:>3}%{}",
                session.current_round(),
                session.total_rounds(),
                decile,
                paused
            )
        }
        SessionStatus::Completed => "✅ Session finished. Great job!".to_string(),
    }
}
