use std::time::Duration;

use breathwork_core::{drive, Command, Config, Dispatcher, MonotonicClock, Session, SessionOutcome};
use chrono::Local;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::SettingsArgs;
use crate::presenter::{format_duration, JsonLines, TerminalBell, TerminalPresenter, TIPS};

#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
    /// Play audio cues (overrides preferences.sound_enabled)
    #[arg(long)]
    pub sound: Option<bool>,
    /// Print events as JSON lines instead of text
    #[arg(long)]
    pub json: bool,
    /// Include per-frame progress events in JSON output
    #[arg(long, requires = "json")]
    pub frames: bool,
    /// Speed factor for the session clock
    #[arg(long, default_value_t = 1.0, hide = true)]
    pub time_scale: f64,
    /// Frame interval in milliseconds
    #[arg(long, default_value_t = 16, hide = true)]
    pub frame_ms: u64,
}

/// Map one line of terminal input to a session command.
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "b" => Some(Command::SkipHold),
        "p" | "pause" => Some(Command::TogglePause),
        "c" | "n" | "next" => Some(Command::Cancel),
        "q" | "quit" | "stop" => Some(Command::Reset),
        "sound on" => Some(Command::SetSound { enabled: true }),
        "sound off" => Some(Command::SetSound { enabled: false }),
        _ => None,
    }
}

pub fn run(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let session_config = args.settings.resolve(&config).with_tip_count(TIPS.len());
    let sound = args.sound.unwrap_or(config.preferences.sound_enabled);
    let mut session = Session::new(session_config).with_sound(sound);

    if !args.json {
        println!(
            "Starting {} rounds, about {} (started {})",
            session_config.rounds,
            format_duration(session_config.plan().total_ms),
            Local::now().format("%H:%M")
        );
        println!("Enter: breathe in | p: pause | c: next phase | q: stop");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let outcome = runtime.block_on(async {
        let (tx, mut rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match parse_command(&line) {
                    Some(command) => {
                        if tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    None => debug!(%line, "Ignoring unknown input"),
                }
            }
        });

        let clock = MonotonicClock::scaled(args.time_scale);
        let frame = Duration::from_millis(args.frame_ms.max(1));
        if args.json {
            let mut sink = JsonLines::new(std::io::stdout(), args.frames);
            drive(&mut session, &clock, &mut rx, &mut sink, frame).await
        } else {
            let mut sink = Dispatcher::new(
                TerminalPresenter::new(std::io::stdout()),
                TerminalBell::default(),
                TerminalPresenter::new(std::io::stdout()),
            );
            drive(&mut session, &clock, &mut rx, &mut sink, frame).await
        }
    });

    // The stdin reader blocks on a worker thread; don't wait for it.
    runtime.shutdown_background();

    if args.json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else if let SessionOutcome::Reset = outcome {
        println!("Stopped at {}", Local::now().format("%H:%M"));
    }
    Ok(())
}
