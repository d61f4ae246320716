//! Live session driver.
//!
//! Feeds a [`Session`] with frame ticks from a tokio interval and commands
//! from an mpsc channel, forwarding every produced event to an
//! [`EventSink`]. Returns once the session completes or is reset.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::sink::EventSink;
use crate::timer::{Clock, Command, Session, SessionStatus};

/// Roughly one display refresh.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed { last_hold_secs: u32 },
    Reset,
}

/// Run `session` to completion (or reset), starting it if idle.
///
/// When the command channel closes the session keeps running on frames
/// alone.
pub async fn drive<C, S>(
    session: &mut Session,
    clock: &C,
    commands: &mut mpsc::Receiver<Command>,
    sink: &mut S,
    frame_interval: Duration,
) -> SessionOutcome
where
    C: Clock,
    S: EventSink,
{
    if !session.is_running() {
        forward(sink, session.handle(Command::Start, clock.now_ms()));
    }

    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut commands_open = true;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                forward(sink, session.tick(clock.now_ms()));
            }
            command = commands.recv(), if commands_open => {
                match command {
                    Some(command) => {
                        debug!(?command, "Command received");
                        forward(sink, session.handle(command, clock.now_ms()));
                    }
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                }
            }
        }

        match session.status() {
            SessionStatus::Running => {}
            SessionStatus::Completed => {
                let last_hold_secs = session.state().last_hold_secs;
                info!(last_hold_secs, "Session finished");
                return SessionOutcome::Completed { last_hold_secs };
            }
            SessionStatus::Idle => {
                info!("Session reset before completion");
                return SessionOutcome::Reset;
            }
        }
    }
}

fn forward<S: EventSink>(sink: &mut S, events: Vec<crate::events::Event>) {
    for event in &events {
        sink.emit(event);
    }
}
