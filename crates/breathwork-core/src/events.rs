use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, SessionConfig};

/// Audio cues the sequencer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Countdown,
    Inhale,
    Exhale,
    BackgroundBreathing,
    BackgroundHold,
}

/// Breathing-circle animation requested for the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    Inhale,
    Exhale,
    Hold,
    None,
}

/// Every observable output of a session is an Event.
///
/// Presenters never read session state directly; they consume these in
/// order. Frame-level events (progress, counter) carry no timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        config: SessionConfig,
        at: DateTime<Utc>,
    },
    RoundStarted {
        round: u32,
        total_rounds: u32,
        hold_secs: u32,
    },
    PhaseChanged {
        phase: Phase,
        round: u32,
        total_rounds: u32,
    },
    /// Progress ring position, 0..=100.
    Progress {
        percent: f64,
    },
    /// Big counter in the middle of the circle. `None` clears it.
    Counter {
        value: Option<u32>,
    },
    BreathingAnimation {
        kind: AnimationKind,
        duration_ms: u64,
    },
    BreatheInShown,
    BreatheInHidden,
    TipShown {
        index: usize,
    },
    TipHidden,
    InterRoundMessage {
        next_round: u32,
    },
    InterRoundMessageHidden,
    /// Actual hold measured at the end of a round's retention phase.
    HoldRecorded {
        round: u32,
        held_secs: u32,
        target_secs: u32,
    },
    CuePlayed {
        cue: Cue,
    },
    CueStopped {
        cue: Cue,
    },
    AudioStopped,
    Paused {
        at: DateTime<Utc>,
    },
    Resumed {
        at: DateTime<Utc>,
    },
    Completed {
        last_hold_secs: u32,
        at: DateTime<Utc>,
    },
    Reset {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for per-frame updates a log would want to skip.
    pub fn is_frame_update(&self) -> bool {
        matches!(self, Event::Progress { .. })
    }
}
