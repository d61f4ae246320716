//! Breathing session state machine.
//!
//! The session is driven from outside: the caller feeds it frame ticks with
//! the current monotonic time and user commands, and it answers with the
//! events the presenter should act on. There are no internal threads.
//!
//! ## Round Structure
//!
//! ```text
//! Countdown(5s) -> 30 x (Inhale -> Exhale) -> Hold -> DeepInhale
//!     -> ShortHold(15s) -> DeepExhale -> (InterRound(3s) -> next round | Completed)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = Session::new(SessionConfig::default());
//! session.handle(Command::Start, clock.now_ms());
//! // On every frame:
//! for event in session.tick(clock.now_ms()) { present(event); }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::easing::Direction;
use super::hold::HoldTimer;
use super::phase::{CountedPhase, CountingTicker, Delay, Phase, PhaseStatus, Tick, TimedPhase};
use super::schedule::{
    SessionConfig, BREATHS_PER_ROUND, COUNTDOWN_SECS, GRACE_MS, INTER_ROUND_MS, SHORT_HOLD_SECS,
};
use crate::events::{AnimationKind, Cue, Event};

/// User intents accepted by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    Resume,
    TogglePause,
    /// End the current timed phase early and move on.
    Cancel,
    /// End retention early ("breathe in"). Only honoured once the button is shown.
    SkipHold,
    Reset,
    SetSound { enabled: bool },
}

/// Mutable progress of a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_round: u32,
    pub breath_count: u32,
    pub phase: Phase,
    pub paused: bool,
    pub cancel_requested: bool,
    /// Actual retention of the most recently finished round, in seconds.
    pub last_hold_secs: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_round: 1,
            breath_count: 0,
            phase: Phase::GetReady,
            paused: false,
            cancel_requested: false,
            last_hold_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone)]
enum Stage {
    Idle,
    Countdown(CountedPhase),
    Breathing {
        breath: u32,
        exhaling: bool,
        driver: TimedPhase,
    },
    Hold {
        target_secs: u32,
        timer: HoldTimer,
    },
    DeepInhale(TimedPhase),
    ShortHold(CountedPhase),
    DeepExhale(TimedPhase),
    InterRound(Delay),
    Completed,
}

impl Stage {
    fn observe(&mut self, now_ms: u64, paused: bool) {
        match self {
            Stage::Countdown(p) | Stage::ShortHold(p) => p.observe(now_ms, paused),
            Stage::Breathing { driver, .. } => driver.observe(now_ms, paused),
            Stage::Hold { timer, .. } => timer.observe(now_ms, paused),
            Stage::DeepInhale(p) | Stage::DeepExhale(p) => p.observe(now_ms, paused),
            Stage::InterRound(d) => d.observe(now_ms, paused),
            Stage::Idle | Stage::Completed => {}
        }
    }

    fn tick(&mut self, tick: &Tick, out: &mut Vec<Event>) -> PhaseStatus {
        match self {
            Stage::Countdown(p) | Stage::ShortHold(p) => p.tick(tick, out),
            Stage::Breathing { driver, .. } => driver.tick(tick, out),
            Stage::Hold { timer, .. } => timer.tick(tick, out),
            Stage::DeepInhale(p) | Stage::DeepExhale(p) => p.tick(tick, out),
            Stage::InterRound(d) => d.tick(tick),
            Stage::Idle | Stage::Completed => PhaseStatus::Running,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Countdown(_) => "countdown",
            Stage::Breathing { .. } => "breathing",
            Stage::Hold { .. } => "hold",
            Stage::DeepInhale(_) => "deep_inhale",
            Stage::ShortHold(_) => "short_hold",
            Stage::DeepExhale(_) => "deep_exhale",
            Stage::InterRound(_) => "inter_round",
            Stage::Completed => "completed",
        }
    }
}

/// Round controller: owns the session state and sequences the phases.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    stage: Stage,
    sound_enabled: bool,
    tip_index: usize,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: config.sanitized(),
            state: SessionState::default(),
            stage: Stage::Idle,
            sound_enabled: false,
            tip_index: 0,
        }
    }

    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn status(&self) -> SessionStatus {
        match self.stage {
            Stage::Idle => SessionStatus::Idle,
            Stage::Completed => SessionStatus::Completed,
            _ => SessionStatus::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status() == SessionStatus::Running
    }

    /// True while the retention's breathe-in button is visible.
    pub fn breathe_in_available(&self) -> bool {
        matches!(&self.stage, Stage::Hold { timer, .. } if timer.breathe_in_shown())
    }

    /// Name of the current internal stage, for logs and status output.
    pub fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn handle(&mut self, command: Command, now_ms: u64) -> Vec<Event> {
        let mut out = Vec::new();
        match command {
            Command::Start => {
                if self.is_running() {
                    return out;
                }
                self.state = SessionState::default();
                self.tip_index = 0;
                info!(
                    rounds = self.config.rounds,
                    base_hold_secs = self.config.base_hold_secs,
                    breath_duration_secs = self.config.breath_duration_secs,
                    "Starting breathing session"
                );
                out.push(Event::SessionStarted {
                    config: self.config,
                    at: Utc::now(),
                });
                out.push(Event::AudioStopped);
                self.enter_round(now_ms, &mut out);
            }
            Command::Pause => self.set_paused(true, now_ms, &mut out),
            Command::Resume => self.set_paused(false, now_ms, &mut out),
            Command::TogglePause => {
                let paused = !self.state.paused;
                self.set_paused(paused, now_ms, &mut out);
            }
            Command::Cancel => {
                if self.is_running() {
                    debug!(stage = self.stage.name(), "Cancellation requested");
                    self.state.cancel_requested = true;
                }
            }
            Command::SkipHold => {
                if self.breathe_in_available() {
                    debug!("Retention ended early");
                    self.state.cancel_requested = true;
                    self.advance(now_ms, &mut out);
                    self.play_cue(Cue::BackgroundBreathing, &mut out);
                }
            }
            Command::Reset => {
                info!(stage = self.stage.name(), "Session reset");
                self.stage = Stage::Idle;
                self.state = SessionState::default();
                out.push(Event::Progress { percent: 0.0 });
                out.push(Event::AudioStopped);
                out.push(Event::TipHidden);
                out.push(Event::BreatheInHidden);
                out.push(Event::BreathingAnimation {
                    kind: AnimationKind::None,
                    duration_ms: 0,
                });
                out.push(Event::Reset { at: Utc::now() });
            }
            Command::SetSound { enabled } => {
                self.sound_enabled = enabled;
                if !enabled {
                    out.push(Event::AudioStopped);
                } else if self.is_running() {
                    self.replay_phase_cues(&mut out);
                }
            }
        }
        out
    }

    /// Advance on a frame. Returns the events produced during this frame.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut out = Vec::new();
        if self.is_running() {
            self.advance(now_ms, &mut out);
        }
        out
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn frame(&self, now_ms: u64) -> Tick {
        Tick {
            now_ms,
            paused: self.state.paused,
            cancelled: self.state.cancel_requested,
            sound: self.sound_enabled,
        }
    }

    fn set_paused(&mut self, paused: bool, now_ms: u64, out: &mut Vec<Event>) {
        if !self.is_running() || self.state.paused == paused {
            return;
        }
        self.state.paused = paused;
        self.stage.observe(now_ms, paused);
        debug!(paused, stage = self.stage.name(), "Pause toggled");
        out.push(if paused {
            Event::Paused { at: Utc::now() }
        } else {
            Event::Resumed { at: Utc::now() }
        });
    }

    fn advance(&mut self, now_ms: u64, out: &mut Vec<Event>) {
        let tick = self.frame(now_ms);
        match self.stage.tick(&tick, out) {
            PhaseStatus::Running => {}
            status => {
                if status == PhaseStatus::Cancelled {
                    self.state.cancel_requested = false;
                }
                self.next_stage(now_ms, out);
            }
        }
    }

    fn next_stage(&mut self, now_ms: u64, out: &mut Vec<Event>) {
        let stage = std::mem::replace(&mut self.stage, Stage::Idle);
        match stage {
            Stage::Countdown(_) => {
                out.push(Event::Progress { percent: 0.0 });
                self.stop_cue(Cue::Countdown, out);
                self.state.breath_count = 0;
                self.play_cue(Cue::BackgroundBreathing, out);
                self.enter_inhale(1, now_ms, out);
            }
            Stage::Breathing {
                breath,
                exhaling: false,
                ..
            } => self.enter_exhale(breath, now_ms, out),
            Stage::Breathing {
                breath,
                exhaling: true,
                ..
            } => {
                if breath < BREATHS_PER_ROUND {
                    self.enter_inhale(breath + 1, now_ms, out);
                } else {
                    self.animate(AnimationKind::None, 0, out);
                    self.enter_hold(now_ms, out);
                }
            }
            Stage::Hold { target_secs, timer } => {
                let held_secs = timer.held_secs(now_ms);
                self.state.last_hold_secs = held_secs;
                self.tip_index = timer.next_tip_index();
                info!(
                    round = self.state.current_round,
                    held_secs, target_secs, "Retention finished"
                );
                out.push(Event::HoldRecorded {
                    round: self.state.current_round,
                    held_secs,
                    target_secs,
                });
                if timer.breathe_in_shown() {
                    out.push(Event::BreatheInHidden);
                }
                if self.config.tip_count > 0 {
                    out.push(Event::TipHidden);
                }
                self.enter_deep_inhale(now_ms, out);
            }
            Stage::DeepInhale(_) => {
                self.animate(AnimationKind::None, 0, out);
                self.enter_short_hold(now_ms, out);
            }
            Stage::ShortHold(_) => self.enter_deep_exhale(now_ms, out),
            Stage::DeepExhale(_) => {
                self.animate(AnimationKind::None, 0, out);
                if self.state.current_round < self.config.rounds {
                    let next_round = self.state.current_round + 1;
                    debug!(next_round, "Pausing between rounds");
                    out.push(Event::InterRoundMessage { next_round });
                    self.stage = Stage::InterRound(Delay::new(INTER_ROUND_MS, now_ms));
                } else {
                    self.complete(out);
                }
            }
            Stage::InterRound(_) => {
                out.push(Event::InterRoundMessageHidden);
                self.state.current_round += 1;
                self.enter_round(now_ms, out);
            }
            Stage::Idle | Stage::Completed => self.stage = stage,
        }
    }

    fn enter_round(&mut self, now_ms: u64, out: &mut Vec<Event>) {
        let round = self.state.current_round;
        let hold_secs = self.config.hold_secs(round);
        info!(round, total_rounds = self.config.rounds, hold_secs, "Round started");
        out.push(Event::RoundStarted {
            round,
            total_rounds: self.config.rounds,
            hold_secs,
        });

        self.enter_phase(Phase::GetReady, out);
        self.play_cue(Cue::Countdown, out);
        let progress = TimedPhase::new(COUNTDOWN_SECS as u64 * 1000, Direction::Decreasing, now_ms);
        let counter = CountingTicker::start(COUNTDOWN_SECS, now_ms, out);
        self.stage = Stage::Countdown(CountedPhase::new(progress, counter));
    }

    fn enter_inhale(&mut self, breath: u32, now_ms: u64, out: &mut Vec<Event>) {
        self.state.breath_count = breath;
        self.enter_phase(Phase::Inhale, out);
        out.push(Event::Counter {
            value: Some(breath),
        });
        let duration_ms = self.config.inhale_ms(breath);
        self.animate(AnimationKind::Inhale, duration_ms, out);
        self.play_cue(Cue::Inhale, out);
        self.stage = Stage::Breathing {
            breath,
            exhaling: false,
            driver: TimedPhase::new(duration_ms, Direction::Increasing, now_ms),
        };
    }

    fn enter_exhale(&mut self, breath: u32, now_ms: u64, out: &mut Vec<Event>) {
        self.enter_phase(Phase::Exhale, out);
        let duration_ms = self.config.breath_ms();
        self.animate(AnimationKind::Exhale, duration_ms, out);
        self.play_cue(Cue::Exhale, out);
        self.stage = Stage::Breathing {
            breath,
            exhaling: true,
            driver: TimedPhase::new(duration_ms, Direction::Decreasing, now_ms),
        };
    }

    fn enter_hold(&mut self, now_ms: u64, out: &mut Vec<Event>) {
        let target_secs = self.config.hold_secs(self.state.current_round);
        // Retention always starts running, even if the user paused during the last breath.
        if self.state.paused {
            self.state.paused = false;
            out.push(Event::Resumed { at: Utc::now() });
        }
        self.enter_phase(Phase::Hold, out);
        self.animate(AnimationKind::Hold, target_secs as u64 * 1000, out);
        self.stop_cue(Cue::BackgroundBreathing, out);
        self.play_cue(Cue::BackgroundHold, out);
        let timer = HoldTimer::start(
            target_secs,
            now_ms,
            self.config.tip_count,
            self.tip_index,
            out,
        );
        self.stage = Stage::Hold { target_secs, timer };
    }

    fn enter_deep_inhale(&mut self, now_ms: u64, out: &mut Vec<Event>) {
        self.enter_phase(Phase::DeepInhale, out);
        out.push(Event::Counter { value: None });
        let duration_ms = self.config.deep_breath_ms();
        self.animate(AnimationKind::Inhale, duration_ms, out);
        self.stop_cue(Cue::BackgroundHold, out);
        self.play_cue(Cue::Inhale, out);
        self.stage = Stage::DeepInhale(
            TimedPhase::new(duration_ms, Direction::Reverse, now_ms).with_grace(GRACE_MS),
        );
    }

    fn enter_short_hold(&mut self, now_ms: u64, out: &mut Vec<Event>) {
        self.enter_phase(Phase::Hold, out);
        let duration_ms = SHORT_HOLD_SECS as u64 * 1000;
        self.animate(AnimationKind::Hold, duration_ms, out);
        self.stop_cue(Cue::BackgroundBreathing, out);
        self.play_cue(Cue::BackgroundHold, out);
        let progress =
            TimedPhase::new(duration_ms, Direction::Increasing, now_ms).with_final_countdown();
        let counter = CountingTicker::start(SHORT_HOLD_SECS, now_ms, out);
        self.stage = Stage::ShortHold(CountedPhase::new(progress, counter));
    }

    fn enter_deep_exhale(&mut self, now_ms: u64, out: &mut Vec<Event>) {
        self.enter_phase(Phase::DeepExhale, out);
        out.push(Event::Counter { value: None });
        let duration_ms = self.config.deep_breath_ms();
        self.animate(AnimationKind::Exhale, duration_ms, out);
        self.play_cue(Cue::Exhale, out);
        self.stop_cue(Cue::BackgroundHold, out);
        self.play_cue(Cue::BackgroundBreathing, out);
        self.stage = Stage::DeepExhale(
            TimedPhase::new(duration_ms, Direction::Decreasing, now_ms).with_grace(GRACE_MS),
        );
    }

    fn complete(&mut self, out: &mut Vec<Event>) {
        info!(
            rounds = self.config.rounds,
            last_hold_secs = self.state.last_hold_secs,
            "Session completed"
        );
        self.stage = Stage::Completed;
        self.state.phase = Phase::GetReady;
        self.state.paused = false;
        out.push(Event::AudioStopped);
        out.push(Event::Completed {
            last_hold_secs: self.state.last_hold_secs,
            at: Utc::now(),
        });
    }

    fn enter_phase(&mut self, phase: Phase, out: &mut Vec<Event>) {
        debug!(
            round = self.state.current_round,
            breath = self.state.breath_count,
            phase = phase.label(),
            "Phase changed"
        );
        self.state.phase = phase;
        out.push(Event::PhaseChanged {
            phase,
            round: self.state.current_round,
            total_rounds: self.config.rounds,
        });
    }

    fn animate(&self, kind: AnimationKind, duration_ms: u64, out: &mut Vec<Event>) {
        out.push(Event::BreathingAnimation { kind, duration_ms });
    }

    fn play_cue(&self, cue: Cue, out: &mut Vec<Event>) {
        if self.sound_enabled {
            out.push(Event::CuePlayed { cue });
        }
    }

    fn stop_cue(&self, cue: Cue, out: &mut Vec<Event>) {
        if self.sound_enabled {
            out.push(Event::CueStopped { cue });
        }
    }

    /// Cues for the phase in progress, used when sound is switched on mid-session.
    fn replay_phase_cues(&self, out: &mut Vec<Event>) {
        let cues: &[Cue] = match self.state.phase {
            Phase::GetReady => &[Cue::Countdown],
            Phase::Inhale => &[Cue::Inhale, Cue::BackgroundBreathing],
            Phase::Exhale => &[Cue::Exhale, Cue::BackgroundBreathing],
            Phase::Hold => &[Cue::BackgroundHold],
            Phase::DeepInhale => &[Cue::Inhale],
            Phase::DeepExhale => &[Cue::Exhale, Cue::BackgroundBreathing],
        };
        for &cue in cues {
            self.play_cue(cue, out);
        }
    }
}
