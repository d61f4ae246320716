//! Timed phase drivers.
//!
//! Each driver is a small state machine advanced by [`Tick`]s from the
//! session. A tick carries the current time and the session-wide pause,
//! cancel and sound flags; drivers push presenter events into the supplied
//! buffer and report whether they are still running.
//!
//! ```text
//! cancel? -> Cancelled
//! paused? -> Running (no advance)
//! elapsed -> progress event -> final countdown cue (once) -> Finished?
//! ```

use serde::{Deserialize, Serialize};

use super::clock::PauseClock;
use super::easing::{ease_in_out_sine, linear_fraction, Direction};
use crate::events::{Cue, Event};

/// How long before the end of a hold the countdown cue plays.
pub const FINAL_COUNTDOWN_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    GetReady,
    Inhale,
    Exhale,
    Hold,
    DeepInhale,
    DeepExhale,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::GetReady => "Get Ready",
            Phase::Inhale => "Inhale",
            Phase::Exhale => "Exhale",
            Phase::Hold => "Hold",
            Phase::DeepInhale => "Deep Inhale",
            Phase::DeepExhale => "Deep Exhale",
        }
    }
}

/// One scheduling step as seen by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub now_ms: u64,
    pub paused: bool,
    pub cancelled: bool,
    pub sound: bool,
}

impl Tick {
    pub fn at(now_ms: u64) -> Self {
        Self {
            now_ms,
            paused: false,
            cancelled: false,
            sound: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Running,
    Finished,
    /// Ended early because cancellation was requested.
    Cancelled,
}

impl PhaseStatus {
    pub fn is_done(self) -> bool {
        self != PhaseStatus::Running
    }
}

/// Pause-aware sleep.
#[derive(Debug, Clone)]
pub struct Delay {
    duration_ms: u64,
    clock: PauseClock,
}

impl Delay {
    pub fn new(duration_ms: u64, now_ms: u64) -> Self {
        Self {
            duration_ms,
            clock: PauseClock::begin(now_ms),
        }
    }

    pub fn observe(&mut self, now_ms: u64, paused: bool) {
        self.clock.observe(now_ms, paused);
    }

    pub fn tick(&mut self, tick: &Tick) -> PhaseStatus {
        if tick.cancelled {
            return PhaseStatus::Cancelled;
        }
        self.clock.observe(tick.now_ms, tick.paused);
        if self.clock.elapsed_ms(tick.now_ms) >= self.duration_ms {
            PhaseStatus::Finished
        } else {
            PhaseStatus::Running
        }
    }
}

/// Drives the progress ring through one phase with ease-in-out motion.
#[derive(Debug, Clone)]
pub struct TimedPhase {
    duration_ms: u64,
    direction: Direction,
    grace_ms: u64,
    final_countdown: bool,
    countdown_played: bool,
    clock: PauseClock,
    settling: Option<Delay>,
}

impl TimedPhase {
    pub fn new(duration_ms: u64, direction: Direction, now_ms: u64) -> Self {
        Self {
            duration_ms,
            direction,
            grace_ms: 0,
            final_countdown: false,
            countdown_played: false,
            clock: PauseClock::begin(now_ms),
            settling: None,
        }
    }

    /// Wait this long after reaching the end before finishing.
    pub fn with_grace(mut self, grace_ms: u64) -> Self {
        self.grace_ms = grace_ms;
        self
    }

    /// Play the countdown cue once, five seconds before the end.
    pub fn with_final_countdown(mut self) -> Self {
        self.final_countdown = true;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.clock.elapsed_ms(now_ms)
    }

    pub fn observe(&mut self, now_ms: u64, paused: bool) {
        self.clock.observe(now_ms, paused);
        if let Some(delay) = self.settling.as_mut() {
            delay.observe(now_ms, paused);
        }
    }

    pub fn tick(&mut self, tick: &Tick, out: &mut Vec<Event>) -> PhaseStatus {
        if tick.cancelled {
            return PhaseStatus::Cancelled;
        }
        self.clock.observe(tick.now_ms, tick.paused);

        if let Some(delay) = self.settling.as_mut() {
            return delay.tick(tick);
        }
        if tick.paused {
            return PhaseStatus::Running;
        }

        let elapsed = self.clock.elapsed_ms(tick.now_ms);
        let linear = linear_fraction(elapsed, self.duration_ms);
        let eased = ease_in_out_sine(linear);
        out.push(Event::Progress {
            percent: self.direction.progress_percent(eased),
        });

        if self.final_countdown
            && !self.countdown_played
            && elapsed >= self.duration_ms.saturating_sub(FINAL_COUNTDOWN_MS)
        {
            self.countdown_played = true;
            if tick.sound {
                out.push(Event::CuePlayed {
                    cue: Cue::Countdown,
                });
            }
        }

        if linear < 1.0 {
            return PhaseStatus::Running;
        }
        if self.grace_ms == 0 {
            return PhaseStatus::Finished;
        }
        let mut delay = Delay::new(self.grace_ms, tick.now_ms);
        let status = delay.tick(tick);
        self.settling = Some(delay);
        status
    }
}

/// Counts an integer down once per active second, emitting every value.
#[derive(Debug, Clone)]
pub struct CountingTicker {
    seconds: u32,
    remaining: u32,
    clock: PauseClock,
}

impl CountingTicker {
    /// Start counting from `seconds`; the starting value is emitted at once.
    pub fn start(seconds: u32, now_ms: u64, out: &mut Vec<Event>) -> Self {
        out.push(Event::Counter {
            value: Some(seconds),
        });
        Self {
            seconds,
            remaining: seconds,
            clock: PauseClock::begin(now_ms),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn observe(&mut self, now_ms: u64, paused: bool) {
        self.clock.observe(now_ms, paused);
    }

    pub fn tick(&mut self, tick: &Tick, out: &mut Vec<Event>) -> PhaseStatus {
        if tick.cancelled {
            return PhaseStatus::Cancelled;
        }
        self.clock.observe(tick.now_ms, tick.paused);
        if tick.paused {
            return PhaseStatus::Running;
        }

        let whole_secs = self.clock.elapsed_ms(tick.now_ms) / 1000;
        let target = self
            .seconds
            .saturating_sub(u32::try_from(whole_secs).unwrap_or(u32::MAX));
        while self.remaining > target {
            self.remaining -= 1;
            out.push(Event::Counter {
                value: Some(self.remaining),
            });
        }

        if self.remaining == 0 {
            PhaseStatus::Finished
        } else {
            PhaseStatus::Running
        }
    }
}

/// A progress phase and a counter running side by side. Done only when both
/// are done; cancellation ends both.
#[derive(Debug, Clone)]
pub struct CountedPhase {
    progress: TimedPhase,
    counter: CountingTicker,
    progress_done: bool,
    counter_done: bool,
}

impl CountedPhase {
    pub fn new(progress: TimedPhase, counter: CountingTicker) -> Self {
        Self {
            progress,
            counter,
            progress_done: false,
            counter_done: false,
        }
    }

    pub fn observe(&mut self, now_ms: u64, paused: bool) {
        self.progress.observe(now_ms, paused);
        self.counter.observe(now_ms, paused);
    }

    pub fn tick(&mut self, tick: &Tick, out: &mut Vec<Event>) -> PhaseStatus {
        if !self.progress_done {
            match self.progress.tick(tick, out) {
                PhaseStatus::Cancelled => return PhaseStatus::Cancelled,
                PhaseStatus::Finished => self.progress_done = true,
                PhaseStatus::Running => {}
            }
        }
        if !self.counter_done {
            match self.counter.tick(tick, out) {
                PhaseStatus::Cancelled => return PhaseStatus::Cancelled,
                PhaseStatus::Finished => self.counter_done = true,
                PhaseStatus::Running => {}
            }
        }
        if self.progress_done && self.counter_done {
            PhaseStatus::Finished
        } else if tick.cancelled {
            PhaseStatus::Cancelled
        } else {
            PhaseStatus::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_values(events: &[Event]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    fn counter_values(events: &[Event]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Counter { value } => *value,
                _ => None,
            })
            .collect()
    }

    /// Tick every 16ms until the driver stops; returns the time it stopped.
    fn run_until_done(phase: &mut TimedPhase, start: u64, out: &mut Vec<Event>) -> u64 {
        let mut now = start;
        loop {
            if phase.tick(&Tick::at(now), out).is_done() {
                return now;
            }
            now += 16;
        }
    }

    #[test]
    fn timed_phase_finishes_after_duration() {
        let mut phase = TimedPhase::new(1_000, Direction::Increasing, 0);
        let mut out = Vec::new();
        let finished_at = run_until_done(&mut phase, 0, &mut out);
        assert!(finished_at >= 1_000);
        assert!(finished_at < 1_016 + 16);

        let values = progress_values(&out);
        assert_eq!(values.first().copied(), Some(0.0));
        assert_eq!(values.last().copied(), Some(100.0));
        assert!(values.iter().all(|p| (0.0..=100.0).contains(p)));
    }

    #[test]
    fn decreasing_phase_ends_at_zero() {
        let mut phase = TimedPhase::new(500, Direction::Decreasing, 0);
        let mut out = Vec::new();
        run_until_done(&mut phase, 0, &mut out);
        let values = progress_values(&out);
        assert_eq!(values.first().copied(), Some(100.0));
        assert_eq!(values.last().copied(), Some(0.0));
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut phase = TimedPhase::new(0, Direction::Increasing, 10);
        let mut out = Vec::new();
        assert_eq!(phase.tick(&Tick::at(10), &mut out), PhaseStatus::Finished);
    }

    #[test]
    fn pause_extends_phase_by_pause_length() {
        let mut phase = TimedPhase::new(1_000, Direction::Increasing, 0);
        let mut out = Vec::new();
        let mut now = 0;
        while now < 400 {
            phase.tick(&Tick::at(now), &mut out);
            now += 16;
        }
        let before = out.len();
        let paused = Tick {
            paused: true,
            ..Tick::at(now)
        };
        for t in (now..now + 2_000).step_by(16) {
            assert_eq!(
                phase.tick(&Tick { now_ms: t, ..paused }, &mut out),
                PhaseStatus::Running
            );
        }
        assert_eq!(out.len(), before, "no progress while paused");

        let finished_at = run_until_done(&mut phase, now + 2_000, &mut out);
        let pause_len = 2_000 - 16;
        assert!(finished_at >= 1_000 + pause_len);
        assert!(finished_at <= 1_000 + pause_len + 32);
    }

    #[test]
    fn cancellation_resolves_immediately() {
        let mut phase = TimedPhase::new(10_000, Direction::Increasing, 0).with_grace(300);
        let mut out = Vec::new();
        phase.tick(&Tick::at(16), &mut out);
        let cancelled = Tick {
            cancelled: true,
            ..Tick::at(32)
        };
        let before = out.len();
        assert_eq!(phase.tick(&cancelled, &mut out), PhaseStatus::Cancelled);
        assert_eq!(out.len(), before);
    }

    #[test]
    fn grace_period_delays_finish() {
        let mut phase = TimedPhase::new(100, Direction::Decreasing, 0).with_grace(300);
        let mut out = Vec::new();
        assert_eq!(phase.tick(&Tick::at(100), &mut out), PhaseStatus::Running);
        assert_eq!(phase.tick(&Tick::at(250), &mut out), PhaseStatus::Running);
        assert_eq!(phase.tick(&Tick::at(400), &mut out), PhaseStatus::Finished);
    }

    #[test]
    fn grace_period_is_pausable() {
        let mut phase = TimedPhase::new(100, Direction::Decreasing, 0).with_grace(300);
        let mut out = Vec::new();
        assert_eq!(phase.tick(&Tick::at(100), &mut out), PhaseStatus::Running);

        // 50ms into the grace period.
        phase.observe(150, true);
        let paused = Tick {
            paused: true,
            ..Tick::at(1_000)
        };
        assert_eq!(phase.tick(&paused, &mut out), PhaseStatus::Running);
        phase.observe(5_000, false);

        assert_eq!(phase.tick(&Tick::at(5_100), &mut out), PhaseStatus::Running);
        assert_eq!(phase.tick(&Tick::at(5_240), &mut out), PhaseStatus::Running);
        assert_eq!(phase.tick(&Tick::at(5_260), &mut out), PhaseStatus::Finished);
    }

    #[test]
    fn cancel_skips_grace_period() {
        let mut phase = TimedPhase::new(100, Direction::Decreasing, 0).with_grace(300);
        let mut out = Vec::new();
        assert_eq!(phase.tick(&Tick::at(120), &mut out), PhaseStatus::Running);
        let cancelled = Tick {
            cancelled: true,
            ..Tick::at(140)
        };
        assert_eq!(phase.tick(&cancelled, &mut out), PhaseStatus::Cancelled);
    }

    #[test]
    fn final_countdown_cue_fires_once() {
        let mut phase = TimedPhase::new(15_000, Direction::Increasing, 0).with_final_countdown();
        let mut out = Vec::new();
        let mut now = 0;
        loop {
            let tick = Tick {
                sound: true,
                ..Tick::at(now)
            };
            if phase.tick(&tick, &mut out).is_done() {
                break;
            }
            now += 16;
        }
        let cues: Vec<_> = out
            .iter()
            .filter(|e| matches!(e, Event::CuePlayed { cue: Cue::Countdown }))
            .collect();
        assert_eq!(cues.len(), 1);
    }

    #[test]
    fn final_countdown_is_silent_without_sound() {
        let mut phase = TimedPhase::new(6_000, Direction::Increasing, 0).with_final_countdown();
        let mut out = Vec::new();
        run_until_done(&mut phase, 0, &mut out);
        assert!(!out.iter().any(|e| matches!(e, Event::CuePlayed { .. })));
    }

    #[test]
    fn ticker_emits_every_value() {
        let mut out = Vec::new();
        let mut ticker = CountingTicker::start(5, 0, &mut out);
        assert_eq!(counter_values(&out), vec![5]);

        // A long frame gap still produces each intermediate value.
        assert_eq!(ticker.tick(&Tick::at(3_100), &mut out), PhaseStatus::Running);
        assert_eq!(counter_values(&out), vec![5, 4, 3, 2]);
        assert_eq!(ticker.tick(&Tick::at(5_000), &mut out), PhaseStatus::Finished);
        assert_eq!(counter_values(&out), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn ticker_holds_still_while_paused() {
        let mut out = Vec::new();
        let mut ticker = CountingTicker::start(3, 0, &mut out);
        ticker.tick(&Tick::at(500), &mut out);
        let paused = Tick {
            paused: true,
            ..Tick::at(600)
        };
        ticker.tick(&paused, &mut out);
        ticker.tick(&Tick { now_ms: 9_000, ..paused }, &mut out);
        assert_eq!(ticker.remaining(), 3);
        // 600ms active before the pause, 9s paused.
        ticker.tick(&Tick::at(9_600), &mut out);
        assert_eq!(ticker.remaining(), 3);
        ticker.tick(&Tick::at(10_100), &mut out);
        assert_eq!(ticker.remaining(), 2);
    }

    #[test]
    fn counted_phase_waits_for_both() {
        let mut out = Vec::new();
        let progress = TimedPhase::new(1_000, Direction::Decreasing, 0);
        let counter = CountingTicker::start(2, 0, &mut out);
        let mut joined = CountedPhase::new(progress, counter);

        assert_eq!(joined.tick(&Tick::at(1_200), &mut out), PhaseStatus::Running);
        assert_eq!(joined.tick(&Tick::at(2_000), &mut out), PhaseStatus::Finished);
    }

    #[test]
    fn counted_phase_cancels_both() {
        let mut out = Vec::new();
        let progress = TimedPhase::new(5_000, Direction::Decreasing, 0);
        let counter = CountingTicker::start(5, 0, &mut out);
        let mut joined = CountedPhase::new(progress, counter);
        joined.tick(&Tick::at(1_000), &mut out);
        let cancelled = Tick {
            cancelled: true,
            ..Tick::at(1_016)
        };
        assert_eq!(joined.tick(&cancelled, &mut out), PhaseStatus::Cancelled);
    }

    #[test]
    fn delay_is_pause_aware() {
        let mut delay = Delay::new(3_000, 0);
        assert_eq!(delay.tick(&Tick::at(1_000)), PhaseStatus::Running);
        delay.observe(1_000, true);
        delay.observe(6_000, false);
        assert_eq!(delay.tick(&Tick::at(7_000)), PhaseStatus::Running);
        assert_eq!(delay.tick(&Tick::at(8_000)), PhaseStatus::Finished);
    }
}
