//! Breath retention driver.
//!
//! Unlike [`TimedPhase`](super::phase::TimedPhase) the retention ring moves
//! linearly, the counter shows whole seconds remaining (one update per
//! second boundary), and the actual time held is recorded when it ends.
//! It also owns the retention-only extras: the breathe-in button that
//! appears after ten seconds and the rotating breathing tips.

use super::clock::PauseClock;
use super::easing::linear_fraction;
use super::phase::{PhaseStatus, Tick, FINAL_COUNTDOWN_MS};
use crate::events::{Cue, Event};

/// Active hold time before the user may end retention early.
pub const BREATHE_IN_AFTER_MS: u64 = 10_000;
/// Active hold time between tip changes.
pub const TIP_INTERVAL_MS: u64 = 8_000;

#[derive(Debug, Clone)]
pub struct HoldTimer {
    total_ms: u64,
    clock: PauseClock,
    last_second: u32,
    countdown_played: bool,
    breathe_in_shown: bool,
    tip_count: usize,
    tip_index: usize,
    tip_rotations: u64,
}

impl HoldTimer {
    /// Start a retention of `total_secs`. Emits the initial counter and,
    /// when tips are available, the tip at `tip_index`.
    pub fn start(
        total_secs: u32,
        now_ms: u64,
        tip_count: usize,
        tip_index: usize,
        out: &mut Vec<Event>,
    ) -> Self {
        let tip_index = if tip_count == 0 { 0 } else { tip_index % tip_count };
        out.push(Event::Counter {
            value: Some(total_secs),
        });
        if tip_count > 0 {
            out.push(Event::TipShown { index: tip_index });
        }
        Self {
            total_ms: total_secs as u64 * 1000,
            clock: PauseClock::begin(now_ms),
            last_second: total_secs,
            countdown_played: false,
            breathe_in_shown: false,
            tip_count,
            tip_index,
            tip_rotations: 0,
        }
    }

    pub fn breathe_in_shown(&self) -> bool {
        self.breathe_in_shown
    }

    /// Tip to continue from in the next retention.
    pub fn next_tip_index(&self) -> usize {
        if self.tip_count == 0 {
            0
        } else {
            (self.tip_index + 1) % self.tip_count
        }
    }

    /// Seconds actually held so far, pauses excluded, rounded to nearest.
    pub fn held_secs(&self, now_ms: u64) -> u32 {
        let elapsed = self.clock.elapsed_ms(now_ms);
        (elapsed as f64 / 1000.0).round() as u32
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

        let elapsed = self.clock.elapsed_ms(tick.now_ms);
        let fraction = linear_fraction(elapsed, self.total_ms);
        out.push(Event::Progress {
            percent: fraction * 100.0,
        });

        let remaining_ms = self.total_ms.saturating_sub(elapsed);
        let current_second = u32::try_from(remaining_ms.div_ceil(1000)).unwrap_or(u32::MAX);
        if current_second != self.last_second {
            self.last_second = current_second;
            out.push(Event::Counter {
                value: Some(current_second),
            });
        }

        if !self.countdown_played && elapsed >= self.total_ms.saturating_sub(FINAL_COUNTDOWN_MS) {
            self.countdown_played = true;
            if tick.sound {
                out.push(Event::CuePlayed {
                    cue: Cue::Countdown,
                });
            }
        }

        if !self.breathe_in_shown && fraction < 1.0 && elapsed >= BREATHE_IN_AFTER_MS {
            self.breathe_in_shown = true;
            out.push(Event::BreatheInShown);
        }

        if self.tip_count > 1 {
            let rotations = elapsed / TIP_INTERVAL_MS;
            while self.tip_rotations < rotations {
                self.tip_rotations += 1;
                self.tip_index = (self.tip_index + 1) % self.tip_count;
                out.push(Event::TipShown {
                    index: self.tip_index,
                });
            }
        }

        if fraction < 1.0 {
            PhaseStatus::Running
        } else {
            PhaseStatus::Finished
        }
    }
}
