//! Time sources and pause-aware elapsed time.
//!
//! Everything in the sequencer is measured in milliseconds on a monotonic
//! timeline supplied by a [`Clock`]. A [`PauseClock`] sits on top of that
//! timeline for one timed phase and excludes every paused span from the
//! elapsed time it reports.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Real monotonic time, optionally sped up.
///
/// Backed by `tokio::time::Instant`, so tests running with a paused tokio
/// clock see virtual time.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: tokio::time::Instant,
    scale: f64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
            scale: 1.0,
        }
    }

    /// A clock that runs `scale` times faster than real time.
    ///
    /// Non-finite or non-positive factors are treated as 1.
    pub fn scaled(scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self {
            origin: tokio::time::Instant::now(),
            scale,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        let real_ms = self.origin.elapsed().as_secs_f64() * 1000.0;
        (real_ms * self.scale) as u64
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) -> u64 {
        self.now.fetch_add(ms, Ordering::SeqCst) + ms
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Elapsed-time accumulator for a single timed phase.
///
/// `elapsed = now - start - paused_total`, frozen while a pause span is open.
/// Pause spans are opened and closed by [`PauseClock::observe`], which every
/// timed operation calls on each tick with the session-wide pause flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseClock {
    start_ms: u64,
    paused_total_ms: u64,
    #[serde(default)]
    pause_started_ms: Option<u64>,
}

impl PauseClock {
    /// Start timing at `now_ms` with no pause time accumulated.
    pub fn begin(now_ms: u64) -> Self {
        Self {
            start_ms: now_ms,
            paused_total_ms: 0,
            pause_started_ms: None,
        }
    }

    /// Open or close a pause span depending on `paused`.
    pub fn observe(&mut self, now_ms: u64, paused: bool) {
        match (paused, self.pause_started_ms) {
            (true, None) => self.pause_started_ms = Some(now_ms),
            (false, Some(since)) => {
                self.paused_total_ms = self
                    .paused_total_ms
                    .saturating_add(now_ms.saturating_sub(since));
                self.pause_started_ms = None;
            }
            _ => {}
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_started_ms.is_some()
    }

    /// Total time spent in closed pause spans.
    pub fn paused_total_ms(&self) -> u64 {
        self.paused_total_ms
    }

    /// Active (unpaused) time since [`PauseClock::begin`]. Never negative.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let until = match self.pause_started_ms {
            Some(since) => since.min(now_ms),
            None => now_ms,
        };
        until
            .saturating_sub(self.start_ms)
            .saturating_sub(self.paused_total_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn elapsed_counts_from_begin() {
        let clock = PauseClock::begin(1_000);
        assert_eq!(clock.elapsed_ms(1_000), 0);
        assert_eq!(clock.elapsed_ms(1_750), 750);
    }

    #[test]
    fn elapsed_is_frozen_while_paused() {
        let mut clock = PauseClock::begin(0);
        clock.observe(400, true);
        assert!(clock.is_paused());
        assert_eq!(clock.elapsed_ms(400), 400);
        assert_eq!(clock.elapsed_ms(5_000), 400);
    }

    #[test]
    fn resume_excludes_pause_span() {
        let mut clock = PauseClock::begin(0);
        clock.observe(400, true);
        clock.observe(2_400, false);
        assert!(!clock.is_paused());
        assert_eq!(clock.paused_total_ms(), 2_000);
        assert_eq!(clock.elapsed_ms(2_500), 500);
    }

    #[test]
    fn repeated_observe_does_not_reopen_span() {
        let mut clock = PauseClock::begin(0);
        clock.observe(100, true);
        clock.observe(300, true);
        clock.observe(500, false);
        assert_eq!(clock.paused_total_ms(), 400);
        clock.observe(600, false);
        assert_eq!(clock.paused_total_ms(), 400);
    }

    #[test]
    fn time_before_begin_saturates_to_zero() {
        let clock = PauseClock::begin(10_000);
        assert_eq!(clock.elapsed_ms(5_000), 0);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(50);
        let other = clock.clone();
        assert_eq!(clock.advance(25), 75);
        assert_eq!(other.now_ms(), 75);
        other.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn scaled_clock_rejects_bad_factors() {
        assert_eq!(MonotonicClock::scaled(0.0).scale(), 1.0);
        assert_eq!(MonotonicClock::scaled(f64::NAN).scale(), 1.0);
        assert_eq!(MonotonicClock::scaled(20.0).scale(), 20.0);
    }

    proptest! {
        #[test]
        fn elapsed_never_decreases(steps in prop::collection::vec((0u64..500, any::<bool>()), 1..60)) {
            let mut now = 0u64;
            let mut clock = PauseClock::begin(now);
            let mut last = 0u64;
            for (delta, paused) in steps {
                now += delta;
                clock.observe(now, paused);
                let elapsed = clock.elapsed_ms(now);
                prop_assert!(elapsed >= last);
                prop_assert!(elapsed <= now);
                last = elapsed;
            }
        }

        #[test]
        fn elapsed_plus_pauses_equals_wall_time(pause_at in 0u64..10_000, pause_len in 0u64..10_000, tail in 0u64..10_000) {
            let mut clock = PauseClock::begin(0);
            clock.observe(pause_at, true);
            clock.observe(pause_at + pause_len, false);
            let now = pause_at + pause_len + tail;
            prop_assert_eq!(clock.elapsed_ms(now) + clock.paused_total_ms(), now);
        }
    }
}
