mod clock;
mod easing;
mod engine;
mod hold;
mod phase;
mod schedule;

pub use clock::{Clock, ManualClock, MonotonicClock, PauseClock};
pub use easing::{ease_in_out_sine, linear_fraction, Direction};
pub use engine::{Command, Session, SessionState, SessionStatus};
pub use hold::{HoldTimer, BREATHE_IN_AFTER_MS, TIP_INTERVAL_MS};
pub use phase::{
    CountedPhase, CountingTicker, Delay, Phase, PhaseStatus, Tick, TimedPhase, FINAL_COUNTDOWN_MS,
};
pub use schedule::{
    RoundPlan, SessionConfig, SessionPlan, BREATHS_PER_ROUND, COUNTDOWN_SECS, DEFAULT_BREATH_SECS,
    DEFAULT_HOLD_SECS, DEFAULT_ROUNDS, DEFAULT_TIP_COUNT, GRACE_MS, HOLD_GROWTH, INTER_ROUND_MS,
    MAX_BREATH_SECS, MAX_HOLD_SECS, MAX_ROUNDS, SHORT_HOLD_SECS,
};
