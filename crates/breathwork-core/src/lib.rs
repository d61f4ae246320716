//! # Breathwork Core Library
//!
//! This library provides the sequencing logic for a guided Wim Hof style
//! breathing session. Presentation (progress ring, audio, settings UI) lives
//! outside; it talks to the core through commands in and events out.
//!
//! ## Architecture
//!
//! - **Clock/Pauser**: [`PauseClock`] measures active time per phase,
//!   excluding paused spans
//! - **Phase drivers**: [`TimedPhase`], [`CountingTicker`] and [`HoldTimer`]
//!   turn elapsed time into eased progress, counters and cues
//! - **Round controller**: [`Session`] sequences countdown, thirty breaths,
//!   retention and recovery for each round
//! - **Runner**: [`runner::drive`] feeds a session from a tokio frame interval
//!   and a command channel
//! - **Storage**: TOML-based settings and preferences
//!
//! ## Key Components
//!
//! - [`Session`]: Round controller state machine
//! - [`Event`]: Everything a presenter needs to render and play
//! - [`Config`]: Persisted settings

pub mod error;
pub mod events;
pub mod runner;
pub mod sink;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError};
pub use events::{AnimationKind, Cue, Event};
pub use runner::{drive, SessionOutcome, DEFAULT_FRAME_INTERVAL};
pub use sink::{AudioSink, Dispatcher, EventSink, Lifecycle, Renderer, Silent};
pub use storage::{Config, Language};
pub use timer::{
    Clock, Command, CountingTicker, Direction, HoldTimer, ManualClock, MonotonicClock, PauseClock,
    Phase, Session, SessionConfig, SessionPlan, SessionState, SessionStatus, TimedPhase,
};
