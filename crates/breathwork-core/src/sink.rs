//! Presenter-facing output contracts.
//!
//! A session only produces [`Event`]s. Anything that wants them implements
//! [`EventSink`]; [`Dispatcher`] adapts the event stream onto the narrower
//! renderer, audio and lifecycle traits so presenters only implement the
//! calls they care about.

use crate::events::{AnimationKind, Cue, Event};
use crate::timer::Phase;

/// Visual output. Every method defaults to a no-op.
pub trait Renderer {
    fn set_progress(&mut self, _percent: f64) {}
    fn set_phase(&mut self, _phase: Phase, _round: u32, _total_rounds: u32) {}
    fn set_counter(&mut self, _value: Option<u32>) {}
    fn set_breathing_animation(&mut self, _kind: AnimationKind, _duration_ms: u64) {}
    fn show_breathe_in(&mut self) {}
    fn hide_breathe_in(&mut self) {}
    fn show_tip(&mut self, _index: usize) {}
    fn hide_tip(&mut self) {}
    fn show_inter_round_message(&mut self, _next_round: u32) {}
    fn hide_inter_round_message(&mut self) {}
    fn set_paused(&mut self, _paused: bool) {}
}

/// Audio output. Must tolerate any call at any time.
pub trait AudioSink {
    fn play(&mut self, _cue: Cue) {}
    fn stop(&mut self, _cue: Cue) {}
    fn stop_all(&mut self) {}
}

/// Session lifecycle notifications.
pub trait Lifecycle {
    fn on_round_started(&mut self, _round: u32, _total_rounds: u32, _hold_secs: u32) {}
    fn on_hold_recorded(&mut self, _round: u32, _held_secs: u32, _target_secs: u32) {}
    fn on_complete(&mut self, _last_hold_secs: u32) {}
    fn on_reset(&mut self) {}
}

/// Anything that consumes the raw event stream.
pub trait EventSink {
    fn emit(&mut self, event: &Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: &Event) {
        self.push(event.clone());
    }
}

/// A renderer/audio/lifecycle implementation that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Renderer for Silent {}
impl AudioSink for Silent {}
impl Lifecycle for Silent {}

/// Routes events onto the three output traits.
#[derive(Debug, Default)]
pub struct Dispatcher<R, A, L> {
    pub renderer: R,
    pub audio: A,
    pub lifecycle: L,
}

impl<R: Renderer, A: AudioSink, L: Lifecycle> Dispatcher<R, A, L> {
    pub fn new(renderer: R, audio: A, lifecycle: L) -> Self {
        Self {
            renderer,
            audio,
            lifecycle,
        }
    }

    pub fn into_parts(self) -> (R, A, L) {
        (self.renderer, self.audio, self.lifecycle)
    }
}

impl<R: Renderer, A: AudioSink, L: Lifecycle> EventSink for Dispatcher<R, A, L> {
    fn emit(&mut self, event: &Event) {
        match event {
            Event::SessionStarted { .. } => {}
            Event::RoundStarted {
                round,
                total_rounds,
                hold_secs,
            } => self
                .lifecycle
                .on_round_started(*round, *total_rounds, *hold_secs),
            Event::PhaseChanged {
                phase,
                round,
                total_rounds,
            } => self.renderer.set_phase(*phase, *round, *total_rounds),
            Event::Progress { percent } => self.renderer.set_progress(*percent),
            Event::Counter { value } => self.renderer.set_counter(*value),
            Event::BreathingAnimation { kind, duration_ms } => {
                self.renderer.set_breathing_animation(*kind, *duration_ms)
            }
            Event::BreatheInShown => self.renderer.show_breathe_in(),
            Event::BreatheInHidden => self.renderer.hide_breathe_in(),
            Event::TipShown { index } => self.renderer.show_tip(*index),
            Event::TipHidden => self.renderer.hide_tip(),
            Event::InterRoundMessage { next_round } => {
                self.renderer.show_inter_round_message(*next_round)
            }
            Event::InterRoundMessageHidden => self.renderer.hide_inter_round_message(),
            Event::HoldRecorded {
                round,
                held_secs,
                target_secs,
            } => self
                .lifecycle
                .on_hold_recorded(*round, *held_secs, *target_secs),
            Event::CuePlayed { cue } => self.audio.play(*cue),
            Event::CueStopped { cue } => self.audio.stop(*cue),
            Event::AudioStopped => self.audio.stop_all(),
            Event::Paused { .. } => self.renderer.set_paused(true),
            Event::Resumed { .. } => self.renderer.set_paused(false),
            Event::Completed { last_hold_secs, .. } => self.lifecycle.on_complete(*last_hold_secs),
            Event::Reset { .. } => self.lifecycle.on_reset(),
        }
    }
}
