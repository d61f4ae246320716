//! Terminal rendering of session events.

use std::io::Write;

use breathwork_core::sink::{AudioSink, EventSink, Lifecycle, Renderer};
use breathwork_core::timer::BREATHS_PER_ROUND;
use breathwork_core::{Cue, Event, Phase};

pub const TIPS: [&str; 5] = [
    "Relax your shoulders and let the body go still.",
    "Notice the calm. There is no need to breathe yet.",
    "Keep your attention on the space between heartbeats.",
    "If thoughts come, let them pass like clouds.",
    "When the urge to breathe comes, stay with it a moment longer.",
];

/// Human readable `m:ss` for a millisecond span.
pub fn format_duration(ms: u64) -> String {
    let secs = (ms + 500) / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Line-oriented renderer: phase headers, counters, tips and results.
#[derive(Debug)]
pub struct TerminalPresenter<W: Write> {
    out: W,
    phase: Phase,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            phase: Phase::GetReady,
        }
    }

    fn line(&mut self, text: &str) {
        // A closed stdout only loses output; the session keeps going.
        let _ = writeln!(self.out, "{text}");
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalPresenter<W> {
    fn set_phase(&mut self, phase: Phase, round: u32, total_rounds: u32) {
        self.phase = phase;
        match phase {
            Phase::Inhale | Phase::Exhale => {}
            Phase::GetReady => self.line(&format!("Round {round} of {total_rounds}: get ready")),
            other => self.line(other.label()),
        }
    }

    fn set_counter(&mut self, value: Option<u32>) {
        let Some(value) = value else { return };
        match self.phase {
            Phase::Inhale => self.line(&format!("  breath {value}/{BREATHS_PER_ROUND}")),
            Phase::GetReady | Phase::Hold => self.line(&format!("  {value}")),
            _ => {}
        }
    }

    fn show_breathe_in(&mut self) {
        self.line("  (press Enter to breathe in)");
    }

    fn show_tip(&mut self, index: usize) {
        if let Some(tip) = TIPS.get(index) {
            self.line(&format!("  ~ {tip}"));
        }
    }

    fn show_inter_round_message(&mut self, next_round: u32) {
        self.line(&format!("Next round {next_round} starting..."));
    }

    fn set_paused(&mut self, paused: bool) {
        self.line(if paused { "[paused]" } else { "[resumed]" });
    }
}

impl<W: Write> Lifecycle for TerminalPresenter<W> {
    fn on_hold_recorded(&mut self, round: u32, held_secs: u32, target_secs: u32) {
        self.line(&format!(
            "Round {round} retention: {held_secs}s (target {target_secs}s)"
        ));
    }

    fn on_complete(&mut self, last_hold_secs: u32) {
        self.line(&format!(
            "Session complete! Final retention: {last_hold_secs}s"
        ));
    }

    fn on_reset(&mut self) {
        self.line("Session stopped.");
    }
}

/// Rings the terminal bell for the countdown cue; everything else is silent.
#[derive(Debug, Default)]
pub struct TerminalBell {
    pub rung: usize,
}

impl AudioSink for TerminalBell {
    fn play(&mut self, cue: Cue) {
        if cue == Cue::Countdown {
            self.rung += 1;
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\x07");
            let _ = stderr.flush();
        }
    }
}

/// Emits each non-frame event as one JSON line.
#[derive(Debug)]
pub struct JsonLines<W: Write> {
    out: W,
    frames: bool,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W, frames: bool) -> Self {
        Self { out, frames }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonLines<W> {
    fn emit(&mut self, event: &Event) {
        if event.is_frame_update() && !self.frames {
            return;
        }
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(self.out, "{json}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breathwork_core::sink::Dispatcher;

    fn rendered(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn format_duration_rounds_to_seconds() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59_600), "1:00");
        assert_eq!(format_duration(754_000), "12:34");
    }

    #[test]
    fn breaths_are_counted_only_on_inhale() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.set_phase(Phase::Inhale, 1, 3);
        presenter.set_counter(Some(7));
        presenter.set_phase(Phase::Exhale, 1, 3);
        presenter.set_counter(Some(7));
        presenter.set_counter(None);
        assert_eq!(rendered(presenter), "  breath 7/30\n");
    }

    #[test]
    fn dispatcher_drives_terminal_output() {
        let mut dispatcher = Dispatcher::new(
            TerminalPresenter::new(Vec::new()),
            TerminalBell::default(),
            TerminalPresenter::new(Vec::new()),
        );
        dispatcher.emit(&Event::PhaseChanged {
            phase: Phase::Hold,
            round: 2,
            total_rounds: 3,
        });
        dispatcher.emit(&Event::TipShown { index: 1 });
        dispatcher.emit(&Event::HoldRecorded {
            round: 2,
            held_secs: 50,
            target_secs: 45,
        });

        let (renderer, bell, lifecycle) = dispatcher.into_parts();
        assert_eq!(bell.rung, 0);
        assert_eq!(rendered(renderer), format!("Hold\n  ~ {}\n", TIPS[1]));
        assert_eq!(
            rendered(lifecycle),
            "Round 2 retention: 50s (target 45s)\n"
        );
    }

    #[test]
    fn json_lines_skip_frames_by_default() {
        let mut sink = JsonLines::new(Vec::new(), false);
        sink.emit(&Event::Progress { percent: 12.5 });
        sink.emit(&Event::Counter { value: Some(4) });
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "{\"type\":\"counter\",\"value\":4}\n");
    }
}
