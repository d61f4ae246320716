//! Session settings and the per-round timing they imply.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ROUNDS: u32 = 3;
pub const DEFAULT_HOLD_SECS: u32 = 30;
pub const DEFAULT_BREATH_SECS: f64 = 2.0;
pub const DEFAULT_TIP_COUNT: usize = 5;

/// Upper bounds for user-entered settings; larger values are clamped.
pub const MAX_ROUNDS: u32 = 10;
pub const MAX_HOLD_SECS: u32 = 600;
pub const MAX_BREATH_SECS: f64 = 10.0;

/// Rapid breaths before each retention.
pub const BREATHS_PER_ROUND: u32 = 30;
pub const COUNTDOWN_SECS: u32 = 5;
/// Recovery hold after the deep inhale.
pub const SHORT_HOLD_SECS: u32 = 15;
pub const INTER_ROUND_MS: u64 = 3_000;
/// Grace period after the deep breaths so exit animations can play.
pub const GRACE_MS: u64 = 300;
/// Retention target multiplier applied per completed round.
pub const HOLD_GROWTH: f64 = 1.5;

/// Settings for one session. Immutable once the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub rounds: u32,
    pub base_hold_secs: u32,
    pub breath_duration_secs: f64,
    /// Number of breathing tips the presenter can show during retention.
    #[serde(default = "default_tip_count")]
    pub tip_count: usize,
}

fn default_tip_count() -> usize {
    DEFAULT_TIP_COUNT
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            base_hold_secs: DEFAULT_HOLD_SECS,
            breath_duration_secs: DEFAULT_BREATH_SECS,
            tip_count: DEFAULT_TIP_COUNT,
        }
    }
}

impl SessionConfig {
    /// Build a config, substituting the default for any value that is not
    /// strictly positive and finite, and clamping values above the maximums.
    pub fn new(rounds: i64, base_hold_secs: i64, breath_duration_secs: f64) -> Self {
        Self {
            rounds: positive_u32(rounds)
                .map(|r| r.min(MAX_ROUNDS))
                .unwrap_or(DEFAULT_ROUNDS),
            base_hold_secs: positive_u32(base_hold_secs)
                .map(|h| h.min(MAX_HOLD_SECS))
                .unwrap_or(DEFAULT_HOLD_SECS),
            breath_duration_secs: if breath_duration_secs.is_finite() && breath_duration_secs > 0.0 {
                breath_duration_secs.min(MAX_BREATH_SECS)
            } else {
                DEFAULT_BREATH_SECS
            },
            tip_count: DEFAULT_TIP_COUNT,
        }
    }

    /// Parse raw slider/form values. Anything unparsable falls back to the
    /// default for that field.
    pub fn from_inputs(rounds: &str, base_hold_secs: &str, breath_duration_secs: &str) -> Self {
        Self::new(
            parse_leading_int(rounds).unwrap_or(0),
            parse_leading_int(base_hold_secs).unwrap_or(0),
            parse_leading_float(breath_duration_secs).unwrap_or(0.0),
        )
    }

    pub fn with_tip_count(mut self, tip_count: usize) -> Self {
        self.tip_count = tip_count;
        self
    }

    /// Re-apply the defaulting rules, e.g. after deserializing.
    pub fn sanitized(self) -> Self {
        Self::new(
            self.rounds as i64,
            self.base_hold_secs as i64,
            self.breath_duration_secs,
        )
        .with_tip_count(self.tip_count)
    }

    /// Retention target for `round` (1-based): `round(base * 1.5^(round-1))`.
    pub fn hold_secs(&self, round: u32) -> u32 {
        let exponent = round.max(1) as i32 - 1;
        (self.base_hold_secs as f64 * HOLD_GROWTH.powi(exponent)).round() as u32
    }

    pub fn breath_ms(&self) -> u64 {
        (self.breath_duration_secs * 1000.0).round() as u64
    }

    /// Deep inhale/exhale length: twice a normal breath.
    pub fn deep_breath_ms(&self) -> u64 {
        self.breath_ms().saturating_mul(2)
    }

    /// Length of breath `n` (1-based) of the rapid-breathing block. The last
    /// inhale is doubled to lead into retention.
    pub fn inhale_ms(&self, breath: u32) -> u64 {
        if breath >= BREATHS_PER_ROUND {
            self.breath_ms().saturating_mul(2)
        } else {
            self.breath_ms()
        }
    }

    /// Nominal (uninterrupted, unpaused) duration of one round, hold included.
    pub fn round_duration_ms(&self, round: u32) -> u64 {
        let breathing = (1..=BREATHS_PER_ROUND)
            .map(|n| self.inhale_ms(n).saturating_add(self.breath_ms()))
            .fold(0u64, u64::saturating_add);
        [
            COUNTDOWN_SECS as u64 * 1000,
            breathing,
            (self.hold_secs(round) as u64).saturating_mul(1000),
            self.deep_breath_ms(),
            GRACE_MS,
            SHORT_HOLD_SECS as u64 * 1000,
            self.deep_breath_ms(),
            GRACE_MS,
        ]
        .into_iter()
        .fold(0, u64::saturating_add)
    }

    pub fn plan(&self) -> SessionPlan {
        let rounds: Vec<RoundPlan> = (1..=self.rounds.max(1))
            .map(|round| RoundPlan {
                round,
                hold_secs: self.hold_secs(round),
                duration_ms: self.round_duration_ms(round),
            })
            .collect();
        let pauses = (rounds.len() as u64)
            .saturating_sub(1)
            .saturating_mul(INTER_ROUND_MS);
        let total_ms = rounds
            .iter()
            .map(|r| r.duration_ms)
            .fold(pauses, u64::saturating_add);
        SessionPlan { rounds, total_ms }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPlan {
    pub round: u32,
    pub hold_secs: u32,
    pub duration_ms: u64,
}

/// What a session will look like if nobody pauses or skips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub rounds: Vec<RoundPlan>,
    pub total_ms: u64,
}

fn positive_u32(value: i64) -> Option<u32> {
    if value > 0 {
        u32::try_from(value).ok()
    } else {
        None
    }
}

/// Integer prefix of `s` ("12.7" -> 12, "45s" -> 45).
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Decimal prefix of `s` ("1.5s" -> 1.5, ".75" -> 0.75).
fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .find(|&(i, c)| match c {
            '0'..='9' => false,
            '.' if !seen_dot => {
                seen_dot = true;
                false
            }
            '-' | '+' => i != 0,
            _ => true,
        })
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_grows_geometrically() {
        let cfg = SessionConfig::new(3, 30, 2.0);
        assert_eq!(cfg.hold_secs(1), 30);
        assert_eq!(cfg.hold_secs(2), 45);
        assert_eq!(cfg.hold_secs(3), 68);
    }

    #[test]
    fn round_zero_is_treated_as_first() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.hold_secs(0), cfg.hold_secs(1));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let cfg = SessionConfig::new(0, -5, f64::NAN);
        assert_eq!(cfg.rounds, DEFAULT_ROUNDS);
        assert_eq!(cfg.base_hold_secs, DEFAULT_HOLD_SECS);
        assert_eq!(cfg.breath_duration_secs, DEFAULT_BREATH_SECS);

        let cfg = SessionConfig::new(4, 60, -1.0);
        assert_eq!(cfg.rounds, 4);
        assert_eq!(cfg.base_hold_secs, 60);
        assert_eq!(cfg.breath_duration_secs, DEFAULT_BREATH_SECS);
    }

    #[test]
    fn from_inputs_parses_like_a_form() {
        let cfg = SessionConfig::from_inputs("5", "90.9", "1.5");
        assert_eq!(cfg.rounds, 5);
        assert_eq!(cfg.base_hold_secs, 90);
        assert_eq!(cfg.breath_duration_secs, 1.5);

        let cfg = SessionConfig::from_inputs("", "abc", "fast");
        assert_eq!(cfg, SessionConfig::default());
    }

    #[test]
    fn breath_input_uses_decimal_prefix() {
        assert_eq!(SessionConfig::from_inputs("3", "30", "1.5s").breath_duration_secs, 1.5);
        assert_eq!(SessionConfig::from_inputs("3", "30", ".75").breath_duration_secs, 0.75);
        assert_eq!(SessionConfig::from_inputs("3", "30", "2.5.1").breath_duration_secs, 2.5);
        assert_eq!(
            SessionConfig::from_inputs("3", "30", "-1.5").breath_duration_secs,
            DEFAULT_BREATH_SECS
        );
    }

    #[test]
    fn oversized_settings_are_clamped() {
        let cfg = SessionConfig::new(5_000_000, 1_000_000, 1e9);
        assert_eq!(cfg.rounds, MAX_ROUNDS);
        assert_eq!(cfg.base_hold_secs, MAX_HOLD_SECS);
        assert_eq!(cfg.breath_duration_secs, MAX_BREATH_SECS);

        let plan = cfg.plan();
        assert_eq!(plan.rounds.len(), MAX_ROUNDS as usize);
        assert!(plan.total_ms > 0);
    }

    #[test]
    fn durations_saturate_instead_of_overflowing() {
        let cfg = SessionConfig {
            rounds: 3,
            base_hold_secs: u32::MAX,
            breath_duration_secs: f64::MAX,
            tip_count: DEFAULT_TIP_COUNT,
        };
        assert_eq!(cfg.deep_breath_ms(), u64::MAX);
        assert_eq!(cfg.round_duration_ms(40), u64::MAX);
        assert_eq!(cfg.plan().total_ms, u64::MAX);
    }

    #[test]
    fn sanitized_keeps_tip_count() {
        let cfg = SessionConfig {
            rounds: 0,
            base_hold_secs: 0,
            breath_duration_secs: 0.0,
            tip_count: 9,
        }
        .sanitized();
        assert_eq!(cfg.rounds, DEFAULT_ROUNDS);
        assert_eq!(cfg.tip_count, 9);
    }

    #[test]
    fn last_inhale_is_doubled() {
        let cfg = SessionConfig::new(1, 30, 1.5);
        assert_eq!(cfg.inhale_ms(1), 1_500);
        assert_eq!(cfg.inhale_ms(29), 1_500);
        assert_eq!(cfg.inhale_ms(30), 3_000);
        assert_eq!(cfg.deep_breath_ms(), 3_000);
    }

    #[test]
    fn plan_sums_rounds_and_pauses() {
        let cfg = SessionConfig::new(2, 30, 2.0);
        let plan = cfg.plan();
        assert_eq!(plan.rounds.len(), 2);
        assert_eq!(plan.rounds[1].hold_secs, 45);

        // 5s countdown + 29 * 4s + (4s + 2s) + hold + 4s + 0.3s + 15s + 4s + 0.3s
        let first = 5_000 + 29 * 4_000 + 6_000 + 30_000 + 4_000 + 300 + 15_000 + 4_000 + 300;
        assert_eq!(plan.rounds[0].duration_ms, first);
        assert_eq!(plan.total_ms, first + (first + 15_000) + INTER_ROUND_MS);
    }
}
