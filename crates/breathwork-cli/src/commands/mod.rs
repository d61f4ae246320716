pub mod config;
pub mod plan;
pub mod session;

use breathwork_core::{Config, SessionConfig};
use clap::Args;

/// Session setting overrides shared by `session` and `plan`.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Number of rounds
    #[arg(long)]
    pub rounds: Option<u32>,
    /// Retention target for the first round, in seconds
    #[arg(long)]
    pub hold: Option<u32>,
    /// Length of one inhale or exhale, in seconds
    #[arg(long)]
    pub breath: Option<f64>,
}

impl SettingsArgs {
    /// Stored settings with command-line overrides applied.
    pub fn resolve(&self, config: &Config) -> SessionConfig {
        SessionConfig::new(
            self.rounds.unwrap_or(config.session.rounds) as i64,
            self.hold.unwrap_or(config.session.hold_time_secs) as i64,
            self.breath.unwrap_or(config.session.breath_duration_secs),
        )
    }
}
