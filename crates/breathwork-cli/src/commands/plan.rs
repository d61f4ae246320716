use breathwork_core::Config;
use clap::Args;

use super::SettingsArgs;
use crate::presenter::format_duration;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let session = args.settings.resolve(&config);
    let plan = session.plan();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} rounds, {}s breaths, first retention {}s",
        session.rounds, session.breath_duration_secs, session.base_hold_secs
    );
    for round in &plan.rounds {
        println!(
            "  round {}: retention {}s, about {}",
            round.round,
            round.hold_secs,
            format_duration(round.duration_ms)
        );
    }
    println!("total: about {}", format_duration(plan.total_ms));
    Ok(())
}
