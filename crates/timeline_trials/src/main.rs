//! Timeline Trials - headless CLI
//!
//! Plays scripted challenge sessions, previews rewards and checks configuration.

#![warn(missing_docs)]

mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use timeline_trials::{Script, TrialsConfig, play_script};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;
use trials_core::{
    Combo, FinalTally, MAX_LIVES, SessionStats, Timeline, calculate_rewards,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = TrialsConfig::load(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;

    match cli.command {
        Command::Play {
            script,
            speed,
            duration,
        } => run_play(&config, script, speed, duration).await,
        Command::Rewards {
            timeline,
            score,
            time_left,
            lives,
            total,
            perfect,
            max_combo,
        } => run_rewards(
            &config,
            timeline,
            FinalTally {
                score,
                time_left,
                lives: lives.min(MAX_LIVES),
                stats: SessionStats::from_counts(
                    total.max(perfect),
                    perfect,
                    0,
                    (max_combo > 0.0).then(|| Combo::from_f64(max_combo)),
                ),
            },
        ),
        Command::CheckConfig => run_check_config(&config),
    }
}

/// Play a script and print the report.
#[instrument(skip(config))]
async fn run_play(
    config: &TrialsConfig,
    script_path: PathBuf,
    speed: Option<f64>,
    duration: Option<f64>,
) -> Result<()> {
    let mut script = Script::from_file(&script_path)
        .with_context(|| format!("loading script {}", script_path.display()))?;
    if let Some(speed) = speed {
        anyhow::ensure!(speed.is_finite() && speed > 0.0, "--speed must be positive");
        script = script.with_speed(speed);
    }
    if let Some(duration) = duration {
        script = script.with_duration(duration);
    }

    let report = play_script(config, &script).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print the reward payload for final figures.
#[instrument(skip(config))]
fn run_rewards(config: &TrialsConfig, timeline: Timeline, tally: FinalTally) -> Result<()> {
    let rewards = calculate_rewards(&tally, timeline, config.rewards());
    info!(credits = rewards.credits(), "Rewards evaluated");
    println!("{}", serde_json::to_string_pretty(&rewards)?);
    Ok(())
}

/// Print the effective configuration.
#[instrument(skip(config))]
fn run_check_config(config: &TrialsConfig) -> Result<()> {
    config.validate()?;
    let session = config.session_config(None);
    println!("{}", toml::to_string_pretty(config)?);
    println!(
        "# effective: game_id={} timeline={} difficulty={} duration={}s",
        session.game_id(),
        session.timeline(),
        session.difficulty(),
        session.duration().secs()
    );
    info!("Configuration is valid");
    Ok(())
}
