//! Command-line interface for timeline_trials.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trials_core::Timeline;

/// Timeline Trials - headless runner for timed skill challenges
#[derive(Parser, Debug)]
#[command(name = "timeline_trials")]
#[command(about = "Plays scripted challenge sessions and previews rewards", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration (defaults to timeline_trials.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a scripted session and print the outcome and progress as JSON
    Play {
        /// Path to the script file
        #[arg(short, long)]
        script: PathBuf,

        /// Playback acceleration, overriding the script (1.0 is real time)
        #[arg(long)]
        speed: Option<f64>,

        /// Session length in seconds, overriding script and config
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Evaluate the reward calculator for final session figures
    Rewards {
        /// Timeline the rewards are computed for
        #[arg(long, default_value = "present")]
        timeline: Timeline,

        /// Final score
        #[arg(long)]
        score: u64,

        /// Seconds left on the clock
        #[arg(long, default_value = "0")]
        time_left: u32,

        /// Lives left
        #[arg(long, default_value = "3")]
        lives: u8,

        /// Total accepted actions
        #[arg(long, default_value = "0")]
        total: u32,

        /// Perfect actions
        #[arg(long, default_value = "0")]
        perfect: u32,

        /// Highest combo multiplier reached (0 if no action)
        #[arg(long, default_value = "0")]
        max_combo: f64,
    },

    /// Load and validate configuration, then print the effective values
    CheckConfig,
}
