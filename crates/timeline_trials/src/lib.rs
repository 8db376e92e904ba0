//! Timeline Trials: headless host for the timed skill challenge engine.
//!
//! Re-exports the pure session logic ([`trials_core`]) and the async engine
//! ([`trials_runtime`]), and adds what an embedding application brings:
//! TOML configuration, scripted play and the reward preview used by the CLI.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod host;
mod script;

pub use config::{
    ClockSection, ConfigError, DEFAULT_CONFIG_FILE, ENV_DIFFICULTY, ENV_DURATION, ENV_TIMELINE,
    SessionSection, TrialsConfig,
};
pub use host::{PlayReport, play_script};
pub use script::{Script, ScriptAction, ScriptEvent};

pub use trials_core;
pub use trials_runtime;
