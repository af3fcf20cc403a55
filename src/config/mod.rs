//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! Settings are layered: command line over config file over built-in defaults.

pub mod cli;
pub mod toml;
pub mod validator;

pub use crate::kio::schema::{GlobalSettings, KioConfig, ThreadPlan, ThreadSettings};

use cli::Cli;

/// Settings for one session after layering every source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub global: GlobalSettings,
    pub plan: ThreadPlan,
}

/// Merge CLI arguments with an optional config file (CLI takes precedence)
pub fn resolve_settings(cli: &Cli, file: Option<&KioConfig>) -> ResolvedSettings {
    let defaults = GlobalSettings::default();
    let from_file = file.map(|f| f.global);

    let global = GlobalSettings {
        num_threads: cli
            .num_threads
            .or(from_file.map(|g| g.num_threads))
            .unwrap_or(defaults.num_threads),
        runtime_seconds: cli
            .runtime_seconds
            .or(from_file.map(|g| g.runtime_seconds))
            .unwrap_or(defaults.runtime_seconds),
    };

    let mut plan = file.map(KioConfig::thread_plan).unwrap_or_default();
    plan.common = cli.thread_settings();

    ResolvedSettings { global, plan }
}
