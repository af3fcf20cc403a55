//! kio-runner - drive the kio kernel IO workload generator
//!
//! The kio module is configured through sysfs and reports its results to the
//! kernel log. This crate configures it, triggers a run, and turns the run's
//! log output into typed results.
//!
//! # Architecture
//!
//! - **Control tree**: path-addressed sysfs access with privilege-aware writes
//! - **Reload**: decides when a thread count change needs a module reload
//! - **Log window**: isolates the lines one run appended to the kernel log
//! - **Results**: strict parser for the per-thread and summary records
//! - **Session**: the configure → run → collect orchestrator
//! - **Reports**: console, JSON and CSV output around the core

pub mod config;
pub mod control;
pub mod dmesg;
pub mod error;
pub mod kio;
pub mod output;
pub mod reload;
pub mod results;

// Re-export commonly used types
pub use control::{ConfigStore, SysfsStore};
pub use error::KioError;
pub use kio::Kio;
pub use results::RunResult;

/// Result type used by the CLI and report layers
pub type Result<T> = anyhow::Result<T>;
