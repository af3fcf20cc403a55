//! Generator reload decisions
//!
//! The driver only accepts a `num_threads` write while it has no threads
//! allocated. Changing the thread count of an initialized generator therefore
//! requires unloading and reloading the module first.

use crate::error::KioError;
use std::path::PathBuf;
use std::process::Command;

/// Whether the generator must be reloaded before applying `requested` threads
///
/// An absent or zero current count means the generator is not yet
/// initialized and can be configured fresh.
pub fn needs_reload(current: Option<i64>, requested: u32) -> bool {
    match current {
        Some(cur) => cur > 0 && cur != requested as i64,
        None => false,
    }
}

/// External action that tears down and reinitializes the generator
pub trait Reloader {
    fn reload(&mut self) -> Result<(), KioError>;
}

/// Reload by running a command (by default `make reload` in the module tree)
#[derive(Debug, Clone)]
pub struct CommandReloader {
    program: String,
    args: Vec<String>,
    dir: Option<PathBuf>,
}

impl CommandReloader {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            dir: None,
        }
    }

    /// Run the command from `dir` instead of the current directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for CommandReloader {
    fn default() -> Self {
        Self::new("make", vec!["reload".to_string()])
    }
}

impl Reloader for CommandReloader {
    fn reload(&mut self) -> Result<(), KioError> {
        let command = self.command_line();
        log::info!("Reloading generator: {}", command);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.dir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|source| KioError::Spawn {
            command: command.clone(),
            source,
        })?;
        if !status.success() {
            return Err(KioError::Reload { command, status });
        }
        Ok(())
    }
}
