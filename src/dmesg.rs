//! Kernel log windowing
//!
//! The generator reports its results through the kernel log. The log is an
//! uncontrolled, append-only stream shared with every other kernel producer,
//! so a run's output is isolated by capturing a boundary marker (the bracketed
//! timestamp of the last line) before the run is triggered and keeping only
//! the lines after the last line carrying that marker.
//!
//! The log is re-read in full every time; there is no tailing. Rotation,
//! truncation and concurrent runs of the same generator are not detected.

use crate::error::KioError;
use regex::Regex;
use std::process::Command;
use std::sync::{Arc, Mutex, OnceLock};

/// Source of the complete current log, one entry per line
pub trait LogSource {
    fn read_all(&self) -> Result<Vec<String>, KioError>;
}

/// Reads the kernel ring buffer via `dmesg`
#[derive(Debug, Clone)]
pub struct DmesgSource {
    program: String,
}

impl Default for DmesgSource {
    fn default() -> Self {
        Self {
            program: "dmesg".to_string(),
        }
    }
}

impl DmesgSource {
    /// Read the log with a different program (e.g. `journalctl -k` wrapper)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl LogSource for DmesgSource {
    fn read_all(&self) -> Result<Vec<String>, KioError> {
        let output = Command::new(&self.program)
            .output()
            .map_err(|source| KioError::Spawn {
                command: self.program.clone(),
                source,
            })?;
        // A restricted log (kernel.dmesg_restrict) must not read as empty
        if !output.status.success() {
            return Err(KioError::LogRead {
                command: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(split_lines(&text))
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.trim_end().lines().map(str::to_string).collect()
}

/// Append-only log held in memory
///
/// Clones share the same buffer, so a store hook can append the generator's
/// output while the window reads it.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let log = Self::new();
        log.extend(lines);
        log
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines.lock().unwrap().push(line.into());
    }

    pub fn extend<I, T>(&self, lines: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.lines
            .lock()
            .unwrap()
            .extend(lines.into_iter().map(Into::into));
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSource for MemoryLog {
    fn read_all(&self) -> Result<Vec<String>, KioError> {
        Ok(self.lines.lock().unwrap().clone())
    }
}

/// Boundary token separating prior log content from a new run
///
/// `None` means no boundary was found and nothing will be excluded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogMarker(Option<String>);

impl LogMarker {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\s*([0-9.]+)\s*\]").expect("static timestamp regex"))
}

/// Extract the bracketed timestamp token from one log line
pub fn line_timestamp(line: &str) -> Option<&str> {
    timestamp_regex()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Marker/since windowing over a [`LogSource`]
pub struct LogWindow<S> {
    source: S,
}

impl<S: LogSource> LogWindow<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Capture the boundary; must be called before the run is triggered
    pub fn mark(&self) -> Result<LogMarker, KioError> {
        let lines = self.source.read_all()?;
        let marker = match lines.last().and_then(|line| line_timestamp(line)) {
            Some(token) => LogMarker::new(token),
            None => LogMarker::none(),
        };
        log::debug!("Log marker: {:?} ({} lines before run)", marker.token(), lines.len());
        Ok(marker)
    }

    /// Lines strictly after the last line containing the marker token
    ///
    /// Returns the entire log when the marker is null or never matches.
    pub fn since(&self, marker: &LogMarker) -> Result<Vec<String>, KioError> {
        let mut lines = self.source.read_all()?;
        let Some(token) = marker.token() else {
            return Ok(lines);
        };

        match lines.iter().rposition(|line| line.contains(token)) {
            Some(idx) => Ok(lines.split_off(idx + 1)),
            None => {
                log::warn!("Log marker [{}] not found; using the whole log", token);
                Ok(lines)
            }
        }
    }
}
