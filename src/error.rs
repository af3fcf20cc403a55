//! Error taxonomy for the control/harvest pipeline
//!
//! Every failure here is surfaced to the caller immediately. Nothing in the
//! core retries and nothing rolls back partially written configuration.

use crate::results::parser::ParseError;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors raised while driving the kio generator
#[derive(Debug, thiserror::Error)]
pub enum KioError {
    /// A control node could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The elevated write helper exited unsuccessfully
    #[error("privileged write to {path} failed ({status})")]
    PrivilegedWrite { path: PathBuf, status: ExitStatus },

    /// The reload action exited unsuccessfully
    #[error("reload command `{command}` failed ({status})")]
    Reload { command: String, status: ExitStatus },

    /// A helper process could not be spawned at all
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The log reader ran but exited unsuccessfully
    #[error("`{command}` failed ({status}): {stderr}")]
    LogRead {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// No log lines were captured after the run trigger returned
    #[error("did not find any data in the kernel log after the run")]
    EmptyRun,

    /// The captured log window did not hold a complete result set
    #[error("{source} ({} captured lines)", .lines.len())]
    Parse {
        #[source]
        source: ParseError,
        /// Raw captured window, kept for diagnostics
        lines: Vec<String>,
    },

    /// A node that must exist was absent
    #[error("control node {path} does not exist")]
    MissingNode { path: PathBuf },

    /// A node that must hold an integer held something else
    #[error("control node {path} holds non-numeric value {text:?}")]
    NotNumeric { path: PathBuf, text: String },

    /// A control path was built from zero components
    #[error("no path provided")]
    EmptyPath,
}

impl KioError {
    /// Raw log lines attached to the failure, if any
    pub fn captured_lines(&self) -> Option<&[String]> {
        match self {
            KioError::Parse { lines, .. } => Some(lines),
            _ => None,
        }
    }
}
