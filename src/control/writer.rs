//! Privilege-aware node writes
//!
//! Writing sysfs attributes normally requires root. When the tool runs as an
//! ordinary user each write is routed through `sudo tee`, which keeps the
//! value byte-exact (no trailing newline, no shell interpolation). The choice
//! is made once per session via [`Privilege::detect`].

use crate::error::KioError;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Effective privilege of the current process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Root,
    User,
}

impl Privilege {
    /// Inspect the effective uid
    pub fn detect() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };
        if euid == 0 {
            Privilege::Root
        } else {
            Privilege::User
        }
    }

    /// Writer matching this privilege level
    pub fn writer(self) -> Box<dyn NodeWriter> {
        match self {
            Privilege::Root => Box::new(DirectWriter),
            Privilege::User => Box::new(SudoWriter::default()),
        }
    }
}

/// Capability to put a value into a control node
pub trait NodeWriter {
    fn write_node(&self, path: &Path, value: &str) -> Result<(), KioError>;

    /// Escalation helper the writes go through, if any
    fn helper(&self) -> Option<&str> {
        None
    }
}

/// Writes the node file directly
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectWriter;

impl NodeWriter for DirectWriter {
    fn write_node(&self, path: &Path, value: &str) -> Result<(), KioError> {
        fs::write(path, value).map_err(|source| KioError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Writes the node through an elevated `tee` helper
#[derive(Debug, Clone)]
pub struct SudoWriter {
    helper: String,
    helper_args: Vec<String>,
}

impl Default for SudoWriter {
    fn default() -> Self {
        Self {
            helper: "sudo".to_string(),
            helper_args: Vec::new(),
        }
    }
}

impl SudoWriter {
    /// Use a different escalation helper (e.g. `doas`)
    pub fn with_helper(helper: impl Into<String>, helper_args: Vec<String>) -> Self {
        Self {
            helper: helper.into(),
            helper_args,
        }
    }
}

impl NodeWriter for SudoWriter {
    fn write_node(&self, path: &Path, value: &str) -> Result<(), KioError> {
        let mut child = Command::new(&self.helper)
            .args(&self.helper_args)
            .arg("tee")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| KioError::Spawn {
                command: self.helper.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(source) = stdin.write_all(value.as_bytes()) {
                // Reap the helper before reporting
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(KioError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        let status = child.wait().map_err(|source| KioError::Spawn {
            command: self.helper.clone(),
            source,
        })?;
        if !status.success() {
            return Err(KioError::PrivilegedWrite {
                path: path.to_path_buf(),
                status,
            });
        }
        Ok(())
    }

    fn helper(&self) -> Option<&str> {
        Some(&self.helper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_selects_writer() {
        assert_eq!(Privilege::Root.writer().helper(), None);
        assert_eq!(Privilege::User.writer().helper(), Some("sudo"));
    }

    #[test]
    fn test_escalated_writer_reaps_helper_on_closed_stdin() {
        // `true` exits without reading, so the pipe may break mid-write
        let dir = tempfile::tempdir().unwrap();
        let writer = SudoWriter::with_helper("true", Vec::new());
        let value = "1".repeat(1 << 20);
        match writer.write_node(&dir.path().join("node"), &value) {
            Ok(()) => {}
            Err(KioError::Io { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn test_direct_writer_exact_value() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("queue_depth");
        DirectWriter.write_node(&node, "32").unwrap();
        assert_eq!(fs::read_to_string(&node).unwrap(), "32");
    }

    #[test]
    fn test_escalated_writer_exact_value() {
        // `env tee <path>` runs tee unprivileged, exercising the helper pipeline
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("read_mix_percent");
        let writer = SudoWriter::with_helper("env", Vec::new());
        writer.write_node(&node, "70").unwrap();
        assert_eq!(fs::read_to_string(&node).unwrap(), "70");
    }

    #[test]
    fn test_escalated_writer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("missing/dir/node");
        let writer = SudoWriter::with_helper("env", Vec::new());
        let err = writer.write_node(&node, "1").unwrap_err();
        assert!(matches!(err, KioError::PrivilegedWrite { .. }));
    }

    #[test]
    fn test_escalated_writer_missing_helper() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SudoWriter::with_helper("kio-no-such-helper", Vec::new());
        let err = writer.write_node(&dir.path().join("x"), "1").unwrap_err();
        assert!(matches!(err, KioError::Spawn { .. }));
    }
}
