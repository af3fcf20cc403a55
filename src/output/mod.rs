//! Run reports
//!
//! - **text**: human-readable console output
//! - **json**: one self-describing report per run
//! - **csv**: one row per run appended to an accumulating sweep file

pub mod csv;
pub mod json;
pub mod text;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp format shared by every report
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Where and when a run happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub timestamp: String,
    pub hostname: String,
    pub kio_version: String,
}

impl SystemInfo {
    pub fn new(start: DateTime<Local>, hostname: String, kio_version: &str) -> Self {
        Self {
            timestamp: start.format(TIMESTAMP_FORMAT).to_string(),
            hostname,
            kio_version: kio_version.to_string(),
        }
    }

    /// Info for a run started at `start` on this host
    pub fn collect(start: DateTime<Local>, kio_version: &str) -> Self {
        Self::new(start, local_hostname(), kio_version)
    }
}

/// Hostname of this machine, or `unknown`
pub fn local_hostname() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            log::warn!("Failed to read hostname: {}", e);
            "unknown".to_string()
        }
    }
}
