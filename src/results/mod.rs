//! Run results harvested from the kernel log
//!
//! The generator prints one record per thread and one summary record when a
//! run completes:
//!
//! ```text
//! kio: thread[0]: completed=51234 lat=97.41(3.20+94.21) iops=10246 MB/s=40.02
//! kio: summary: completed=102468 lat=97.38(3.19+94.19) iops=20493 MB/s=80.05
//! ```
//!
//! These shapes are a wire contract with the driver; see [`parser`].

pub mod parser;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Performance figures of one thread or of the whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerfRecord {
    /// Completed IO operations
    pub completed: u64,
    /// Total latency (usec), `slat_usec + clat_usec`
    pub lat_usec: f64,
    /// Submission latency (usec)
    pub slat_usec: f64,
    /// Completion latency (usec)
    pub clat_usec: f64,
    /// Operations per second
    pub iops: f64,
    /// Throughput in MB/s
    #[serde(rename = "bw_MBps")]
    pub bw_mbps: f64,
}

/// Outcome of a single generator thread
pub type ThreadResult = PerfRecord;

/// Aggregate outcome across all threads
pub type SummaryResult = PerfRecord;

impl PerfRecord {
    /// Field portion of a record line, as the driver prints it
    pub fn format_fields(&self) -> String {
        format!(
            "completed={} lat={}({}+{}) iops={:.0} MB/s={}",
            self.completed, self.lat_usec, self.slat_usec, self.clat_usec, self.iops, self.bw_mbps
        )
    }

    /// `thread[<tid>]: ...` record line
    pub fn thread_line(&self, tid: u32) -> String {
        format!("thread[{}]: {}", tid, self.format_fields())
    }

    /// `summary: ...` record line
    pub fn summary_line(&self) -> String {
        format!("summary: {}", self.format_fields())
    }
}

/// Everything harvested from one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Raw log window the records were parsed from
    pub lines: Vec<String>,
    pub summary: SummaryResult,
    pub threads: BTreeMap<u32, ThreadResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lines() {
        let rec = PerfRecord {
            completed: 100,
            lat_usec: 12.5,
            slat_usec: 2.25,
            clat_usec: 10.25,
            iops: 2000.0,
            bw_mbps: 7.8125,
        };
        assert_eq!(
            rec.thread_line(3),
            "thread[3]: completed=100 lat=12.5(2.25+10.25) iops=2000 MB/s=7.8125"
        );
        assert_eq!(
            rec.summary_line(),
            "summary: completed=100 lat=12.5(2.25+10.25) iops=2000 MB/s=7.8125"
        );
    }

    #[test]
    fn test_bandwidth_serializes_with_unit_casing() {
        let rec = PerfRecord {
            completed: 1,
            lat_usec: 1.0,
            slat_usec: 0.5,
            clat_usec: 0.5,
            iops: 1.0,
            bw_mbps: 0.25,
        };
        let json = serde_json::to_value(rec).unwrap();
        assert_eq!(json["bw_MBps"], 0.25);
        assert!(json.get("bw_mbps").is_none());
    }
}
