//! JSON report output
//!
//! The report bundles where the run happened, the configuration read back
//! from the control tree, and the parsed results:
//!
//! ```json
//! {
//!   "system": { "timestamp": "...", "hostname": "...", "kio_version": "..." },
//!   "config": { "global": { ... }, "threads": [ ... ] },
//!   "results": { "summary": { ... }, "threads": { "0": { ... } } }
//! }
//! ```

use super::SystemInfo;
use crate::kio::schema::KioConfig;
use crate::results::{PerfRecord, RunResult};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Parsed results without the raw log window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonResults {
    pub summary: PerfRecord,
    pub threads: BTreeMap<u32, PerfRecord>,
}

/// Complete report of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub system: SystemInfo,
    pub config: KioConfig,
    pub results: JsonResults,
}

/// Assemble a report
pub fn build_report(system: SystemInfo, config: &KioConfig, result: &RunResult) -> JsonReport {
    JsonReport {
        system,
        config: config.clone(),
        results: JsonResults {
            summary: result.summary,
            threads: result.threads.clone(),
        },
    }
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON report: {}", output_path.display()))?;

    if pretty {
        serde_json::to_writer_pretty(file, report)?;
    } else {
        serde_json::to_writer(file, report)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kio::schema::{GlobalSettings, ThreadSettings};

    fn sample() -> (KioConfig, RunResult) {
        let rec = PerfRecord {
            completed: 10,
            lat_usec: 2.5,
            slat_usec: 0.5,
            clat_usec: 2.0,
            iops: 10.0,
            bw_mbps: 0.04,
        };
        let config = KioConfig {
            global: GlobalSettings {
                num_threads: 1,
                runtime_seconds: 5,
            },
            threads: vec![ThreadSettings {
                block_size: Some(4096),
                ..Default::default()
            }],
        };
        let result = RunResult {
            lines: vec![rec.thread_line(0), rec.summary_line()],
            summary: rec,
            threads: BTreeMap::from([(0, rec)]),
        };
        (config, result)
    }

    #[test]
    fn test_report_layout() {
        let (config, result) = sample();
        let system = SystemInfo {
            timestamp: "2024/01/01 00:00:00".to_string(),
            hostname: "bench01".to_string(),
            kio_version: "0.4".to_string(),
        };
        let report = build_report(system, &config, &result);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["system"]["hostname"], "bench01");
        assert_eq!(json["config"]["global"]["num_threads"], 1);
        assert_eq!(json["config"]["threads"][0]["block_size"], 4096);
        assert!(json["config"]["threads"][0].get("queue_depth").is_none());
        assert_eq!(json["results"]["summary"]["completed"], 10);
        assert_eq!(json["results"]["threads"]["0"]["bw_MBps"], 0.04);
        assert!(json["results"].get("lines").is_none());
    }

    #[test]
    fn test_write_and_read_back() {
        let (config, result) = sample();
        let system = SystemInfo {
            timestamp: "2024/01/01 00:00:00".to_string(),
            hostname: "bench01".to_string(),
            kio_version: "0.4".to_string(),
        };
        let report = build_report(system, &config, &result);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        write_json_output(&path, &report, true).unwrap();

        let back: JsonReport = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
