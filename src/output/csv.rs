//! CSV output formatting
//!
//! One row per run, appended to an accumulating file so that a parameter
//! sweep ends up as a single table. Columns:
//!
//! - `timestamp`, `hostname`, `kio_version`
//! - every global setting
//! - every thread key, holding the distinct per-thread values joined by `/`
//! - every summary result field
//!
//! An existing file is only appended to when its header row matches exactly.

use super::SystemInfo;
use crate::kio::schema::{GlobalKey, KioConfig, ThreadKey};
use crate::results::PerfRecord;
use crate::Result;
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Header and value row for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl CsvRow {
    fn push(&mut self, column: &str, value: String) {
        self.columns.push(column.to_string());
        self.values.push(value);
    }
}

/// Build the row describing one run
pub fn build_row(system: &SystemInfo, config: &KioConfig, summary: &PerfRecord) -> CsvRow {
    let mut row = CsvRow {
        columns: Vec::new(),
        values: Vec::new(),
    };

    row.push("timestamp", system.timestamp.clone());
    row.push("hostname", system.hostname.clone());
    row.push("kio_version", system.kio_version.clone());

    for key in GlobalKey::ALL {
        row.push(key.as_str(), config.global.get(key).to_string());
    }

    for key in ThreadKey::ALL {
        let mut distinct: Vec<String> = Vec::new();
        for settings in &config.threads {
            if let Some(v) = settings.get(key) {
                let v = v.to_string();
                if !distinct.contains(&v) {
                    distinct.push(v);
                }
            }
        }
        row.push(key.as_str(), distinct.join("/"));
    }

    row.push("completed", summary.completed.to_string());
    row.push("lat_usec", summary.lat_usec.to_string());
    row.push("slat_usec", summary.slat_usec.to_string());
    row.push("clat_usec", summary.clat_usec.to_string());
    row.push("iops", summary.iops.to_string());
    row.push("bw_MBps", summary.bw_mbps.to_string());

    row
}

/// Quote a field when it contains a separator, quote or newline
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Append `row` to `path`, writing the header first if the file is new
pub fn append_row(path: &Path, row: &CsvRow) -> Result<()> {
    let header = format_line(&row.columns);

    if path.exists() {
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        let mut existing = String::new();
        BufReader::new(file)
            .read_line(&mut existing)
            .with_context(|| format!("Failed to read CSV header: {}", path.display()))?;
        let existing = existing.trim_end_matches(['\r', '\n']);

        if !existing.is_empty() {
            if existing != header {
                log::warn!("columns:  {}", header);
                log::warn!("existing: {}", existing);
                anyhow::bail!(
                    "CSV file {} cannot be appended to; it has different column names",
                    path.display()
                );
            }

            let mut file = OpenOptions::new()
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
            writeln!(file, "{}", format_line(&row.values))?;
            return Ok(());
        }
    }

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    writeln!(file, "{}", header)?;
    writeln!(file, "{}", format_line(&row.values))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kio::schema::{GlobalSettings, ThreadSettings};
    use std::fs;

    fn system() -> SystemInfo {
        SystemInfo {
            timestamp: "2024/05/01 12:00:00".to_string(),
            hostname: "bench01".to_string(),
            kio_version: "0.4".to_string(),
        }
    }

    fn config() -> KioConfig {
        KioConfig {
            global: GlobalSettings {
                num_threads: 3,
                runtime_seconds: 5,
            },
            threads: vec![
                ThreadSettings {
                    block_size: Some(4096),
                    queue_depth: Some(1),
                    ..Default::default()
                },
                ThreadSettings {
                    block_size: Some(512),
                    queue_depth: Some(1),
                    ..Default::default()
                },
                ThreadSettings {
                    block_size: Some(4096),
                    queue_depth: Some(1),
                    ..Default::default()
                },
            ],
        }
    }

    fn summary() -> PerfRecord {
        PerfRecord {
            completed: 1200,
            lat_usec: 41.5,
            slat_usec: 1.5,
            clat_usec: 40.0,
            iops: 240.0,
            bw_mbps: 0.94,
        }
    }

    fn column<'a>(row: &'a CsvRow, name: &str) -> &'a str {
        let idx = row.columns.iter().position(|c| c == name).unwrap();
        &row.values[idx]
    }

    #[test]
    fn test_build_row_columns() {
        let row = build_row(&system(), &config(), &summary());
        assert_eq!(&row.columns[..5], ["timestamp", "hostname", "kio_version", "num_threads", "runtime_seconds"]);
        assert_eq!(row.columns.len(), 3 + 2 + 13 + 6);
        assert_eq!(row.columns.last().map(String::as_str), Some("bw_MBps"));
        assert_eq!(column(&row, "num_threads"), "3");
    }

    #[test]
    fn test_thread_values_are_distinct_and_ordered() {
        let row = build_row(&system(), &config(), &summary());
        assert_eq!(column(&row, "block_size"), "4096/512");
        assert_eq!(column(&row, "queue_depth"), "1");
        assert_eq!(column(&row, "read_burst"), "");
    }

    #[test]
    fn test_summary_values() {
        let row = build_row(&system(), &config(), &summary());
        assert_eq!(column(&row, "completed"), "1200");
        assert_eq!(column(&row, "lat_usec"), "41.5");
        assert_eq!(column(&row, "bw_MBps"), "0.94");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_append_creates_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        let row = build_row(&system(), &config(), &summary());

        append_row(&path, &row).unwrap();
        append_row(&path, &row).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,hostname,kio_version,num_threads"));
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn test_append_rejects_different_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        fs::write(&path, "timestamp,hostname\n2024/01/01 00:00:00,old\n").unwrap();

        let row = build_row(&system(), &config(), &summary());
        let err = append_row(&path, &row).unwrap_err();
        assert!(err.to_string().contains("different column names"));
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_append_to_empty_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        fs::write(&path, "").unwrap();

        let row = build_row(&system(), &config(), &summary());
        append_row(&path, &row).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
