//! Human-readable text output

use crate::kio::schema::{GlobalKey, KioConfig, ThreadKey};
use crate::results::{PerfRecord, RunResult};

/// Print a section divider
pub fn divider(name: &str) {
    println!("--------------------------------------------------------------");
    println!("{}...", name);
}

/// Print the configuration as read back from the control tree
pub fn print_configuration(config: &KioConfig) {
    println!("Global:");
    for key in GlobalKey::ALL {
        println!("  {:<18} {}", key.as_str(), config.global.get(key));
    }

    for (tid, settings) in config.threads.iter().enumerate() {
        println!("Thread {}:", tid);
        for key in ThreadKey::ALL {
            match settings.get(key) {
                Some(v) => println!("  {:<18} {}", key.as_str(), v),
                None => println!("  {:<18} -", key.as_str()),
            }
        }
    }
}

/// Print parsed results, one row per thread plus the summary
pub fn print_results(result: &RunResult) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    TEST RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("{}", header_row());
    for (tid, rec) in &result.threads {
        println!("{}", result_row(&format!("thread {}", tid), rec));
    }
    println!("{}", result_row("summary", &result.summary));
    println!();
    println!("═══════════════════════════════════════════════════════════");
}

fn header_row() -> String {
    format!(
        "{:<10} {:>12} {:>10} {:>10} {:>10} {:>12} {:>10}",
        "", "completed", "lat(us)", "slat(us)", "clat(us)", "IOPS", "MB/s"
    )
}

fn result_row(label: &str, rec: &PerfRecord) -> String {
    format!(
        "{:<10} {:>12} {:>10.2} {:>10.2} {:>10.2} {:>12} {:>10.2}",
        label,
        format_number(rec.completed),
        rec.lat_usec,
        rec.slat_usec,
        rec.clat_usec,
        format_number(rec.iops.round() as u64),
        rec.bw_mbps
    )
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;

    for c in s.chars().rev() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
        count += 1;
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(20493117), "20,493,117");
    }

    #[test]
    fn test_result_row() {
        let rec = PerfRecord {
            completed: 102468,
            lat_usec: 97.381,
            slat_usec: 3.19,
            clat_usec: 94.19,
            iops: 20493.0,
            bw_mbps: 80.05,
        };
        let row = result_row("summary", &rec);
        assert!(row.starts_with("summary"));
        assert!(row.contains("102,468"));
        assert!(row.contains("97.38"));
        assert!(row.contains("20,493"));
        assert_eq!(row.len(), header_row().len());
    }
}
