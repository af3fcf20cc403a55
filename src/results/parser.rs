//! Strict parser for the generator's result records
//!
//! Lines are matched independently of their order and of any unrelated log
//! traffic around them. When a record repeats, the last one wins: a stale
//! summary from an earlier run may precede the authoritative one. A window
//! without a summary or without any thread record is rejected outright.

use super::{PerfRecord, RunResult};
use crate::error::KioError;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Reasons a captured log window is not a valid result set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("did not find 'summary' data in kernel log output")]
    MissingSummary,

    #[error("did not find 'thread' data in kernel log output")]
    NoThreadData,

    /// A record matched but one of its numbers does not fit its type
    #[error("unrepresentable number in record: {line}")]
    BadNumber { line: String },
}

/// Records decoded from one window
#[derive(Debug, Clone, PartialEq)]
pub struct Records {
    pub summary: PerfRecord,
    pub threads: BTreeMap<u32, PerfRecord>,
}

const FIELDS: &str =
    r"completed=([0-9]+) lat=([0-9.]+)\(([0-9.]+)\+([0-9.]+)\) iops=([0-9]+) MB/s=([0-9.]+)";

fn thread_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"thread\[([0-9]+)\]: {}", FIELDS)).expect("static thread record regex")
    })
}

fn summary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"summary: {}", FIELDS)).expect("static summary regex"))
}

/// Decode the six record fields starting at capture group `first`
fn decode_fields(caps: &Captures<'_>, first: usize, line: &str) -> Result<PerfRecord, ParseError> {
    let bad = || ParseError::BadNumber {
        line: line.to_string(),
    };
    let group = |i: usize| caps.get(first + i).map(|m| m.as_str()).ok_or_else(bad);
    let float = |i: usize| -> Result<f64, ParseError> { group(i)?.parse::<f64>().map_err(|_| bad()) };

    Ok(PerfRecord {
        completed: group(0)?.parse::<u64>().map_err(|_| bad())?,
        lat_usec: float(1)?,
        slat_usec: float(2)?,
        clat_usec: float(3)?,
        iops: float(4)?,
        bw_mbps: float(5)?,
    })
}

/// Scan a window for thread and summary records
pub fn parse_records<S: AsRef<str>>(lines: &[S]) -> Result<Records, ParseError> {
    let mut summary = None;
    let mut threads = BTreeMap::new();

    for line in lines {
        let line = line.as_ref();

        if let Some(caps) = thread_regex().captures(line) {
            let tid = caps[1].parse::<u32>().map_err(|_| ParseError::BadNumber {
                line: line.to_string(),
            })?;
            threads.insert(tid, decode_fields(&caps, 2, line)?);
            continue;
        }

        if let Some(caps) = summary_regex().captures(line) {
            summary = Some(decode_fields(&caps, 1, line)?);
        }
    }

    let summary = summary.ok_or(ParseError::MissingSummary)?;
    if threads.is_empty() {
        return Err(ParseError::NoThreadData);
    }

    Ok(Records { summary, threads })
}

/// Parse a captured window into a [`RunResult`]
///
/// On failure the raw lines travel with the error for diagnostics.
pub fn parse(lines: Vec<String>) -> Result<RunResult, KioError> {
    match parse_records(&lines) {
        Ok(Records { summary, threads }) => Ok(RunResult {
            lines,
            summary,
            threads,
        }),
        Err(source) => Err(KioError::Parse { source, lines }),
    }
}
