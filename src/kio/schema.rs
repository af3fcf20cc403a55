//! Control tree schema
//!
//! Global keys live at `<root>/<key>`, thread keys at `<root>/<tid>/<key>`.
//! Thread settings are sparse: a key left unset is never written and keeps
//! the generator's default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Write-only trigger node; writing `1` performs one run
pub const RUN_TRIGGER: &str = "run_workload";

/// Global setting keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlobalKey {
    NumThreads,
    RuntimeSeconds,
}

impl GlobalKey {
    pub const ALL: [GlobalKey; 2] = [GlobalKey::NumThreads, GlobalKey::RuntimeSeconds];

    pub fn as_str(self) -> &'static str {
        match self {
            GlobalKey::NumThreads => "num_threads",
            GlobalKey::RuntimeSeconds => "runtime_seconds",
        }
    }
}

impl fmt::Display for GlobalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-thread setting keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreadKey {
    BlockSize,
    BurstDelay,
    BurstFinish,
    OffsetHigh,
    OffsetLow,
    OffsetRandom,
    OffsetStride,
    QueueDepth,
    ReadBurst,
    ReadMixPercent,
    ReadSleepUsec,
    WriteBurst,
    WriteSleepUsec,
}

impl ThreadKey {
    pub const ALL: [ThreadKey; 13] = [
        ThreadKey::BlockSize,
        ThreadKey::BurstDelay,
        ThreadKey::BurstFinish,
        ThreadKey::OffsetHigh,
        ThreadKey::OffsetLow,
        ThreadKey::OffsetRandom,
        ThreadKey::OffsetStride,
        ThreadKey::QueueDepth,
        ThreadKey::ReadBurst,
        ThreadKey::ReadMixPercent,
        ThreadKey::ReadSleepUsec,
        ThreadKey::WriteBurst,
        ThreadKey::WriteSleepUsec,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThreadKey::BlockSize => "block_size",
            ThreadKey::BurstDelay => "burst_delay",
            ThreadKey::BurstFinish => "burst_finish",
            ThreadKey::OffsetHigh => "offset_high",
            ThreadKey::OffsetLow => "offset_low",
            ThreadKey::OffsetRandom => "offset_random",
            ThreadKey::OffsetStride => "offset_stride",
            ThreadKey::QueueDepth => "queue_depth",
            ThreadKey::ReadBurst => "read_burst",
            ThreadKey::ReadMixPercent => "read_mix_percent",
            ThreadKey::ReadSleepUsec => "read_sleep_usec",
            ThreadKey::WriteBurst => "write_burst",
            ThreadKey::WriteSleepUsec => "write_sleep_usec",
        }
    }

    /// Keys the driver treats as single-bit flags
    pub fn is_flag(self) -> bool {
        matches!(
            self,
            ThreadKey::BurstDelay | ThreadKey::BurstFinish | ThreadKey::OffsetRandom
        )
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global settings applied on every session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub num_threads: u32,
    pub runtime_seconds: u32,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            num_threads: 1,
            runtime_seconds: 5,
        }
    }
}

impl GlobalSettings {
    pub fn get(&self, key: GlobalKey) -> u32 {
        match key {
            GlobalKey::NumThreads => self.num_threads,
            GlobalKey::RuntimeSeconds => self.runtime_seconds,
        }
    }
}

/// Sparse settings for one generator thread
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_finish: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_high: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_low: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_random: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_stride: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_depth: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_burst: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_mix_percent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_sleep_usec: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_burst: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_sleep_usec: Option<u64>,
}

impl ThreadSettings {
    fn slot(&mut self, key: ThreadKey) -> &mut Option<u64> {
        match key {
            ThreadKey::BlockSize => &mut self.block_size,
            ThreadKey::BurstDelay => &mut self.burst_delay,
            ThreadKey::BurstFinish => &mut self.burst_finish,
            ThreadKey::OffsetHigh => &mut self.offset_high,
            ThreadKey::OffsetLow => &mut self.offset_low,
            ThreadKey::OffsetRandom => &mut self.offset_random,
            ThreadKey::OffsetStride => &mut self.offset_stride,
            ThreadKey::QueueDepth => &mut self.queue_depth,
            ThreadKey::ReadBurst => &mut self.read_burst,
            ThreadKey::ReadMixPercent => &mut self.read_mix_percent,
            ThreadKey::ReadSleepUsec => &mut self.read_sleep_usec,
            ThreadKey::WriteBurst => &mut self.write_burst,
            ThreadKey::WriteSleepUsec => &mut self.write_sleep_usec,
        }
    }

    pub fn get(&self, key: ThreadKey) -> Option<u64> {
        match key {
            ThreadKey::BlockSize => self.block_size,
            ThreadKey::BurstDelay => self.burst_delay,
            ThreadKey::BurstFinish => self.burst_finish,
            ThreadKey::OffsetHigh => self.offset_high,
            ThreadKey::OffsetLow => self.offset_low,
            ThreadKey::OffsetRandom => self.offset_random,
            ThreadKey::OffsetStride => self.offset_stride,
            ThreadKey::QueueDepth => self.queue_depth,
            ThreadKey::ReadBurst => self.read_burst,
            ThreadKey::ReadMixPercent => self.read_mix_percent,
            ThreadKey::ReadSleepUsec => self.read_sleep_usec,
            ThreadKey::WriteBurst => self.write_burst,
            ThreadKey::WriteSleepUsec => self.write_sleep_usec,
        }
    }

    pub fn set(&mut self, key: ThreadKey, value: Option<u64>) {
        *self.slot(key) = value;
    }

    /// Keys that are set, in control tree order
    pub fn iter(&self) -> impl Iterator<Item = (ThreadKey, u64)> + '_ {
        ThreadKey::ALL
            .iter()
            .filter_map(move |&k| self.get(k).map(|v| (k, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Overlay every key set in `other` onto `self`
    pub fn merge(&mut self, other: &ThreadSettings) {
        for (key, value) in other.iter() {
            self.set(key, Some(value));
        }
    }
}

/// Requested thread settings: a common layer plus per-index overrides
///
/// The common layer wins over per-index values, matching the command line
/// taking precedence over a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadPlan {
    pub common: ThreadSettings,
    pub per_thread: BTreeMap<u32, ThreadSettings>,
}

impl ThreadPlan {
    /// Same settings for every thread
    pub fn uniform(common: ThreadSettings) -> Self {
        Self {
            common,
            per_thread: BTreeMap::new(),
        }
    }

    /// Effective settings for thread `tid`
    pub fn for_thread(&self, tid: u32) -> ThreadSettings {
        let mut settings = self.per_thread.get(&tid).cloned().unwrap_or_default();
        settings.merge(&self.common);
        settings
    }
}

/// Full configuration snapshot: the shape of config files and reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KioConfig {
    pub global: GlobalSettings,
    #[serde(default)]
    pub threads: Vec<ThreadSettings>,
}

impl KioConfig {
    /// Per-index plan built from the thread tables
    pub fn thread_plan(&self) -> ThreadPlan {
        ThreadPlan {
            common: ThreadSettings::default(),
            per_thread: self
                .threads
                .iter()
                .enumerate()
                .map(|(tid, settings)| (tid as u32, settings.clone()))
                .collect(),
        }
    }
}
