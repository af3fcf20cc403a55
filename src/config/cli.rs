//! CLI argument parsing using clap

use crate::control::{DEFAULT_CONTROL_ROOT, DEFAULT_VERSION_PATH};
use crate::kio::schema::{ThreadKey, ThreadSettings};
use clap::Parser;
use std::path::PathBuf;

/// kio-runner - configure and run the kio kernel IO workload generator
#[derive(Parser, Debug)]
#[command(name = "kio-runner")]
#[command(version, about, long_about = None)]
#[command(max_term_width = 120)]
pub struct Cli {
    // === Info ===
    /// Show usage examples and exit
    #[arg(long)]
    pub examples: bool,

    /// Print the loaded kio module version and exit
    #[arg(long)]
    pub kio_version: bool,

    // === Run config ===
    /// Number of generator threads
    #[arg(short = 't', long, value_name = "NUM")]
    pub num_threads: Option<u32>,

    /// Seconds to run for
    #[arg(short = 's', long = "runtime", value_name = "SEC")]
    pub runtime_seconds: Option<u32>,

    // === Workload config (applied to every thread) ===
    /// IO block size in bytes
    #[arg(long = "block-size", visible_alias = "bs", value_name = "N")]
    pub block_size: Option<u64>,

    /// 0 delay after each IO, 1 delay after each burst
    #[arg(long = "burst-delay", visible_alias = "bd", value_name = "N")]
    pub burst_delay: Option<u64>,

    /// 1 to wait for the queue to drain when switching directions
    #[arg(long = "burst-finish", visible_alias = "bf", value_name = "N")]
    pub burst_finish: Option<u64>,

    /// Lowest offset for IOs
    #[arg(long = "offset-low", visible_alias = "ol", value_name = "N")]
    pub offset_low: Option<u64>,

    /// Highest offset for IOs
    #[arg(long = "offset-high", visible_alias = "oh", value_name = "N")]
    pub offset_high: Option<u64>,

    /// 1 to generate random offsets
    #[arg(long = "offset-random", visible_alias = "or", value_name = "N")]
    pub offset_random: Option<u64>,

    /// When not random, increment the offset after each IO by this
    #[arg(long = "offset-stride", visible_alias = "os", value_name = "N")]
    pub offset_stride: Option<u64>,

    /// Dispatch no more than this number of IOs concurrently
    #[arg(long = "queue-depth", visible_alias = "qd", value_name = "N")]
    pub queue_depth: Option<u64>,

    /// 0..100 percent read bursts
    #[arg(long = "read-mix-percent", visible_alias = "rm", value_name = "N")]
    pub read_mix_percent: Option<u64>,

    /// Number of IOs to dispatch as reads in one burst
    #[arg(long = "read-burst", visible_alias = "rb", value_name = "N")]
    pub read_burst: Option<u64>,

    /// Number of IOs to dispatch as writes in one burst
    #[arg(long = "write-burst", visible_alias = "wb", value_name = "N")]
    pub write_burst: Option<u64>,

    /// Sleep usec after a read IO/burst
    #[arg(long = "read-sleep-usec", visible_alias = "rs", value_name = "N")]
    pub read_sleep_usec: Option<u64>,

    /// Sleep usec after a write IO/burst
    #[arg(long = "write-sleep-usec", visible_alias = "ws", value_name = "N")]
    pub write_sleep_usec: Option<u64>,

    // === Configuration file ===
    /// Apply settings, write the resulting config to FILE (TOML) and exit
    #[arg(short = 'g', long, value_name = "FILE")]
    pub generate_config: Option<PathBuf>,

    /// Read settings from a TOML config file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub read_config: Option<PathBuf>,

    // === Output ===
    /// Append a summary row to a CSV file
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output_csv: Option<PathBuf>,

    /// Write a full JSON report
    #[arg(short = 'j', long, value_name = "JSON")]
    pub output_json: Option<PathBuf>,

    // === Environment ===
    /// Root of the kio control tree
    #[arg(long, default_value = DEFAULT_CONTROL_ROOT, env = "KIO_CONTROL_ROOT")]
    pub control_root: PathBuf,

    /// File holding the kio module version
    #[arg(long, default_value = DEFAULT_VERSION_PATH, env = "KIO_VERSION_PATH")]
    pub version_path: PathBuf,

    /// Directory in which `make reload` is run when the thread count changes
    #[arg(long, env = "KIO_RELOAD_DIR")]
    pub reload_dir: Option<PathBuf>,

    /// Validate and print the configuration without touching the generator
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Thread settings given on the command line (applied to all threads)
    pub fn thread_settings(&self) -> ThreadSettings {
        let mut settings = ThreadSettings::default();
        for key in ThreadKey::ALL {
            settings.set(key, self.thread_value(key));
        }
        settings
    }

    fn thread_value(&self, key: ThreadKey) -> Option<u64> {
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

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.generate_config.is_some() && (self.output_csv.is_some() || self.output_json.is_some()) {
            anyhow::bail!("--generate-config exits before running; it cannot be combined with --output-csv/--output-json");
        }
        if self.generate_config.is_some() && self.dry_run {
            anyhow::bail!("--generate-config reads back the control tree and cannot be used with --dry-run");
        }
        Ok(())
    }
}

/// Usage examples printed by `--examples`
pub const EXAMPLES: &str = r#"
Run a one off configuration. If multiple threads are used, they all use
the same configuration.

# kio-runner --num-threads 1 \
        --runtime 5 \
        --block-size 4096 \
        --offset-stride 4096 \
        --queue-depth 10 \
        --offset-random 1 \
        --offset-high $((0xFFFFFFFF)) \
        --read-burst 100 \
        --read-mix-percent 100

Generate a config file, edit the details, and run it:

# kio-runner --num-threads 5 --generate-config config.toml
# vim config.toml
# kio-runner --runtime 5 --config config.toml

Append every run to a CSV file for later comparison:

# kio-runner -c config.toml -o sweep.csv -j run-001.json
"#;
