//! Configuration validation
//!
//! Mirrors the limits the driver enforces so that bad settings are rejected
//! before anything is written to the control tree.

use crate::kio::schema::{GlobalSettings, ThreadKey, ThreadPlan, ThreadSettings};
use anyhow::{Context, Result};

/// Longest run the driver accepts
pub const MAX_RUNTIME_SECONDS: u32 = 3600;

/// Validate global settings and every thread's effective settings
pub fn validate_config(global: &GlobalSettings, plan: &ThreadPlan) -> Result<()> {
    validate_global(global)?;

    for tid in 0..global.num_threads {
        validate_thread(&plan.for_thread(tid))
            .with_context(|| format!("Invalid settings for thread {}", tid))?;
    }

    Ok(())
}

/// Validate global settings
pub fn validate_global(global: &GlobalSettings) -> Result<()> {
    if global.num_threads == 0 {
        anyhow::bail!("num_threads must be at least 1");
    }

    if global.runtime_seconds == 0 || global.runtime_seconds > MAX_RUNTIME_SECONDS {
        anyhow::bail!(
            "runtime_seconds must be between 1 and {}, got {}",
            MAX_RUNTIME_SECONDS,
            global.runtime_seconds
        );
    }

    Ok(())
}

/// Validate one thread's settings
pub fn validate_thread(settings: &ThreadSettings) -> Result<()> {
    for (key, value) in settings.iter() {
        if value > i64::MAX as u64 {
            anyhow::bail!("{} is out of range: {}", key, value);
        }
        if key.is_flag() && value > 1 {
            anyhow::bail!("{} is a flag and must be 0 or 1, got {}", key, value);
        }
    }

    if let Some(pct) = settings.get(ThreadKey::ReadMixPercent) {
        if pct > 100 {
            anyhow::bail!("read_mix_percent must be between 0 and 100, got {}", pct);
        }
    }

    if settings.get(ThreadKey::BlockSize) == Some(0) {
        anyhow::bail!("block_size must be greater than 0");
    }

    if settings.get(ThreadKey::QueueDepth) == Some(0) {
        anyhow::bail!("queue_depth must be greater than 0");
    }

    if let (Some(low), Some(high)) = (
        settings.get(ThreadKey::OffsetLow),
        settings.get(ThreadKey::OffsetHigh),
    ) {
        if low > high {
            anyhow::bail!("offset_low ({}) must not exceed offset_high ({})", low, high);
        }
    }

    Ok(())
}
