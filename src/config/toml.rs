//! TOML configuration file parsing and generation
//!
//! A config file mirrors the control tree:
//!
//! ```toml
//! [global]
//! num_threads = 2
//! runtime_seconds = 5
//!
//! [[threads]]
//! block_size = 4096
//! queue_depth = 10
//!
//! [[threads]]
//! block_size = 512
//! ```

use crate::kio::schema::KioConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<KioConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<KioConfig> {
    let config: KioConfig = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Render a configuration snapshot as TOML
pub fn to_toml_string(config: &KioConfig) -> Result<String> {
    ::toml::to_string_pretty(config).context("Failed to serialize configuration to TOML")
}

/// Write a configuration snapshot to a TOML file
pub fn write_toml_file(path: &Path, config: &KioConfig) -> Result<()> {
    let contents = to_toml_string(config)?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kio::schema::{GlobalSettings, ThreadSettings};

    #[test]
    fn test_parse_toml_basic() {
        let toml = r#"
[global]
num_threads = 2
runtime_seconds = 10

[[threads]]
block_size = 4096
offset_random = 1
offset_high = 4294967295

[[threads]]
block_size = 512
"#;
        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.global.num_threads, 2);
        assert_eq!(config.global.runtime_seconds, 10);
        assert_eq!(config.threads.len(), 2);
        assert_eq!(config.threads[0].offset_high, Some(0xFFFF_FFFF));
        assert_eq!(config.threads[1].block_size, Some(512));
        assert_eq!(config.threads[1].queue_depth, None);
    }

    #[test]
    fn test_parse_toml_without_threads() {
        let config = parse_toml_string("[global]\nnum_threads = 1\nruntime_seconds = 5\n").unwrap();
        assert!(config.threads.is_empty());
    }

    #[test]
    fn test_parse_toml_rejects_unknown_thread_key() {
        let toml = r#"
[global]
num_threads = 1
runtime_seconds = 5

[[threads]]
iodepth = 4
"#;
        assert!(parse_toml_string(toml).is_err());
    }

    #[test]
    fn test_parse_toml_requires_global() {
        assert!(parse_toml_string("[[threads]]\nblock_size = 4096\n").is_err());
    }

    #[test]
    fn test_generated_file_reads_back() {
        let config = KioConfig {
            global: GlobalSettings {
                num_threads: 2,
                runtime_seconds: 30,
            },
            threads: vec![
                ThreadSettings {
                    block_size: Some(4096),
                    read_mix_percent: Some(100),
                    ..Default::default()
                },
                ThreadSettings::default(),
            ],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_toml_file(&path, &config).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[global]"));
        assert!(text.contains("read_mix_percent = 100"));
        assert_eq!(parse_toml_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = parse_toml_file(Path::new("/nonexistent/kio.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kio.toml"));
    }
}
