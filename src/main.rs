//! kio-runner CLI entry point

use anyhow::{Context, Result};
use chrono::Local;
use kio_runner::config::cli::{Cli, EXAMPLES};
use kio_runner::config::{self, toml, validator, KioConfig, ResolvedSettings};
use kio_runner::control::{ConfigStore, SysfsStore};
use kio_runner::dmesg::DmesgSource;
use kio_runner::output::{self, text, SystemInfo};
use kio_runner::reload::CommandReloader;
use kio_runner::Kio;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);
    cli.validate()?;

    if cli.examples {
        println!("{}", EXAMPLES);
        return Ok(());
    }

    let store = SysfsStore::detect(&cli.control_root, &cli.version_path);

    if cli.kio_version {
        println!("{}", store.read_version().context("Failed to read kio version")?);
        return Ok(());
    }

    let file = cli
        .read_config
        .as_deref()
        .map(toml::parse_toml_file)
        .transpose()?;
    let settings = config::resolve_settings(&cli, file.as_ref());

    validator::validate_config(&settings.global, &settings.plan)
        .context("Configuration validation failed")?;

    if cli.dry_run {
        text::divider("Requested config");
        text::print_configuration(&requested_config(&settings));
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let mut reloader = CommandReloader::default();
    if let Some(ref dir) = cli.reload_dir {
        reloader = reloader.in_dir(dir);
    }

    let mut kio = Kio::new(store, DmesgSource::default(), reloader);
    kio.init(&settings.global)
        .context("Failed to initialize the kio generator")?;
    let version = kio.version().unwrap_or("unknown").to_string();
    println!("KIO version {}", version);

    kio.apply_thread_plan(settings.global.num_threads, &settings.plan)
        .context("Failed to apply thread settings")?;

    let conf = kio.get_config().context("Failed to read back configuration")?;

    if let Some(ref path) = cli.generate_config {
        println!("Generating config in {}", path.display());
        toml::write_toml_file(path, &conf)?;
        return Ok(());
    }

    text::divider("Current config");
    text::print_configuration(&conf);

    text::divider("Running");
    let start = Local::now();
    let result = match kio.run() {
        Ok(result) => result,
        Err(e) => {
            if let Some(lines) = e.captured_lines() {
                log::error!("Captured {} log lines:", lines.len());
                for line in lines {
                    log::error!("  {}", line);
                }
            }
            return Err(anyhow::Error::new(e).context("Run failed"));
        }
    };
    log::debug!("Run took {:.3}s", (Local::now() - start).num_milliseconds() as f64 / 1000.0);

    text::divider("Results");
    text::print_results(&result);

    if cli.output_json.is_none() && cli.output_csv.is_none() {
        return Ok(());
    }

    let system = SystemInfo::collect(start, &version);

    if let Some(ref path) = cli.output_json {
        let report = output::json::build_report(system.clone(), &conf, &result);
        output::json::write_json_output(path, &report, true)?;
        println!("Wrote JSON report to {}", path.display());
    }

    if let Some(ref path) = cli.output_csv {
        let row = output::csv::build_row(&system, &conf, &result.summary);
        output::csv::append_row(path, &row)?;
        println!("Appended results to {}", path.display());
    }

    Ok(())
}

/// Initialize env_logger; `--debug` raises the default level
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Configuration as it would be applied, for `--dry-run`
fn requested_config(settings: &ResolvedSettings) -> KioConfig {
    KioConfig {
        global: settings.global,
        threads: (0..settings.global.num_threads)
            .map(|tid| settings.plan.for_thread(tid))
            .collect(),
    }
}
