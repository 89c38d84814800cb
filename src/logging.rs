//! Logger setup for the two ways the binary runs.
//!
//! The TUI owns the terminal, so it logs to a rolling file. The plain
//! subcommands log to stderr through `env_logger`.

use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

pub const LOG_FILE: &str = "agentdeck.log";
pub const LOG4RS_FILE: &str = "log4rs.yaml";
const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const ARCHIVED_LOGS: u32 = 3;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} - {m}{n}";

/// Installs the file logger used by the TUI.
///
/// A `log4rs.yaml` in `config_dir` replaces the built-in rolling appender.
pub fn init_file_logging(log_dir: &Path, config_dir: &Path, verbose: bool) -> Result<()> {
    let custom = config_dir.join(LOG4RS_FILE);
    if custom.is_file() {
        return log4rs::init_file(&custom, Default::default())
            .with_context(|| format!("failed to load {}", custom.display()));
    }

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let config = rolling_config(log_dir, level(verbose))?;
    log4rs::init_config(config).context("a logger is already installed")?;
    Ok(())
}

fn rolling_config(log_dir: &Path, level: LevelFilter) -> Result<Config> {
    let archive = log_dir.join("agentdeck.{}.log.gz");
    let roller = FixedWindowRoller::builder()
        .build(&archive.to_string_lossy(), ARCHIVED_LOGS)
        .context("invalid log archive pattern")?;
    let policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(MAX_LOG_BYTES)),
        Box::new(roller),
    );
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(log_dir.join(LOG_FILE), Box::new(policy))
        .context("failed to open log file")?;

    Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(level))
        .context("invalid logger configuration")
}

/// Installs the stderr logger for the plain subcommands. `RUST_LOG` wins over
/// the default level.
pub fn init_cli_logging(verbose: bool) {
    let _ = env_logger::Builder::new()
        .filter_level(level(verbose))
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}

fn level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_config_builds_in_a_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = rolling_config(dir.path(), LevelFilter::Info).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Info);
        assert!(dir.path().join(LOG_FILE).exists());
    }

    #[test]
    fn verbose_switches_to_debug() {
        assert_eq!(level(true), LevelFilter::Debug);
        assert_eq!(level(false), LevelFilter::Warn);
    }
}
