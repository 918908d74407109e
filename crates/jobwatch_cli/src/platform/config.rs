use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use jobwatch_core::{ArchiveCategory, DEFAULT_MIN_DISPLAY_TIME};
use jobwatch_engine::SyncSettings;
use jobwatch_logging::parse_level;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use super::args::Args;
use super::logging::LogDestination;

const DEFAULT_CONFIG_FILENAME: &str = "jobwatch.ron";

/// On-disk shape of `jobwatch.ron`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ConfigFile {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub long_poll_timeout_secs: u64,
    pub timeout_margin_secs: u64,
    pub poll_retry_delay_ms: u64,
    pub resync_retry_delay_ms: u64,
    pub archive_page_size: u32,
    pub min_display_ms: u64,
    pub log_level: String,
    pub initial_tab: ArchiveCategory,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let sync = SyncSettings::default();
        Self {
            base_url: sync.base_url,
            connect_timeout_secs: sync.connect_timeout.as_secs(),
            request_timeout_secs: sync.request_timeout.as_secs(),
            long_poll_timeout_secs: sync.long_poll_timeout_secs,
            timeout_margin_secs: sync.timeout_margin.as_secs(),
            poll_retry_delay_ms: duration_ms(sync.poll_retry_delay),
            resync_retry_delay_ms: duration_ms(sync.resync_retry_delay),
            archive_page_size: sync.archive_page_size,
            min_display_ms: duration_ms(DEFAULT_MIN_DISPLAY_TIME),
            log_level: "info".to_string(),
            initial_tab: ArchiveCategory::Rename,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub sync: SyncSettings,
    pub min_display_time: Duration,
    pub log_level: LevelFilter,
    pub log: LogDestination,
    pub initial_tab: ArchiveCategory,
}

/// `None` reads `./jobwatch.ron` if it exists and falls back to defaults.
pub(crate) fn load_config_file(path: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
    };
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound && !required => {
            return Ok(ConfigFile::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };
    ron::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
}

/// Layers command-line overrides on top of the config file.
pub(crate) fn resolve(args: &Args, file: ConfigFile) -> anyhow::Result<Config> {
    let level_name = args.log_level.as_deref().unwrap_or(&file.log_level);
    let Some(log_level) = parse_level(level_name) else {
        bail!("unknown log level '{level_name}'");
    };
    if file.archive_page_size == 0 {
        bail!("archive_page_size must be at least 1");
    }

    let sync = SyncSettings {
        base_url: args.base_url.clone().unwrap_or(file.base_url),
        connect_timeout: Duration::from_secs(file.connect_timeout_secs),
        request_timeout: Duration::from_secs(file.request_timeout_secs),
        long_poll_timeout_secs: file.long_poll_timeout_secs,
        timeout_margin: Duration::from_secs(file.timeout_margin_secs),
        poll_retry_delay: Duration::from_millis(file.poll_retry_delay_ms),
        resync_retry_delay: Duration::from_millis(file.resync_retry_delay_ms),
        archive_page_size: file.archive_page_size,
    };

    Ok(Config {
        sync,
        min_display_time: Duration::from_millis(file.min_display_ms),
        log_level,
        log: args.log,
        initial_tab: args.tab.unwrap_or(file.initial_tab),
    })
}
