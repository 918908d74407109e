use std::path::PathBuf;

use clap::Parser;
use jobwatch_core::ArchiveCategory;

use super::logging::LogDestination;

/// Follow document-job progress and browse the job archive.
#[derive(Debug, Parser)]
#[command(name = "jobwatch", version)]
pub struct Args {
    /// Root of the backend API (overrides the config file).
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// RON config file; `./jobwatch.ron` is used when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,

    /// One of off, error, warn, info, debug, trace.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Archive tab shown at startup: rename, index, scan or error.
    #[arg(long, value_name = "CATEGORY")]
    pub tab: Option<ArchiveCategory>,
}
