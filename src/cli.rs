use clap::{Parser, Subcommand};
use media_reaper::{CleanupType, LibraryType};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "media-reaper")]
#[command(about = "Expires media from the library once it has been around long enough", long_about = None)]
pub struct Cli {
    /// JSON export of the catalogs (`{"movies": [...], "tv": [...]}`)
    #[arg(long, global = true)]
    pub inventory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one cleanup type against one library
    Run {
        #[arg(long, value_parser = parse_library)]
        library: LibraryType,
        #[arg(long, default_value = "media", value_parser = parse_cleanup)]
        cleanup: CleanupType,
    },
    /// Run every enabled cleanup once
    RunAll,
    /// Run every enabled cleanup on the configured interval
    Schedule,
    /// Show free space and the expiration it selects
    CheckDisk,
    /// Print configuration values
    PrintConfig,
}

fn parse_library(raw: &str) -> Result<LibraryType, String> {
    raw.parse()
}

fn parse_cleanup(raw: &str) -> Result<CleanupType, String> {
    raw.parse()
}
