mod cli;
mod logging;
mod progress;

use std::path::Path;
use std::process;
use std::thread;
use std::time::Duration as StdDuration;

use anyhow::Context;
use chrono::Utc;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use colored::*;
use dotenv::dotenv;
use media_reaper::config::load_configuration;
use media_reaper::retention::{
    CleanupStrategy, DiskPressureGate, DiskPressureStrategy, SystemDiskProbe,
};
use media_reaper::services::snapshot::SnapshotCatalog;
use media_reaper::{AppConfig, LibraryType, PassSummary, RetentionScheduler, Services};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Run { library, cleanup }) => {
            let services = build_services(args.inventory.as_deref())?;
            let probe = SystemDiskProbe;
            let reporter = CliReporter::new();
            let mut scheduler = RetentionScheduler::new(&config, &services, &probe, &reporter);
            let summaries = scheduler.run_cleanup(cleanup, Some(library), Utc::now());
            print_summaries(&config, &summaries);
        }
        Some(Commands::RunAll) => {
            let services = build_services(args.inventory.as_deref())?;
            run_all(&config, &services);
        }
        Some(Commands::Schedule) => {
            let services = build_services(args.inventory.as_deref())?;
            let interval = config.application.schedule_interval_minutes.max(1);
            info!("Running every {} minutes", interval);
            loop {
                run_all(&config, &services);
                thread::sleep(StdDuration::from_secs(interval * 60));
            }
        }
        Some(Commands::CheckDisk) => check_disk(&config)?,
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn build_services(inventory: Option<&Path>) -> anyhow::Result<Services> {
    let (movies, tv) = match inventory {
        Some(path) => (
            SnapshotCatalog::load(path, LibraryType::Movies)
                .with_context(|| format!("loading movies from {}", path.display()))?,
            SnapshotCatalog::load(path, LibraryType::Tv)
                .with_context(|| format!("loading tv from {}", path.display()))?,
        ),
        None => {
            warn!("No --inventory given, both catalogs are empty");
            (
                SnapshotCatalog::empty(LibraryType::Movies),
                SnapshotCatalog::empty(LibraryType::Tv),
            )
        }
    };
    Ok(Services::new(Box::new(movies), Box::new(tv)))
}

fn run_all(config: &AppConfig, services: &Services) {
    let probe = SystemDiskProbe;
    let reporter = CliReporter::new();
    let mut scheduler = RetentionScheduler::new(config, services, &probe, &reporter);
    let summaries = scheduler.run_all(Utc::now());
    print_summaries(config, &summaries);
    let status = scheduler.status();
    info!(
        "Cycle finished: media {}, tag {}, episodes {}",
        status.media_ran, status.tag_ran, status.episodes_ran
    );
}

fn print_summaries(config: &AppConfig, summaries: &[PassSummary]) {
    println!();
    if config.application.dry_run {
        println!("{}", "Dry run: nothing was deleted".yellow());
    }
    for summary in summaries.iter().filter(|s| s.ran()) {
        info!(
            "{} {}: {} kept, {} leaving soon, {} deleted, {} seeding, {} failed, {} freed",
            summary.cleanup_type,
            summary.library_type,
            format!("{}", summary.kept).cyan(),
            format!("{}", summary.preview.done).yellow(),
            format!("{}", summary.deletion.done).red(),
            format!("{}", summary.deletion.skipped).cyan(),
            format!("{}", summary.preview.failed + summary.deletion.failed).red(),
            format_bytes(summary.bytes_freed).green(),
        );
    }
}

fn check_disk(config: &AppConfig) -> anyhow::Result<()> {
    let probe = SystemDiskProbe;
    let gate = DiskPressureGate::from_config(config, &probe);
    if !gate.file_system_access() {
        println!("{}", "File system access is disabled, disk cleanup never runs".yellow());
        return Ok(());
    }

    let free = gate.free_percent().context("probing free space")?;
    println!(
        "Free space at {}: {}",
        config.file_system.free_space_check_dir,
        format!("{:.2}%", free).cyan()
    );

    let strategy = DiskPressureStrategy::from_config(config, gate);
    for library_type in LibraryType::ALL {
        match strategy.determine_duration(library_type)? {
            Some(expiration) => println!(
                "  {}: expire after {}",
                library_type,
                format!("{} days", expiration.num_days()).red()
            ),
            None => println!("  {}: {}", library_type, "nothing to do".green()),
        }
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
