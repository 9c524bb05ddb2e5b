use super::paths;
use crate::config::AppConfig;
use crate::context::PassContext;
use crate::error::Error;
use crate::model::{CleanupType, LibraryItem, LibraryType};
use crate::platform;
use crate::report::{ItemOutcome, PassReporter, Tally};
use crate::services::Services;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, trace, warn};
use walkdir::WalkDir;

/// Written into every preview directory. Playback servers stop rescanning a
/// library folder that disappeared or is completely empty.
pub const KEEP_FILE: &str = ".keep";

/// Maintains the mirrored "leaving soon" symlink trees and the playback
/// server libraries that point at them.
pub struct LeavingSoonBuilder<'a> {
    config: &'a AppConfig,
    reporter: &'a dyn PassReporter,
    media_patterns: Vec<Pattern>,
    ignore_patterns: Vec<Pattern>,
}

const CASE_INSENSITIVE: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

impl<'a> LeavingSoonBuilder<'a> {
    pub fn new(config: &'a AppConfig, reporter: &'a dyn PassReporter) -> Self {
        Self {
            config,
            reporter,
            media_patterns: compile_patterns(&config.application.link_media_patterns),
            ignore_patterns: compile_patterns(&config.application.link_ignore_patterns),
        }
    }

    pub fn library_name(cleanup_type: CleanupType, library_type: LibraryType) -> String {
        format!(
            "{} ({} Leaving Soon)",
            library_type.display_name(),
            cleanup_type.display_name()
        )
    }

    /// Bring the preview for one cleanup/library pair in line with `items`.
    ///
    /// With `only_add_links` the existing tree is never cleared, so several
    /// calls can contribute to the same preview within one pass.
    pub fn update_preview(
        &self,
        ctx: &mut PassContext<'_>,
        cleanup_type: CleanupType,
        library_type: LibraryType,
        items: &mut [LibraryItem],
        only_add_links: bool,
    ) -> Result<Tally, Error> {
        if !self.config.application.leaving_soon_type.covers(library_type) {
            debug!("Leaving soon is disabled for {}", library_type);
            return Ok(Tally::default());
        }

        let dir = self.config.leaving_soon_dir(cleanup_type, library_type);

        if items.is_empty() {
            if !only_add_links {
                info!("Nothing is leaving soon, clearing {}", dir.display());
                reset_dir(&dir)?;
                write_keep_file(&dir)?;
            }
            return Ok(Tally::default());
        }

        fs::create_dir_all(&dir)?;

        if let Err(e) = self.ensure_virtual_library(ctx, cleanup_type, library_type) {
            warn!(
                "Could not register {} with the media server: {}",
                Self::library_name(cleanup_type, library_type),
                e
            );
        }

        if self.config.application.from_scratch && !only_add_links {
            debug!("Rebuilding {} from scratch", dir.display());
            reset_dir(&dir)?;
        }

        populate_extra_files(ctx.services(), items);

        let mut tally = Tally::default();
        for item in items.iter() {
            let outcome = match self.link_item(item, &dir) {
                Ok(()) => {
                    self.reporter.on_item_linked(item);
                    ItemOutcome::Done
                }
                Err(e) => {
                    error!("Failed to link {} into {}: {}", item, dir.display(), e);
                    ItemOutcome::Failed(e)
                }
            };
            tally.record(&outcome);
        }

        write_keep_file(&dir)?;

        info!(
            "{} items leaving soon in {} ({} failed)",
            tally.done,
            dir.display(),
            tally.failed
        );
        Ok(tally)
    }

    fn ensure_virtual_library(
        &self,
        ctx: &mut PassContext<'_>,
        cleanup_type: CleanupType,
        library_type: LibraryType,
    ) -> Result<(), Error> {
        let Some(server) = ctx.services().media_server() else {
            return Ok(());
        };

        let name = Self::library_name(cleanup_type, library_type);
        let server_path = self
            .config
            .media_server_leaving_soon_dir(cleanup_type, library_type)
            .to_string_lossy()
            .into_owned();
        let dry_run = self.config.application.dry_run;

        let libraries = ctx.libraries()?;
        if let Some(library) = libraries.iter_mut().find(|l| l.name == name) {
            if library.paths.iter().any(|p| p == &server_path) {
                trace!("{} already watches {}", name, server_path);
                return Ok(());
            }
            if dry_run {
                info!("DRY-RUN: would add {} to media server library {}", server_path, name);
                return Ok(());
            }
            server.add_path(library, &server_path)?;
            info!("Added {} to media server library {}", server_path, name);
            library.paths.push(server_path);
            return Ok(());
        }

        if dry_run {
            info!("DRY-RUN: would create media server library {} at {}", name, server_path);
            return Ok(());
        }
        let library = server.create_library(&name, library_type.collection_type(), &[server_path])?;
        info!("Created media server library {}", library.name);
        ctx.remember_library(library);
        Ok(())
    }

    fn link_item(&self, item: &LibraryItem, dir: &Path) -> Result<(), Error> {
        let structure = paths::resolve(item, dir)?;
        if !structure.source_file.exists() {
            return Err(Error::Path(format!(
                "{} does not exist",
                structure.source_file.display()
            )));
        }

        let extras_dir = if structure.source_file.is_dir() {
            // Link the media files one by one, never the folder itself.
            // Release junk, artwork and metadata stay out of the preview.
            fs::create_dir_all(&structure.target_file)?;
            for entry in WalkDir::new(&structure.source_file)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = entry.map_err(io::Error::from)?;
                if !entry.path().is_file() || !self.is_media(entry.path()) {
                    continue;
                }
                create_link(entry.path(), &structure.target_file.join(entry.file_name()))?;
            }
            structure.target_file
        } else {
            fs::create_dir_all(&structure.target_folder)?;
            create_link(&structure.source_file, &structure.target_file)?;
            structure.target_folder
        };

        for extra in &item.extra_files {
            copy_extra(extra, &extras_dir)?;
        }
        Ok(())
    }

    /// Matches an allowed media pattern and none of the ignore patterns.
    fn is_media(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let matches_any =
            |patterns: &[Pattern]| patterns.iter().any(|p| p.matches_with(name, CASE_INSENSITIVE));
        matches_any(&self.media_patterns) && !matches_any(&self.ignore_patterns)
    }
}

fn populate_extra_files(services: &Services, items: &mut [LibraryItem]) {
    let Some(provider) = services.extra_files() else {
        return;
    };
    for item in items.iter_mut() {
        match provider.extra_files(item) {
            Ok(files) => item.extra_files = files,
            Err(e) => warn!("Could not look up extra files for {}: {}", item, e),
        }
    }
}

/// Link `target` to `source` unless something is already there.
fn create_link(source: &Path, target: &Path) -> Result<(), Error> {
    if platform::entry_exists(target) {
        if let Ok(existing) = fs::read_link(target) {
            if existing != source {
                return Err(Error::Path(format!(
                    "{} already links to {}",
                    target.display(),
                    existing.display()
                )));
            }
        }
        trace!("{} already exists", target.display());
        return Ok(());
    }
    platform::symlink_file(source, target)?;
    trace!("Linked {} -> {}", target.display(), source.display());
    Ok(())
}

fn copy_extra(extra: &Path, dir: &Path) -> Result<(), Error> {
    let Some(name) = extra.file_name() else {
        return Ok(());
    };
    let target = dir.join(name);
    if platform::entry_exists(&target) {
        return Ok(());
    }
    fs::copy(extra, &target)?;
    Ok(())
}

fn reset_dir(dir: &Path) -> Result<(), Error> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn write_keep_file(dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(KEEP_FILE), b"")?;
    Ok(())
}
