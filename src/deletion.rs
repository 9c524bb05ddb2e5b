use crate::config::AppConfig;
use crate::context::PassContext;
use crate::error::Error;
use crate::leaving_soon::LeavingSoonBuilder;
use crate::matcher;
use crate::model::{CandidateKind, CandidateRecord, CleanupType, LibraryItem, LibraryType};
use crate::report::{ItemOutcome, PassReporter, Tally};
use crate::services::Catalog;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
pub struct DeletionReport {
    pub tally: Tally,
    pub bytes_freed: u64,
    pub deleted: Vec<LibraryItem>,
    pub cannot_delete: Vec<LibraryItem>,
}

/// Removes expired items from the catalog and everything downstream of it.
pub struct DeletionPipeline<'a> {
    config: &'a AppConfig,
    builder: &'a LeavingSoonBuilder<'a>,
    reporter: &'a dyn PassReporter,
}

impl<'a> DeletionPipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        builder: &'a LeavingSoonBuilder<'a>,
        reporter: &'a dyn PassReporter,
    ) -> Self {
        Self {
            config,
            builder,
            reporter,
        }
    }

    pub fn delete(
        &self,
        ctx: &mut PassContext<'_>,
        cleanup_type: CleanupType,
        library_type: LibraryType,
        items: Vec<LibraryItem>,
    ) -> DeletionReport {
        let catalog = ctx.services().catalog(library_type);
        let mut report = DeletionReport::default();

        for mut item in items {
            if self.is_seeding(&item) {
                item.seeding = true;
                info!(
                    "{} is still seeding from {}, not deleting it",
                    item,
                    item.original_path.display()
                );
                report.tally.record(&ItemOutcome::Skipped("seeding"));
                report.cannot_delete.push(item);
                continue;
            }

            let outcome = match self.remove(catalog, &item) {
                Ok(()) => ItemOutcome::Done,
                Err(e) => {
                    error!("Failed to delete {} from {}: {}", item, catalog.name(), e);
                    ItemOutcome::Failed(e)
                }
            };
            report.tally.record(&outcome);
            if let ItemOutcome::Done = outcome {
                self.reporter.on_item_deleted(&item);
                report.bytes_freed += item.size_bytes;
                report.deleted.push(item);
            }
        }

        if !report.deleted.is_empty() {
            self.cleanup_requests(ctx, library_type, &report.deleted);
            self.cleanup_media_server(ctx, library_type, &mut report.deleted);
        }

        if !report.cannot_delete.is_empty() {
            if let Err(e) = self.builder.update_preview(
                ctx,
                cleanup_type,
                library_type,
                &mut report.cannot_delete,
                true,
            ) {
                error!("Failed to keep seeding items in the leaving soon preview: {}", e);
            }
        }

        if self.config.application.dry_run {
            info!(
                "DRY-RUN: would have deleted {} {} items ({} bytes)",
                report.deleted.len(),
                library_type,
                report.bytes_freed
            );
        } else {
            self.reporter
                .on_deleted(library_type, report.deleted.len(), report.bytes_freed);
        }

        if library_type == LibraryType::Tv && self.config.application.delete_empty_shows {
            self.delete_empty_series(catalog, &report.deleted);
        }

        report
    }

    fn is_seeding(&self, item: &LibraryItem) -> bool {
        let fs = &self.config.file_system;
        fs.access
            && fs.validate_seeding
            && !item.original_path.as_os_str().is_empty()
            && item.original_path.exists()
    }

    fn remove(&self, catalog: &dyn Catalog, item: &LibraryItem) -> Result<(), Error> {
        if self.config.application.dry_run {
            info!("DRY-RUN: would unmonitor and delete {} from {}", item, catalog.name());
            return Ok(());
        }

        if catalog.unmonitor(item)? {
            info!("Unmonitored {} in {}", item, catalog.name());
        }
        catalog.remove_entry(item)?;
        info!("Deleted {} from {}", item, catalog.name());
        Ok(())
    }

    fn cleanup_requests(
        &self,
        ctx: &mut PassContext<'_>,
        library_type: LibraryType,
        items: &[LibraryItem],
    ) {
        let Some(tracker) = ctx.services().requests() else {
            return;
        };
        let requests = match tracker.requests(library_type) {
            Ok(requests) => requests,
            Err(e) => {
                error!("Failed to list {} requests: {}", library_type, e);
                return;
            }
        };

        let catalog = ctx.services().catalog(library_type);
        let mut series_gone: HashMap<i64, bool> = HashMap::new();
        let mut removed: HashSet<&str> = HashSet::new();
        for item in items {
            for request in requests.iter().filter(|r| {
                self.request_covers(catalog, items, &mut series_gone, item, r, library_type)
            }) {
                if !removed.insert(request.id.as_str()) {
                    continue;
                }
                if self.config.application.dry_run {
                    info!("DRY-RUN: would delete request {} for {}", request.id, item);
                    continue;
                }
                match tracker.delete_request(&request.id) {
                    Ok(()) => info!("Deleted request {} for {}", request.id, item),
                    Err(e) => error!("Failed to delete request {} for {}: {}", request.id, item, e),
                }
            }
        }
    }

    /// Whether `request` can go now that `item` is deleted.
    ///
    /// A season request goes with its season. A request for a whole series
    /// stays until no season of that series has files left.
    fn request_covers(
        &self,
        catalog: &dyn Catalog,
        deleted: &[LibraryItem],
        series_gone: &mut HashMap<i64, bool>,
        item: &LibraryItem,
        request: &CandidateRecord,
        library_type: LibraryType,
    ) -> bool {
        if library_type == LibraryType::Movies {
            return matcher::matches(item, request, library_type, false);
        }
        let season_request =
            request.kind == Some(CandidateKind::Season) || request.season_index.is_some();
        if season_request {
            return matcher::matches(item, request, library_type, true);
        }
        if !matcher::matches(item, request, library_type, false) {
            return false;
        }
        *series_gone
            .entry(item.id)
            .or_insert_with(|| series_has_no_files(catalog, item.id, deleted))
    }

    fn cleanup_media_server(
        &self,
        ctx: &mut PassContext<'_>,
        library_type: LibraryType,
        items: &mut [LibraryItem],
    ) {
        let Some(server) = ctx.services().media_server() else {
            return;
        };
        let records = match ctx.media_items(library_type) {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to list {} on the media server: {}", library_type, e);
                return;
            }
        };

        for item in items.iter_mut() {
            let ids: Vec<String> = records
                .iter()
                .filter(|r| matcher::matches(item, r, library_type, true))
                .map(|r| r.id.clone())
                .collect();
            item.media_server_ids = ids;
            if item.media_server_ids.is_empty() {
                debug!("{} is not known to the media server", item);
                continue;
            }

            for id in &item.media_server_ids {
                if self.config.application.dry_run {
                    info!("DRY-RUN: would delete media server item {} for {}", id, item);
                    continue;
                }
                match server.delete_item(id) {
                    Ok(()) => info!("Deleted media server item {} for {}", id, item),
                    Err(e) => error!("Failed to delete media server item {} for {}: {}", id, item, e),
                }
            }
        }
    }

    /// Drop series whose seasons are all gone, unless more episodes are expected.
    fn delete_empty_series(&self, catalog: &dyn Catalog, deleted: &[LibraryItem]) {
        let series_ids: BTreeSet<i64> = deleted.iter().map(|item| item.id).collect();

        for series_id in series_ids {
            let seasons = match catalog.series_seasons(series_id) {
                Ok(seasons) => seasons,
                Err(e) => {
                    error!("Failed to check seasons of series {}: {}", series_id, e);
                    continue;
                }
            };
            let Some(latest) = seasons.iter().max_by_key(|s| s.number) else {
                continue;
            };
            if latest.monitored {
                debug!(
                    "Series {} still monitors season {}, waiting for new episodes",
                    series_id, latest.number
                );
                continue;
            }
            if !seasons.iter().all(|s| !s.monitored && s.file_count == 0) {
                continue;
            }

            if self.config.application.dry_run {
                info!("DRY-RUN: would delete empty series {} from {}", series_id, catalog.name());
                continue;
            }
            match catalog.delete_series(series_id) {
                Ok(()) => info!("Deleted empty series {} from {}", series_id, catalog.name()),
                Err(e) => error!("Failed to delete empty series {}: {}", series_id, e),
            }
        }
    }
}

/// True when every season of `series_id` is either empty or among `deleted`.
/// Seasons deleted in a dry run still report their files, hence the exclusion.
fn series_has_no_files(catalog: &dyn Catalog, series_id: i64, deleted: &[LibraryItem]) -> bool {
    let removed: HashSet<u32> = deleted
        .iter()
        .filter(|item| item.id == series_id)
        .filter_map(|item| item.season)
        .collect();
    match catalog.series_seasons(series_id) {
        Ok(seasons) => seasons
            .iter()
            .all(|s| s.file_count == 0 || removed.contains(&s.number)),
        Err(e) => {
            warn!("Keeping requests for series {}, seasons unknown: {}", series_id, e);
            false
        }
    }
}
