use crate::config::AppConfig;
use crate::context::PassContext;
use crate::deletion::DeletionPipeline;
use crate::episodes::EpisodeCleanup;
use crate::error::Error;
use crate::leaving_soon::LeavingSoonBuilder;
use crate::matcher;
use crate::model::{CleanupType, LibraryItem, LibraryType};
use crate::report::{PassReporter, PassSummary};
use crate::retention::{
    partition, CleanupStrategy, DiskPressureGate, DiskPressureStrategy, DiskProbe, TagStrategy,
};
use crate::services::Services;
use chrono::{DateTime, Duration, Utc};
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// Which policy families have completed at least one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub media_ran: bool,
    pub tag_ran: bool,
    pub episodes_ran: bool,
}

/// Runs retention passes one after another. Nothing is shared between
/// passes except configuration; each pass fetches fresh data.
pub struct RetentionScheduler<'a> {
    config: &'a AppConfig,
    services: &'a Services,
    probe: &'a dyn DiskProbe,
    reporter: &'a dyn PassReporter,
    builder: LeavingSoonBuilder<'a>,
    status: SchedulerStatus,
}

impl<'a> RetentionScheduler<'a> {
    pub fn new(
        config: &'a AppConfig,
        services: &'a Services,
        probe: &'a dyn DiskProbe,
        reporter: &'a dyn PassReporter,
    ) -> Self {
        Self {
            config,
            services,
            probe,
            reporter,
            builder: LeavingSoonBuilder::new(config, reporter),
            status: SchedulerStatus::default(),
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status
    }

    /// One full cycle of `strategy` over one library type.
    pub fn run_pass(
        &self,
        strategy: &dyn CleanupStrategy,
        library_type: LibraryType,
    ) -> Result<PassSummary, Error> {
        self.run_pass_at(strategy, library_type, false, Utc::now())
    }

    /// Like [`run_pass`](Self::run_pass) at a fixed `now`. The reporter sees a
    /// completed summary even when the pass fails; `not_run_reason` then
    /// carries the error.
    pub fn run_pass_at(
        &self,
        strategy: &dyn CleanupStrategy,
        library_type: LibraryType,
        only_add_links: bool,
        now: DateTime<Utc>,
    ) -> Result<PassSummary, Error> {
        let cleanup_type = strategy.cleanup_type();
        let span = info_span!("pass", cleanup = %cleanup_type, library = %library_type);
        let _entered = span.enter();

        let started = Instant::now();
        let mut summary = PassSummary::new(cleanup_type, library_type);
        self.reporter.on_pass_start(cleanup_type, library_type);

        let result = self.execute_pass(strategy, library_type, only_add_links, now, &mut summary);
        summary.duration = started.elapsed();
        if let Err(e) = &result {
            summary.not_run_reason = Some(format!("failed: {}", e));
        }
        self.reporter.on_pass_complete(&summary);
        result.map(|()| summary)
    }

    fn execute_pass(
        &self,
        strategy: &dyn CleanupStrategy,
        library_type: LibraryType,
        only_add_links: bool,
        now: DateTime<Utc>,
        summary: &mut PassSummary,
    ) -> Result<(), Error> {
        let started = Instant::now();
        let cleanup_type = strategy.cleanup_type();

        if !strategy.need_to_delete(library_type)? {
            info!("No cleanup needed ({})", strategy.describe());
            summary.not_run_reason = Some("no cleanup needed".to_string());
            return Ok(());
        }

        let Some(expiration) = strategy.determine_duration(library_type)? else {
            error!(
                "Could not determine an expiration ({}), skipping",
                strategy.describe()
            );
            return Err(Error::InvalidConfig(format!(
                "no expiration for {} ({})",
                library_type,
                strategy.describe()
            )));
        };

        let mut ctx = PassContext::new(self.services);
        let items = self.fetch_items(&mut ctx, strategy, library_type)?;
        info!(
            "{} entries considered for {}, expiring after {} days",
            items.len(),
            strategy.describe(),
            expiration.num_days()
        );

        let mut split = partition(items, expiration, self.config.leaving_soon(), now);
        self.reporter
            .on_partition(split.keep.len(), split.preview.len(), split.delete.len());
        summary.kept = split.keep.len();

        match self.builder.update_preview(
            &mut ctx,
            cleanup_type,
            library_type,
            &mut split.preview,
            only_add_links,
        ) {
            Ok(tally) => summary.preview = tally,
            Err(e) => error!("Failed to update the leaving soon preview: {}", e),
        }

        let pipeline = DeletionPipeline::new(self.config, &self.builder, self.reporter);
        let report = pipeline.delete(&mut ctx, cleanup_type, library_type, split.delete);
        summary.deletion = report.tally;
        summary.bytes_freed = report.bytes_freed;

        info!(
            "Pass finished in {:.2}s: {} kept, {} leaving soon, {} deleted, {} seeding, {} failed",
            started.elapsed().as_secs_f64(),
            summary.kept,
            summary.preview.done,
            summary.deletion.done,
            summary.deletion.skipped,
            summary.preview.failed + summary.deletion.failed,
        );
        Ok(())
    }

    fn fetch_items(
        &self,
        ctx: &mut PassContext<'_>,
        strategy: &dyn CleanupStrategy,
        library_type: LibraryType,
    ) -> Result<Vec<LibraryItem>, Error> {
        let mut items: Vec<LibraryItem> = self
            .services
            .catalog(library_type)
            .entries()?
            .into_iter()
            .filter(|item| item.library_type() == library_type)
            .filter(|item| strategy.accepts(item))
            .filter(|item| {
                let keep = item.tags.iter().any(|t| self.config.is_excluded_tag(t));
                if keep {
                    debug!("{} carries an exclusion tag, keeping it", item);
                }
                !keep
            })
            .collect();

        if self.config.application.exclude_favorites {
            let favorites = ctx.favorites()?;
            items.retain(|item| {
                let favorite = favorites
                    .iter()
                    .any(|f| matcher::matches(item, f, library_type, false));
                if favorite {
                    debug!("{} is a favorite, keeping it", item);
                }
                !favorite
            });
        }

        for provider in &self.services.watch_history {
            if let Err(e) = provider.populate(&mut items, library_type) {
                warn!("Failed to load watch history for {}: {}", library_type, e);
            }
        }

        Ok(items)
    }

    /// Every pass one cleanup type has, for one or both library types.
    pub fn run_cleanup(
        &mut self,
        cleanup_type: CleanupType,
        library_type: Option<LibraryType>,
        now: DateTime<Utc>,
    ) -> Vec<PassSummary> {
        let library_types: Vec<LibraryType> = match library_type {
            Some(lt) => vec![lt],
            None => LibraryType::ALL.to_vec(),
        };
        let mut summaries = Vec::new();

        match cleanup_type {
            CleanupType::Media => {
                let gate = DiskPressureGate::from_config(self.config, self.probe);
                let strategy = DiskPressureStrategy::from_config(self.config, gate);
                for lt in library_types {
                    self.collect(&strategy, lt, false, now, &mut summaries);
                }
                self.status.media_ran = true;
            }
            CleanupType::Tag => {
                for lt in library_types {
                    for (index, schedule) in self.config.tag_deletion.schedules.iter().enumerate() {
                        let strategy = TagStrategy::new(&schedule.tag, Duration::days(schedule.days));
                        // all tags share one preview; only the first one may clear it
                        self.collect(&strategy, lt, index > 0, now, &mut summaries);
                    }
                }
                self.status.tag_ran = true;
            }
            CleanupType::Episodes => {
                let cleanup = EpisodeCleanup::new(self.config);
                for schedule in &self.config.episode_deletion.schedules {
                    let span = info_span!(
                        "pass",
                        cleanup = %CleanupType::Episodes,
                        tag = %schedule.tag
                    );
                    let _entered = span.enter();
                    let started = Instant::now();
                    self.reporter.on_pass_start(CleanupType::Episodes, LibraryType::Tv);
                    let mut summary = PassSummary::new(CleanupType::Episodes, LibraryType::Tv);
                    let result = cleanup.run(self.services, schedule, now);
                    summary.duration = started.elapsed();
                    match result {
                        Ok(tally) => {
                            summary.deletion = tally;
                            self.reporter.on_pass_complete(&summary);
                            summaries.push(summary);
                        }
                        Err(e) => {
                            error!("Episode cleanup failed: {}", e);
                            summary.not_run_reason = Some(format!("failed: {}", e));
                            self.reporter.on_pass_complete(&summary);
                        }
                    }
                }
                self.status.episodes_ran = true;
            }
        }

        summaries
    }

    /// Run every enabled policy type, strictly one pass at a time.
    pub fn run_all(&mut self, now: DateTime<Utc>) -> Vec<PassSummary> {
        let mut summaries = Vec::new();
        if self.config.media_deletion.enabled {
            summaries.extend(self.run_cleanup(CleanupType::Media, None, now));
        }
        if self.config.tag_deletion.enabled {
            summaries.extend(self.run_cleanup(CleanupType::Tag, None, now));
        }
        if self.config.episode_deletion.enabled {
            summaries.extend(self.run_cleanup(CleanupType::Episodes, None, now));
        }
        summaries
    }

    fn collect(
        &self,
        strategy: &dyn CleanupStrategy,
        library_type: LibraryType,
        only_add_links: bool,
        now: DateTime<Utc>,
        summaries: &mut Vec<PassSummary>,
    ) {
        match self.run_pass_at(strategy, library_type, only_add_links, now) {
            Ok(summary) => summaries.push(summary),
            Err(e) => error!(
                "{} pass for {} ({}) aborted: {}",
                strategy.cleanup_type(),
                library_type,
                strategy.describe(),
                e
            ),
        }
    }
}
