use crate::config::{AppConfig, EpisodeSchedule};
use crate::error::Error;
use crate::model::{LibraryItem, LibraryType};
use crate::report::{ItemOutcome, Tally};
use crate::services::{Catalog, EpisodeRecord, Services};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Episodes past the newest `max_episodes`, or aired before `cutoff`.
///
/// Only episodes with a file are considered. Episodes without an air date
/// are only ever dropped by the count limit.
pub fn select_expired(
    episodes: &[EpisodeRecord],
    max_episodes: usize,
    cutoff: DateTime<Utc>,
) -> Vec<EpisodeRecord> {
    let mut with_files: Vec<&EpisodeRecord> =
        episodes.iter().filter(|e| e.file_id.is_some()).collect();
    // newest first
    with_files.sort_by(|a, b| {
        b.air_date
            .cmp(&a.air_date)
            .then(b.season.cmp(&a.season))
            .then(b.number.cmp(&a.number))
    });

    with_files
        .into_iter()
        .enumerate()
        .filter(|(index, episode)| {
            *index >= max_episodes || episode.air_date.is_some_and(|aired| aired < cutoff)
        })
        .map(|(_, episode)| episode.clone())
        .collect()
}

/// Air date before which episodes are too old. Ages beyond chrono's range
/// saturate at the earliest representable instant.
pub fn age_cutoff(now: DateTime<Utc>, max_age_days: i64) -> DateTime<Utc> {
    Duration::try_days(max_age_days)
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Trims tagged series down to their most recent episodes (daily shows, news).
pub struct EpisodeCleanup<'a> {
    config: &'a AppConfig,
}

impl<'a> EpisodeCleanup<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        services: &Services,
        schedule: &EpisodeSchedule,
        now: DateTime<Utc>,
    ) -> Result<Tally, Error> {
        let catalog = services.catalog(LibraryType::Tv);
        let series: BTreeMap<i64, LibraryItem> = catalog
            .entries()?
            .into_iter()
            .filter(|item| item.has_tag(&schedule.tag))
            .filter(|item| !item.tags.iter().any(|t| self.config.is_excluded_tag(t)))
            .map(|item| (item.id, item))
            .collect();
        debug!(
            "{} series tagged '{}' for episode cleanup",
            series.len(),
            schedule.tag
        );

        let cutoff = age_cutoff(now, schedule.max_age_days);
        let mut tally = Tally::default();
        for (series_id, item) in &series {
            match self.clean_series(catalog, *series_id, schedule.max_episodes, cutoff) {
                Ok(series_tally) => tally.merge(series_tally),
                Err(e) => {
                    error!("Episode cleanup of {} failed: {}", item.title, e);
                    tally.record(&ItemOutcome::Failed(e));
                }
            }
        }
        Ok(tally)
    }

    fn clean_series(
        &self,
        catalog: &dyn Catalog,
        series_id: i64,
        max_episodes: usize,
        cutoff: DateTime<Utc>,
    ) -> Result<Tally, Error> {
        let expired = select_expired(&catalog.episodes(series_id)?, max_episodes, cutoff);
        let mut tally = Tally::default();
        if expired.is_empty() {
            return Ok(tally);
        }

        let mut removed_ids = Vec::new();
        for episode in &expired {
            let Some(file_id) = episode.file_id else {
                continue;
            };
            if self.config.application.dry_run {
                info!(
                    "DRY-RUN: would delete S{:02}E{:02} of series {}",
                    episode.season, episode.number, series_id
                );
                tally.record(&ItemOutcome::Done);
                continue;
            }
            let outcome = match catalog.delete_episode_file(file_id) {
                Ok(()) => {
                    info!(
                        "Deleted S{:02}E{:02} of series {}",
                        episode.season, episode.number, series_id
                    );
                    removed_ids.push(episode.id);
                    ItemOutcome::Done
                }
                Err(e) => {
                    error!(
                        "Failed to delete S{:02}E{:02} of series {}: {}",
                        episode.season, episode.number, series_id, e
                    );
                    ItemOutcome::Failed(e)
                }
            };
            tally.record(&outcome);
        }

        // The files are gone either way; a failed unmonitor is one more failure.
        if !removed_ids.is_empty() {
            if let Err(e) = catalog.unmonitor_episodes(&removed_ids) {
                error!("Failed to unmonitor episodes of series {}: {}", series_id, e);
                tally.record(&ItemOutcome::Failed(e));
            }
        }
        Ok(tally)
    }
}
