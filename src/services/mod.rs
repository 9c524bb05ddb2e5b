//! Interfaces of the systems the retention engine talks to.
//!
//! Everything here is blocking; a pass simply waits on each call. Clients
//! for concrete products live outside this crate and implement these traits.

pub mod snapshot;

use crate::error::Error;
use crate::model::{CandidateRecord, LibraryItem, LibraryType};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Monitoring and file state of one season as the catalog sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonState {
    pub number: u32,
    pub monitored: bool,
    pub file_count: u32,
}

#[derive(Debug, Clone)]
pub struct EpisodeRecord {
    pub id: i64,
    pub season: u32,
    pub number: u32,
    pub air_date: Option<DateTime<Utc>>,
    pub file_id: Option<i64>,
    pub monitored: bool,
}

/// The service that owns which files exist and when they were imported.
/// One instance per media type.
pub trait Catalog {
    fn name(&self) -> &'static str;

    fn entries(&self) -> Result<Vec<LibraryItem>, Error>;

    /// Stop monitoring the entry (or season). Returns true if it was monitored before.
    fn unmonitor(&self, item: &LibraryItem) -> Result<bool, Error>;

    /// Remove the entry (or season) together with its files.
    fn remove_entry(&self, item: &LibraryItem) -> Result<(), Error>;

    fn series_seasons(&self, _series_id: i64) -> Result<Vec<SeasonState>, Error> {
        Ok(Vec::new())
    }

    fn delete_series(&self, series_id: i64) -> Result<(), Error> {
        Err(Error::service(
            self.name(),
            format!("cannot delete series {}: not a series catalog", series_id),
        ))
    }

    fn episodes(&self, _series_id: i64) -> Result<Vec<EpisodeRecord>, Error> {
        Ok(Vec::new())
    }

    fn delete_episode_file(&self, file_id: i64) -> Result<(), Error> {
        Err(Error::service(
            self.name(),
            format!("cannot delete episode file {}: not a series catalog", file_id),
        ))
    }

    fn unmonitor_episodes(&self, _episode_ids: &[i64]) -> Result<(), Error> {
        Ok(())
    }
}

/// A library registered on the playback server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualLibrary {
    pub id: String,
    pub name: String,
    pub collection_type: String,
    pub paths: Vec<String>,
}

pub trait MediaServer {
    fn libraries(&self) -> Result<Vec<VirtualLibrary>, Error>;

    fn create_library(
        &self,
        name: &str,
        collection_type: &str,
        paths: &[String],
    ) -> Result<VirtualLibrary, Error>;

    fn add_path(&self, library: &VirtualLibrary, path: &str) -> Result<(), Error>;

    fn items(&self, library_type: LibraryType) -> Result<Vec<CandidateRecord>, Error>;

    fn delete_item(&self, id: &str) -> Result<(), Error>;

    fn favorites(&self) -> Result<Vec<CandidateRecord>, Error>;
}

pub trait RequestTracker {
    fn requests(&self, library_type: LibraryType) -> Result<Vec<CandidateRecord>, Error>;

    fn delete_request(&self, id: &str) -> Result<(), Error>;
}

pub trait WatchHistory {
    /// Fill in `last_seen` where this provider knows better.
    fn populate(&self, items: &mut [LibraryItem], library_type: LibraryType) -> Result<(), Error>;
}

/// Files that belong next to a media file in the preview tree (subtitles).
pub trait ExtraFiles {
    fn extra_files(&self, item: &LibraryItem) -> Result<Vec<PathBuf>, Error>;
}

/// Every collaborator a pass may call, built once at startup.
pub struct Services {
    pub movies: Box<dyn Catalog>,
    pub tv: Box<dyn Catalog>,
    pub media_server: Option<Box<dyn MediaServer>>,
    pub requests: Option<Box<dyn RequestTracker>>,
    pub watch_history: Vec<Box<dyn WatchHistory>>,
    pub extra_files: Option<Box<dyn ExtraFiles>>,
}

impl Services {
    pub fn new(movies: Box<dyn Catalog>, tv: Box<dyn Catalog>) -> Self {
        Self {
            movies,
            tv,
            media_server: None,
            requests: None,
            watch_history: Vec::new(),
            extra_files: None,
        }
    }

    pub fn catalog(&self, library_type: LibraryType) -> &dyn Catalog {
        match library_type {
            LibraryType::Movies => self.movies.as_ref(),
            LibraryType::Tv => self.tv.as_ref(),
        }
    }

    pub fn media_server(&self) -> Option<&dyn MediaServer> {
        self.media_server.as_deref()
    }

    pub fn requests(&self) -> Option<&dyn RequestTracker> {
        self.requests.as_deref()
    }

    pub fn extra_files(&self) -> Option<&dyn ExtraFiles> {
        self.extra_files.as_deref()
    }
}
