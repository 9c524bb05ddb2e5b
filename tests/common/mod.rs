#![allow(dead_code)]

use chrono::{Duration, Utc};
use media_reaper::config::LeavingSoonType;
use media_reaper::error::Error;
use media_reaper::model::CandidateRecord;
use media_reaper::services::{
    Catalog, EpisodeRecord, MediaServer, RequestTracker, SeasonState, VirtualLibrary,
};
use media_reaper::{AppConfig, LibraryItem, LibraryType};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Every call a fake receives, in order, e.g. `"remove 3"`.
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn calls_starting_with(log: &CallLog, prefix: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|call| call.starts_with(prefix))
        .cloned()
        .collect()
}

pub struct FakeCatalog {
    pub items: Vec<LibraryItem>,
    pub seasons: HashMap<i64, Vec<SeasonState>>,
    pub episodes: HashMap<i64, Vec<EpisodeRecord>>,
    pub fail_remove: HashSet<i64>,
    pub fail_entries: bool,
    pub fail_unmonitor_episodes: bool,
    pub log: CallLog,
}

impl FakeCatalog {
    pub fn new(items: Vec<LibraryItem>, log: &CallLog) -> Self {
        Self {
            items,
            seasons: HashMap::new(),
            episodes: HashMap::new(),
            fail_remove: HashSet::new(),
            fail_entries: false,
            fail_unmonitor_episodes: false,
            log: Rc::clone(log),
        }
    }
}

impl Catalog for FakeCatalog {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn entries(&self) -> Result<Vec<LibraryItem>, Error> {
        self.log.borrow_mut().push("entries".to_string());
        if self.fail_entries {
            return Err(Error::service("fake", "catalog unreachable"));
        }
        Ok(self.items.clone())
    }

    fn unmonitor(&self, item: &LibraryItem) -> Result<bool, Error> {
        self.log.borrow_mut().push(format!("unmonitor {}", item.id));
        Ok(true)
    }

    fn remove_entry(&self, item: &LibraryItem) -> Result<(), Error> {
        if self.fail_remove.contains(&item.id) {
            return Err(Error::service("fake", format!("{} is locked", item.id)));
        }
        self.log.borrow_mut().push(format!("remove {}", item.id));
        Ok(())
    }

    fn series_seasons(&self, series_id: i64) -> Result<Vec<SeasonState>, Error> {
        Ok(self.seasons.get(&series_id).cloned().unwrap_or_default())
    }

    fn delete_series(&self, series_id: i64) -> Result<(), Error> {
        self.log.borrow_mut().push(format!("delete_series {}", series_id));
        Ok(())
    }

    fn episodes(&self, series_id: i64) -> Result<Vec<EpisodeRecord>, Error> {
        Ok(self.episodes.get(&series_id).cloned().unwrap_or_default())
    }

    fn delete_episode_file(&self, file_id: i64) -> Result<(), Error> {
        self.log.borrow_mut().push(format!("delete_episode_file {}", file_id));
        Ok(())
    }

    fn unmonitor_episodes(&self, episode_ids: &[i64]) -> Result<(), Error> {
        self.log
            .borrow_mut()
            .push(format!("unmonitor_episodes {:?}", episode_ids));
        if self.fail_unmonitor_episodes {
            return Err(Error::service("fake", "episode monitor update rejected"));
        }
        Ok(())
    }
}

pub struct FakeMediaServer {
    pub libraries: RefCell<Vec<VirtualLibrary>>,
    pub items: Vec<CandidateRecord>,
    pub favorites: Vec<CandidateRecord>,
    pub log: CallLog,
}

impl FakeMediaServer {
    pub fn new(log: &CallLog) -> Self {
        Self {
            libraries: RefCell::new(Vec::new()),
            items: Vec::new(),
            favorites: Vec::new(),
            log: Rc::clone(log),
        }
    }
}

impl MediaServer for FakeMediaServer {
    fn libraries(&self) -> Result<Vec<VirtualLibrary>, Error> {
        self.log.borrow_mut().push("libraries".to_string());
        Ok(self.libraries.borrow().clone())
    }

    fn create_library(
        &self,
        name: &str,
        collection_type: &str,
        paths: &[String],
    ) -> Result<VirtualLibrary, Error> {
        self.log.borrow_mut().push(format!("create_library {}", name));
        let library = VirtualLibrary {
            id: format!("lib-{}", self.libraries.borrow().len() + 1),
            name: name.to_string(),
            collection_type: collection_type.to_string(),
            paths: paths.to_vec(),
        };
        self.libraries.borrow_mut().push(library.clone());
        Ok(library)
    }

    fn add_path(&self, library: &VirtualLibrary, path: &str) -> Result<(), Error> {
        self.log
            .borrow_mut()
            .push(format!("add_path {} {}", library.name, path));
        if let Some(existing) = self
            .libraries
            .borrow_mut()
            .iter_mut()
            .find(|l| l.id == library.id)
        {
            existing.paths.push(path.to_string());
        }
        Ok(())
    }

    fn items(&self, _library_type: LibraryType) -> Result<Vec<CandidateRecord>, Error> {
        self.log.borrow_mut().push("items".to_string());
        Ok(self.items.clone())
    }

    fn delete_item(&self, id: &str) -> Result<(), Error> {
        self.log.borrow_mut().push(format!("delete_item {}", id));
        Ok(())
    }

    fn favorites(&self) -> Result<Vec<CandidateRecord>, Error> {
        self.log.borrow_mut().push("favorites".to_string());
        Ok(self.favorites.clone())
    }
}

pub struct FakeRequests {
    pub requests: Vec<CandidateRecord>,
    pub log: CallLog,
}

impl RequestTracker for FakeRequests {
    fn requests(&self, _library_type: LibraryType) -> Result<Vec<CandidateRecord>, Error> {
        Ok(self.requests.clone())
    }

    fn delete_request(&self, id: &str) -> Result<(), Error> {
        self.log.borrow_mut().push(format!("delete_request {}", id));
        Ok(())
    }
}

/// A live (not dry run) configuration previewing into `leaving_dir`.
pub fn live_config(leaving_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.application.dry_run = false;
    config.application.leaving_soon_type = LeavingSoonType::MoviesAndTv;
    config.application.leaving_soon_dir = leaving_dir.to_string_lossy().into_owned();
    config
}

fn item(id: i64, title: &str, days_old: i64, root_folder: &Path, parent: &Path, file: &Path) -> LibraryItem {
    LibraryItem {
        id,
        title: title.to_string(),
        imported_at: Utc::now() - Duration::days(days_old),
        original_path: root_folder.join("downloads").join(title),
        library_path: file.to_path_buf(),
        parent_path: parent.to_path_buf(),
        root_folder_path: root_folder.to_path_buf(),
        file_path: file.to_path_buf(),
        season: None,
        imdb_id: None,
        tmdb_id: None,
        tvdb_id: None,
        tags: BTreeSet::new(),
        size_bytes: 1_000,
        last_seen: None,
        seeding: false,
        extra_files: vec![],
        media_server_ids: vec![],
    }
}

/// A movie with its file on disk under `root/movies/<title>/`.
pub fn movie_on_disk(root: &Path, id: i64, title: &str, days_old: i64) -> LibraryItem {
    let library_root = root.join("movies");
    let folder = library_root.join(title);
    let file = folder.join(format!("{}.mkv", title));
    fs::create_dir_all(&folder).unwrap();
    fs::write(&file, b"movie").unwrap();
    item(id, title, days_old, &library_root, &folder, &file)
}

/// One season with two episodes and an .nfo under `root/tv/<title>/Season NN/`.
pub fn season_on_disk(root: &Path, id: i64, title: &str, season: u32, days_old: i64) -> LibraryItem {
    let library_root = root.join("tv");
    let show = library_root.join(title);
    let season_dir = show.join(format!("Season {:02}", season));
    fs::create_dir_all(&season_dir).unwrap();
    for episode in 1..=2 {
        fs::write(
            season_dir.join(format!("{} S{:02}E{:02}.mkv", title, season, episode)),
            b"episode",
        )
        .unwrap();
    }
    fs::write(season_dir.join("season.nfo"), b"<season/>").unwrap();
    let file = season_dir.join(format!("{} S{:02}E01.mkv", title, season));

    LibraryItem {
        season: Some(season),
        ..item(id, title, days_old, &library_root, &show, &file)
    }
}

pub fn tagged(mut item: LibraryItem, tag: &str) -> LibraryItem {
    item.tags.insert(tag.to_string());
    item
}
