use crate::model::LibraryItem;
use chrono::Utc;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub(crate) fn movie(id: i64, title: &str) -> LibraryItem {
    let folder = PathBuf::from("/movies").join(title);
    let file = folder.join(format!("{}.mkv", title));
    LibraryItem {
        id,
        title: title.to_string(),
        imported_at: Utc::now(),
        original_path: PathBuf::from("/downloads").join(title),
        library_path: file.clone(),
        parent_path: folder,
        root_folder_path: PathBuf::from("/movies"),
        file_path: file,
        season: None,
        imdb_id: None,
        tmdb_id: None,
        tvdb_id: None,
        tags: BTreeSet::new(),
        size_bytes: 0,
        last_seen: None,
        seeding: false,
        extra_files: vec![],
        media_server_ids: vec![],
    }
}

pub(crate) fn season(id: i64, title: &str, season: u32) -> LibraryItem {
    let show = PathBuf::from("/tv").join(title);
    let season_dir = show.join(format!("Season {:02}", season));
    let file = season_dir.join(format!("{} S{:02}E01.mkv", title, season));
    LibraryItem {
        season: Some(season),
        original_path: PathBuf::from("/downloads").join(format!("{} S{:02}", title, season)),
        library_path: file.clone(),
        parent_path: show,
        root_folder_path: PathBuf::from("/tv"),
        file_path: file,
        ..movie(id, title)
    }
}
