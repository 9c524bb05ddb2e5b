use crate::error::Error;
use crate::model::LibraryItem;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where an item lives in the library and where its mirror goes in the preview tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStructure {
    pub source_folder: PathBuf,
    pub source_file: PathBuf,
    pub target_folder: PathBuf,
    pub target_file: PathBuf,
}

/// Mirror `item` under `destination_root`.
///
/// The folders between the library root and the item's parent are kept as a
/// relative path, however deep, and re-rooted under the destination. The
/// entry that gets linked is the first thing below the parent (a season
/// folder, or the movie file). When that entry has the same name as the last
/// relative folder, the catalog reported the entry itself as the parent, and
/// the doubled segment is dropped.
pub fn resolve(item: &LibraryItem, destination_root: &Path) -> Result<PathStructure, Error> {
    let root = &item.root_folder_path;
    let mut relative = item
        .parent_path
        .strip_prefix(root)
        .map_err(|_| {
            Error::Path(format!(
                "{} is not inside library root {}",
                item.parent_path.display(),
                root.display()
            ))
        })?
        .to_path_buf();

    let entry = entry_name(item)?;
    if relative.file_name() == Some(entry.as_os_str()) {
        relative.pop();
    }

    let source_folder = join_relative(root, &relative);
    let target_folder = join_relative(destination_root, &relative);

    Ok(PathStructure {
        source_file: source_folder.join(&entry),
        target_file: target_folder.join(&entry),
        source_folder,
        target_folder,
    })
}

fn entry_name(item: &LibraryItem) -> Result<OsString, Error> {
    let below_parent = item
        .library_path
        .strip_prefix(&item.parent_path)
        .ok()
        .and_then(|rest| rest.components().next())
        .map(|c| c.as_os_str().to_os_string());

    match below_parent {
        Some(name) => Ok(name),
        None => item
            .library_path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| {
                Error::Path(format!(
                    "cannot tell which entry of {} to link",
                    item.library_path.display()
                ))
            }),
    }
}

fn join_relative(base: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{movie, season};

    fn with_paths(mut item: LibraryItem, root: &str, parent: &str, library: &str) -> LibraryItem {
        item.root_folder_path = PathBuf::from(root);
        item.parent_path = PathBuf::from(parent);
        item.library_path = PathBuf::from(library);
        item
    }

    #[test]
    fn test_movie_file() {
        let item = with_paths(
            movie(1, "Alien"),
            "/data/movies",
            "/data/movies/Alien (1979)",
            "/data/movies/Alien (1979)/Alien.mkv",
        );
        let s = resolve(&item, Path::new("/leaving/media/movies")).unwrap();
        assert_eq!(s.source_folder, PathBuf::from("/data/movies/Alien (1979)"));
        assert_eq!(s.source_file, PathBuf::from("/data/movies/Alien (1979)/Alien.mkv"));
        assert_eq!(s.target_folder, PathBuf::from("/leaving/media/movies/Alien (1979)"));
        assert_eq!(
            s.target_file,
            PathBuf::from("/leaving/media/movies/Alien (1979)/Alien.mkv")
        );
    }

    #[test]
    fn test_season_links_the_season_folder() {
        let item = with_paths(
            season(2, "Dark", 1),
            "/tv",
            "/tv/Dark",
            "/tv/Dark/Season 01/Dark S01E01.mkv",
        );
        let s = resolve(&item, Path::new("/preview")).unwrap();
        assert_eq!(s.source_file, PathBuf::from("/tv/Dark/Season 01"));
        assert_eq!(s.target_folder, PathBuf::from("/preview/Dark"));
        assert_eq!(s.target_file, PathBuf::from("/preview/Dark/Season 01"));
    }

    #[test]
    fn test_nested_folders_are_kept_in_order() {
        let item = with_paths(
            season(3, "Frieren", 1),
            "/media/tv",
            "/media/tv/anime/2023/Frieren",
            "/media/tv/anime/2023/Frieren/Season 01/ep.mkv",
        );
        let s = resolve(&item, Path::new("/preview")).unwrap();
        assert_eq!(s.source_folder, PathBuf::from("/media/tv/anime/2023/Frieren"));
        assert_eq!(s.target_folder, PathBuf::from("/preview/anime/2023/Frieren"));
        assert_eq!(s.target_file, PathBuf::from("/preview/anime/2023/Frieren/Season 01"));
    }

    #[test]
    fn test_duplicate_folder_name_is_collapsed() {
        let item = with_paths(
            season(4, "Show", 1),
            "/tv",
            "/tv/Show/Season 01",
            "/tv/Show/Season 01",
        );
        let s = resolve(&item, Path::new("/preview")).unwrap();
        assert!(s.source_folder.is_absolute());
        assert_eq!(s.source_folder, PathBuf::from("/tv/Show"));
        assert_eq!(s.source_file, PathBuf::from("/tv/Show/Season 01"));
        assert_eq!(s.target_file, PathBuf::from("/preview/Show/Season 01"));
    }

    #[test]
    fn test_destination_without_common_prefix() {
        let item = with_paths(
            movie(5, "Heat"),
            "/mnt/storage/library/movies",
            "/mnt/storage/library/movies/Heat (1995)",
            "/mnt/storage/library/movies/Heat (1995)/Heat.mkv",
        );
        let s = resolve(&item, Path::new("relative/preview")).unwrap();
        assert_eq!(s.target_file, PathBuf::from("relative/preview/Heat (1995)/Heat.mkv"));
        assert_eq!(
            s.source_file,
            PathBuf::from("/mnt/storage/library/movies/Heat (1995)/Heat.mkv")
        );
    }

    #[test]
    fn test_file_directly_in_root() {
        let item = with_paths(movie(6, "Loose"), "/movies", "/movies", "/movies/Loose.mkv");
        let s = resolve(&item, Path::new("/preview")).unwrap();
        assert_eq!(s.source_folder, PathBuf::from("/movies"));
        assert_eq!(s.target_file, PathBuf::from("/preview/Loose.mkv"));
    }

    #[test]
    fn test_parent_outside_root_is_an_error() {
        let item = with_paths(movie(7, "Lost"), "/movies", "/elsewhere/Lost", "/elsewhere/Lost/a.mkv");
        assert!(matches!(resolve(&item, Path::new("/preview")), Err(Error::Path(_))));
    }
}
