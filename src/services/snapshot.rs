use super::Catalog;
use crate::error::Error;
use crate::model::{LibraryItem, LibraryType};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    movies: Vec<LibraryItem>,
    #[serde(default)]
    tv: Vec<LibraryItem>,
}

/// A read-only catalog backed by a JSON export, for running passes offline.
///
/// ```json
/// { "movies": [ { "id": 1, "imported_at": "2024-01-01T00:00:00Z", ... } ], "tv": [] }
/// ```
pub struct SnapshotCatalog {
    source: PathBuf,
    library_type: LibraryType,
    items: Vec<LibraryItem>,
}

impl SnapshotCatalog {
    pub fn load(path: &Path, library_type: LibraryType) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw, path, library_type)
    }

    pub fn from_json(raw: &str, source: &Path, library_type: LibraryType) -> Result<Self, Error> {
        let file: SnapshotFile = serde_json::from_str(raw)?;
        let items = match library_type {
            LibraryType::Movies => file.movies,
            LibraryType::Tv => file.tv,
        };

        let (items, misplaced): (Vec<_>, Vec<_>) = items
            .into_iter()
            .partition(|item| item.library_type() == library_type);
        for item in &misplaced {
            warn!("Ignoring {} in the {} section of {}", item, library_type, source.display());
        }
        debug!("Loaded {} {} entries from {}", items.len(), library_type, source.display());

        Ok(Self {
            source: source.to_path_buf(),
            library_type,
            items,
        })
    }

    pub fn empty(library_type: LibraryType) -> Self {
        Self {
            source: PathBuf::new(),
            library_type,
            items: Vec::new(),
        }
    }

    fn read_only(&self, action: &str, item: &LibraryItem) -> Error {
        Error::service(
            "snapshot",
            format!(
                "cannot {} {}: {} snapshot {} is read-only",
                action,
                item,
                self.library_type,
                self.source.display()
            ),
        )
    }
}

impl Catalog for SnapshotCatalog {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn entries(&self) -> Result<Vec<LibraryItem>, Error> {
        Ok(self.items.clone())
    }

    fn unmonitor(&self, item: &LibraryItem) -> Result<bool, Error> {
        Err(self.read_only("unmonitor", item))
    }

    fn remove_entry(&self, item: &LibraryItem) -> Result<(), Error> {
        Err(self.read_only("remove", item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "movies": [
            {
                "id": 1,
                "title": "Alien",
                "imported_at": "2024-01-01T00:00:00Z",
                "original_path": "/downloads/Alien",
                "library_path": "/movies/Alien (1979)/Alien.mkv",
                "parent_path": "/movies/Alien (1979)",
                "root_folder_path": "/movies",
                "file_path": "/movies/Alien (1979)/Alien.mkv",
                "tmdb_id": 348,
                "tags": ["keep"]
            },
            {
                "id": 2,
                "imported_at": "2024-01-01T00:00:00Z",
                "original_path": "/downloads/x",
                "library_path": "/tv/X/Season 01/x.mkv",
                "parent_path": "/tv/X",
                "root_folder_path": "/tv",
                "file_path": "/tv/X/Season 01/x.mkv",
                "season": 1
            }
        ]
    }"#;

    #[test]
    fn test_loads_matching_section() {
        let catalog =
            SnapshotCatalog::from_json(SNAPSHOT, Path::new("inventory.json"), LibraryType::Movies)
                .unwrap();
        let entries = catalog.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Alien");
        assert_eq!(entries[0].tmdb_id, Some(348));
        assert!(entries[0].has_tag("keep"));
    }

    #[test]
    fn test_mutations_are_refused() {
        let catalog =
            SnapshotCatalog::from_json(SNAPSHOT, Path::new("inventory.json"), LibraryType::Movies)
                .unwrap();
        let item = catalog.entries().unwrap().remove(0);
        assert!(catalog.remove_entry(&item).is_err());
        assert!(catalog.unmonitor(&item).is_err());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let result = SnapshotCatalog::from_json("{", Path::new("x.json"), LibraryType::Tv);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
