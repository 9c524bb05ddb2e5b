use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The two kinds of library a pass runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    Movies,
    Tv,
}

impl LibraryType {
    pub const ALL: [LibraryType; 2] = [LibraryType::Movies, LibraryType::Tv];

    /// Collection type used when registering a virtual library on the playback server.
    pub fn collection_type(&self) -> &'static str {
        match self {
            LibraryType::Movies => "movies",
            LibraryType::Tv => "tvshows",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LibraryType::Movies => "Movies",
            LibraryType::Tv => "Shows",
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            LibraryType::Movies => "movies",
            LibraryType::Tv => "tv",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for LibraryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movies" | "movie" => Ok(LibraryType::Movies),
            "tv" | "shows" | "series" => Ok(LibraryType::Tv),
            other => Err(format!("unknown library type '{}'", other)),
        }
    }
}

/// Which policy family produced a pass. Each one owns its own leaving-soon tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupType {
    Media,
    Tag,
    Episodes,
}

impl CleanupType {
    pub fn display_name(&self) -> &'static str {
        match self {
            CleanupType::Media => "Media",
            CleanupType::Tag => "Tag",
            CleanupType::Episodes => "Episodes",
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            CleanupType::Media => "media",
            CleanupType::Tag => "tag",
            CleanupType::Episodes => "episodes",
        }
    }
}

impl fmt::Display for CleanupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for CleanupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "media" | "disk" => Ok(CleanupType::Media),
            "tag" | "tags" => Ok(CleanupType::Tag),
            "episodes" | "episode" => Ok(CleanupType::Episodes),
            other => Err(format!("unknown cleanup type '{}'", other)),
        }
    }
}

/// One deletable unit: a movie, or a single season of a series.
///
/// Built fresh from the catalog every pass and mutated in place while the
/// pass runs (tags, extra files, watch history, seeding, playback server ids).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryItem {
    /// Catalog id. For TV this is the series id; `season` tells seasons apart.
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub imported_at: DateTime<Utc>,
    /// Where the download client put the file before it was imported.
    pub original_path: PathBuf,
    pub library_path: PathBuf,
    pub parent_path: PathBuf,
    pub root_folder_path: PathBuf,
    pub file_path: PathBuf,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub tvdb_id: Option<i64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seeding: bool,
    #[serde(default)]
    pub extra_files: Vec<PathBuf>,
    #[serde(default)]
    pub media_server_ids: Vec<String>,
}

impl LibraryItem {
    pub fn is_movie(&self) -> bool {
        self.season.is_none()
    }

    pub fn library_type(&self) -> LibraryType {
        if self.is_movie() {
            LibraryType::Movies
        } else {
            LibraryType::Tv
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// The later of the import date and the last time somebody watched it.
    pub fn reference_date(&self) -> DateTime<Utc> {
        match self.last_seen {
            Some(seen) if seen > self.imported_at => seen,
            _ => self.imported_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.reference_date()
    }
}

impl fmt::Display for LibraryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.title.is_empty() {
            self.library_path.to_string_lossy().into_owned()
        } else {
            self.title.clone()
        };
        match self.season {
            Some(season) => write!(f, "{} S{:02} (#{})", title, season, self.id),
            None => write!(f, "{} (#{})", title, self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Movie,
    Series,
    Season,
}

impl CandidateKind {
    pub fn is_compatible(&self, library_type: LibraryType) -> bool {
        match self {
            CandidateKind::Movie => library_type == LibraryType::Movies,
            CandidateKind::Series | CandidateKind::Season => library_type == LibraryType::Tv,
        }
    }
}

/// A record from a system other than the catalog (playback server item,
/// favorite, request) that may or may not describe a [`LibraryItem`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    #[serde(default)]
    pub kind: Option<CandidateKind>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub tvdb_id: Option<i64>,
    #[serde(default)]
    pub season_index: Option<u32>,
}
