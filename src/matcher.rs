use crate::model::{CandidateRecord, LibraryItem, LibraryType};
use regex::Regex;

lazy_static::lazy_static! {
    // "<word> <number>": Season 5, Sezon 05, Staffel 3, Saison 12 ...
    static ref SEASON_NAME: Regex = Regex::new(r"^\s*\p{L}+\s+(\d+)\s*$")
        .expect("season name pattern is valid");
}

/// Extract the season number from a name such as "Season 02".
pub fn season_from_name(name: &str) -> Option<u32> {
    SEASON_NAME
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Decide whether `candidate`, a record from some other system, describes `item`.
///
/// A candidate that declares a kind must agree with `library_type`. IMDB ids
/// are compared first; TMDB and TVDB ids only count once the kind has been
/// confirmed, since both number movies and series independently. For TV with
/// `match_season`, the season must also agree, taken from the candidate's
/// name or its explicit index.
pub fn matches(
    item: &LibraryItem,
    candidate: &CandidateRecord,
    library_type: LibraryType,
    match_season: bool,
) -> bool {
    let kind_confirmed = match candidate.kind {
        Some(kind) if !kind.is_compatible(library_type) => return false,
        Some(_) => true,
        None => false,
    };

    let imdb = matches!(
        (&item.imdb_id, &candidate.imdb_id),
        (Some(a), Some(b)) if !a.is_empty() && a == b
    );
    let tmdb = kind_confirmed && same_id(item.tmdb_id, candidate.tmdb_id);
    let tvdb = kind_confirmed && same_id(item.tvdb_id, candidate.tvdb_id);

    if !(imdb || tmdb || tvdb) {
        return false;
    }

    if match_season && library_type == LibraryType::Tv {
        return season_matches(item, candidate);
    }

    true
}

fn same_id(a: Option<i64>, b: Option<i64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn season_matches(item: &LibraryItem, candidate: &CandidateRecord) -> bool {
    let Some(season) = item.season else {
        return false;
    };
    let by_name = season_from_name(&candidate.name) == Some(season);
    let by_index = candidate.season_index == Some(season);
    by_name || by_index
}
