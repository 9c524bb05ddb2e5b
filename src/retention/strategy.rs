use super::gate::{DiskPressureGate, RetentionPolicy};
use crate::config::AppConfig;
use crate::error::Error;
use crate::model::{CleanupType, LibraryItem, LibraryType};
use chrono::Duration;

/// What makes one policy family different from another: whether a pass is
/// needed at all, how long media is kept, and which catalog entries it owns.
pub trait CleanupStrategy {
    fn cleanup_type(&self) -> CleanupType;

    fn need_to_delete(&self, library_type: LibraryType) -> Result<bool, Error>;

    fn determine_duration(&self, library_type: LibraryType) -> Result<Option<Duration>, Error>;

    fn accepts(&self, _item: &LibraryItem) -> bool {
        true
    }

    fn describe(&self) -> String;
}

/// Retention driven by how full the disk is.
pub struct DiskPressureStrategy<'a> {
    gate: DiskPressureGate<'a>,
    movies: RetentionPolicy,
    seasons: RetentionPolicy,
}

impl<'a> DiskPressureStrategy<'a> {
    pub fn new(gate: DiskPressureGate<'a>, movies: RetentionPolicy, seasons: RetentionPolicy) -> Self {
        Self {
            gate,
            movies,
            seasons,
        }
    }

    pub fn from_config(config: &AppConfig, gate: DiskPressureGate<'a>) -> Self {
        Self::new(
            gate,
            RetentionPolicy::from_tiers(&config.media_deletion.movie_expiration),
            RetentionPolicy::from_tiers(&config.media_deletion.season_expiration),
        )
    }

    fn policy(&self, library_type: LibraryType) -> &RetentionPolicy {
        match library_type {
            LibraryType::Movies => &self.movies,
            LibraryType::Tv => &self.seasons,
        }
    }
}

impl CleanupStrategy for DiskPressureStrategy<'_> {
    fn cleanup_type(&self) -> CleanupType {
        CleanupType::Media
    }

    fn need_to_delete(&self, library_type: LibraryType) -> Result<bool, Error> {
        Ok(self.determine_duration(library_type)?.is_some())
    }

    fn determine_duration(&self, library_type: LibraryType) -> Result<Option<Duration>, Error> {
        self.gate.select_duration(self.policy(library_type))
    }

    fn describe(&self) -> String {
        "disk pressure".to_string()
    }
}

/// Retention for everything carrying one tag, regardless of free space.
pub struct TagStrategy {
    tag: String,
    duration: Duration,
}

impl TagStrategy {
    pub fn new(tag: impl Into<String>, duration: Duration) -> Self {
        Self {
            tag: tag.into(),
            duration,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl CleanupStrategy for TagStrategy {
    fn cleanup_type(&self) -> CleanupType {
        CleanupType::Tag
    }

    fn need_to_delete(&self, _library_type: LibraryType) -> Result<bool, Error> {
        Ok(true)
    }

    fn determine_duration(&self, _library_type: LibraryType) -> Result<Option<Duration>, Error> {
        Ok(Some(self.duration))
    }

    fn accepts(&self, item: &LibraryItem) -> bool {
        item.has_tag(&self.tag)
    }

    fn describe(&self) -> String {
        format!("tag '{}'", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::gate::tests::FixedProbe;
    use crate::test_support::movie;

    fn strategy(probe: &FixedProbe, access: bool) -> DiskPressureStrategy<'_> {
        DiskPressureStrategy::new(
            DiskPressureGate::new(access, "/", probe),
            RetentionPolicy::new([(10.0, Duration::days(90)), (20.0, Duration::days(120))]),
            RetentionPolicy::default(),
        )
    }

    #[test]
    fn test_disk_pressure_needs_a_matching_tier() {
        let probe = FixedProbe(25, 100);
        assert!(!strategy(&probe, true).need_to_delete(LibraryType::Movies).unwrap());

        let probe = FixedProbe(15, 100);
        let s = strategy(&probe, true);
        assert!(s.need_to_delete(LibraryType::Movies).unwrap());
        assert_eq!(
            s.determine_duration(LibraryType::Movies).unwrap(),
            Some(Duration::days(120))
        );
        // no season tiers configured
        assert!(!s.need_to_delete(LibraryType::Tv).unwrap());
    }

    #[test]
    fn test_disk_pressure_without_file_system_access() {
        let probe = FixedProbe(99, 100);
        let s = strategy(&probe, false);
        assert!(s.need_to_delete(LibraryType::Movies).unwrap());
        assert_eq!(
            s.determine_duration(LibraryType::Movies).unwrap(),
            Some(Duration::days(120))
        );
    }

    #[test]
    fn test_tag_strategy_filters_by_tag() {
        let s = TagStrategy::new("demo", Duration::days(7));
        assert!(s.need_to_delete(LibraryType::Tv).unwrap());

        let mut item = movie(1, "Tagged");
        assert!(!s.accepts(&item));
        item.tags.insert("Demo".to_string());
        assert!(s.accepts(&item));
    }
}
