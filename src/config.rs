use crate::error::Error;
use crate::model::{CleanupType, LibraryType};
use chrono::Duration;
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub application: ApplicationConfig,
    #[serde(default)]
    pub file_system: FileSystemConfig,
    #[serde(default)]
    pub media_deletion: MediaDeletionConfig,
    #[serde(default)]
    pub tag_deletion: TagDeletionConfig,
    #[serde(default)]
    pub episode_deletion: EpisodeDeletionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavingSoonType {
    MoviesAndTv,
    Movies,
    Tv,
    None,
}

impl LeavingSoonType {
    pub fn covers(&self, library_type: LibraryType) -> bool {
        match self {
            LeavingSoonType::MoviesAndTv => true,
            LeavingSoonType::Movies => library_type == LibraryType::Movies,
            LeavingSoonType::Tv => library_type == LibraryType::Tv,
            LeavingSoonType::None => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub dry_run: bool,
    pub leaving_soon_days: i64,
    pub leaving_soon_dir: String,
    /// The same directory as the playback server sees it. Empty means identical.
    pub media_server_leaving_soon_dir: String,
    pub leaving_soon_type: LeavingSoonType,
    pub from_scratch: bool,
    pub exclusion_tags: Vec<String>,
    pub exclude_favorites: bool,
    pub delete_empty_shows: bool,
    /// Files inside a season folder that get linked into the preview.
    pub link_media_patterns: Vec<String>,
    /// Excluded even when they match a media pattern.
    pub link_ignore_patterns: Vec<String>,
    pub schedule_interval_minutes: u64,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            leaving_soon_days: 14,
            leaving_soon_dir: "/data/media/leaving-soon".to_string(),
            media_server_leaving_soon_dir: String::new(),
            leaving_soon_type: LeavingSoonType::MoviesAndTv,
            from_scratch: true,
            exclusion_tags: vec!["keep".to_string()],
            exclude_favorites: false,
            delete_empty_shows: true,
            link_media_patterns: [
                "*.mkv", "*.mp4", "*.avi", "*.m4v", "*.ts", "*.m2ts", "*.mov", "*.wmv", "*.webm",
                "*.mpg", "*.mpeg", "*.flv",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            link_ignore_patterns: vec!["*.nfo".to_string(), "*.jpg".to_string()],
            schedule_interval_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSystemConfig {
    pub access: bool,
    pub validate_seeding: bool,
    pub free_space_check_dir: String,
}

impl Default for FileSystemConfig {
    fn default() -> Self {
        Self {
            access: true,
            validate_seeding: true,
            free_space_check_dir: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpirationTier {
    pub free_percent: f64,
    pub days: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaDeletionConfig {
    pub enabled: bool,
    pub movie_expiration: Vec<ExpirationTier>,
    pub season_expiration: Vec<ExpirationTier>,
}

impl MediaDeletionConfig {
    pub fn tiers(&self, library_type: LibraryType) -> &[ExpirationTier] {
        match library_type {
            LibraryType::Movies => &self.movie_expiration,
            LibraryType::Tv => &self.season_expiration,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagSchedule {
    pub tag: String,
    pub days: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagDeletionConfig {
    pub enabled: bool,
    pub schedules: Vec<TagSchedule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeSchedule {
    pub tag: String,
    pub max_episodes: usize,
    pub max_age_days: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EpisodeDeletionConfig {
    pub enabled: bool,
    pub schedules: Vec<EpisodeSchedule>,
}

impl AppConfig {
    pub fn leaving_soon(&self) -> Duration {
        Duration::days(self.application.leaving_soon_days)
    }

    /// Local directory holding the preview tree for one cleanup/library pair.
    pub fn leaving_soon_dir(&self, cleanup_type: CleanupType, library_type: LibraryType) -> PathBuf {
        PathBuf::from(&self.application.leaving_soon_dir)
            .join(cleanup_type.dir_name())
            .join(library_type.dir_name())
    }

    /// The same directory as the playback server mounts it.
    pub fn media_server_leaving_soon_dir(
        &self,
        cleanup_type: CleanupType,
        library_type: LibraryType,
    ) -> PathBuf {
        let base = if self.application.media_server_leaving_soon_dir.is_empty() {
            &self.application.leaving_soon_dir
        } else {
            &self.application.media_server_leaving_soon_dir
        };
        PathBuf::from(base)
            .join(cleanup_type.dir_name())
            .join(library_type.dir_name())
    }

    pub fn is_excluded_tag(&self, tag: &str) -> bool {
        self.application
            .exclusion_tags
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Reject settings that would make the scheduler guess.
    pub fn validate(&self) -> Result<(), Error> {
        let app = &self.application;
        if app.leaving_soon_days < 0 {
            return Err(Error::InvalidConfig(format!(
                "leaving_soon_days must not be negative, got {}",
                app.leaving_soon_days
            )));
        }
        check_days("leaving_soon_days", app.leaving_soon_days)?;
        if app.leaving_soon_type != LeavingSoonType::None && app.leaving_soon_dir.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "leaving_soon_dir is required unless leaving_soon_type is 'none'".to_string(),
            ));
        }

        let window = app.leaving_soon_days;
        for library_type in LibraryType::ALL {
            for tier in self.media_deletion.tiers(library_type) {
                if !(tier.free_percent > 0.0 && tier.free_percent <= 100.0) {
                    return Err(Error::InvalidConfig(format!(
                        "{} expiration tier threshold {} is not a percentage",
                        library_type, tier.free_percent
                    )));
                }
                check_expiration(&format!("{} tier {}%", library_type, tier.free_percent), tier.days, window)?;
            }

            // less free space must never mean keeping media longer
            let mut tiers: Vec<&ExpirationTier> = self.media_deletion.tiers(library_type).iter().collect();
            tiers.sort_by(|a, b| a.free_percent.total_cmp(&b.free_percent));
            if let Some(pair) = tiers.windows(2).find(|pair| pair[0].days > pair[1].days) {
                return Err(Error::InvalidConfig(format!(
                    "{} tier {}% keeps media longer ({} days) than tier {}% ({} days)",
                    library_type, pair[0].free_percent, pair[0].days, pair[1].free_percent, pair[1].days
                )));
            }
        }

        for schedule in &self.tag_deletion.schedules {
            if schedule.tag.trim().is_empty() {
                return Err(Error::InvalidConfig("tag schedule without a tag".to_string()));
            }
            check_expiration(&format!("tag '{}'", schedule.tag), schedule.days, window)?;
        }

        for schedule in &self.episode_deletion.schedules {
            if schedule.tag.trim().is_empty() {
                return Err(Error::InvalidConfig("episode schedule without a tag".to_string()));
            }
            if schedule.max_age_days <= 0 {
                return Err(Error::InvalidConfig(format!(
                    "episode schedule '{}' needs a positive max_age_days",
                    schedule.tag
                )));
            }
            check_days(&format!("episode schedule '{}'", schedule.tag), schedule.max_age_days)?;
        }

        Ok(())
    }
}

/// Upper bound for any day count, far inside chrono's date range.
pub const MAX_DAYS: i64 = 36_500;

fn check_days(what: &str, days: i64) -> Result<(), Error> {
    if days > MAX_DAYS {
        return Err(Error::InvalidConfig(format!(
            "{} is {} days, more than the supported {} days",
            what, days, MAX_DAYS
        )));
    }
    Ok(())
}

fn check_expiration(what: &str, days: i64, window: i64) -> Result<(), Error> {
    check_days(what, days)?;
    if days < window {
        return Err(Error::InvalidConfig(format!(
            "{} expires after {} days, which is shorter than the leaving soon window of {} days",
            what, days, window
        )));
    }
    Ok(())
}

/// Load `Config.toml` (if present) overlaid with `MEDIA_REAPER__*` variables.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("MEDIA_REAPER").separator("__"))
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(ConfigFile::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_apply_to_empty_file() {
        let config = parse("");
        assert!(config.application.dry_run);
        assert_eq!(config.application.leaving_soon_days, 14);
        assert!(config.file_system.access);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_expiration_tiers() {
        let config = parse(
            r#"
            [media_deletion]
            enabled = true
            movie_expiration = [
                { free_percent = 10, days = 90 },
                { free_percent = 20, days = 120 },
            ]
            "#,
        );
        assert_eq!(config.media_deletion.tiers(LibraryType::Movies).len(), 2);
        assert!(config.media_deletion.tiers(LibraryType::Tv).is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_window_longer_than_expiration_is_rejected() {
        let config = parse(
            r#"
            [application]
            leaving_soon_days = 30

            [tag_deletion]
            enabled = true
            schedules = [{ tag = "demo", days = 7 }]
            "#,
        );
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_tiers_must_shrink_with_free_space() {
        let config = parse(
            r#"
            [media_deletion]
            movie_expiration = [
                { free_percent = 10, days = 120 },
                { free_percent = 20, days = 90 },
            ]
            "#,
        );
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_absurd_day_counts_are_rejected() {
        let config = parse(
            r#"
            [tag_deletion]
            schedules = [{ tag = "demo", days = 100000000 }]
            "#,
        );
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = parse(
            r#"
            [episode_deletion]
            schedules = [{ tag = "daily", max_episodes = 5, max_age_days = 100000000 }]
            "#,
        );
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_default_media_patterns_cover_common_containers() {
        let config = parse("");
        let patterns = &config.application.link_media_patterns;
        assert!(patterns.iter().any(|p| p == "*.mkv"));
        assert!(patterns.iter().any(|p| p == "*.mp4"));
        assert!(!patterns.iter().any(|p| p == "*.txt"));
    }

    #[test]
    fn test_bad_threshold_is_rejected() {
        let config = parse(
            r#"
            [media_deletion]
            season_expiration = [{ free_percent = 140, days = 90 }]
            "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_media_server_dir_falls_back_to_local_dir() {
        let mut config = parse(
            r#"
            [application]
            leaving_soon_dir = "/data/leaving"
            "#,
        );
        assert_eq!(
            config.media_server_leaving_soon_dir(CleanupType::Tag, LibraryType::Tv),
            PathBuf::from("/data/leaving/tag/tv")
        );
        config.application.media_server_leaving_soon_dir = "/mnt/leaving".to_string();
        assert_eq!(
            config.media_server_leaving_soon_dir(CleanupType::Media, LibraryType::Movies),
            PathBuf::from("/mnt/leaving/media/movies")
        );
    }
}
