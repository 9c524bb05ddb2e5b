use crate::config::{AppConfig, ExpirationTier};
use crate::error::Error;
use crate::platform::{self, DiskUsage};
use chrono::Duration;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of filesystem statistics. Swapped out in tests.
pub trait DiskProbe {
    fn usage(&self, path: &Path) -> io::Result<DiskUsage>;
}

pub struct SystemDiskProbe;

impl DiskProbe for SystemDiskProbe {
    fn usage(&self, path: &Path) -> io::Result<DiskUsage> {
        platform::disk_usage(path)
    }
}

/// Free-space thresholds (percent) mapped to how long media is kept.
#[derive(Debug, Clone, Default)]
pub struct RetentionPolicy {
    // sorted by threshold, ascending
    tiers: Vec<(f64, Duration)>,
}

impl RetentionPolicy {
    pub fn new(tiers: impl IntoIterator<Item = (f64, Duration)>) -> Self {
        let mut tiers: Vec<(f64, Duration)> = tiers.into_iter().collect();
        tiers.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { tiers }
    }

    pub fn from_tiers(tiers: &[ExpirationTier]) -> Self {
        Self::new(
            tiers
                .iter()
                .map(|tier| (tier.free_percent, Duration::days(tier.days))),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The tier with the smallest threshold that is still above `free_percent`.
    pub fn for_free_percent(&self, free_percent: f64) -> Option<Duration> {
        self.tiers
            .iter()
            .find(|(threshold, _)| *threshold > free_percent)
            .map(|(_, duration)| *duration)
    }

    /// Used when free space can't be measured: keep things as long as any tier would.
    pub fn most_conservative(&self) -> Option<Duration> {
        self.tiers.iter().map(|(_, duration)| *duration).max()
    }
}

pub struct DiskPressureGate<'a> {
    file_system_access: bool,
    probe_dir: PathBuf,
    probe: &'a dyn DiskProbe,
}

impl<'a> DiskPressureGate<'a> {
    pub fn new(file_system_access: bool, probe_dir: impl Into<PathBuf>, probe: &'a dyn DiskProbe) -> Self {
        Self {
            file_system_access,
            probe_dir: probe_dir.into(),
            probe,
        }
    }

    pub fn from_config(config: &AppConfig, probe: &'a dyn DiskProbe) -> Self {
        Self::new(
            config.file_system.access,
            &config.file_system.free_space_check_dir,
            probe,
        )
    }

    pub fn file_system_access(&self) -> bool {
        self.file_system_access
    }

    pub fn free_percent(&self) -> Result<f64, Error> {
        let usage = self.probe.usage(&self.probe_dir).map_err(|e| {
            Error::DiskProbe(format!("{}: {}", self.probe_dir.display(), e))
        })?;
        if usage.total_bytes == 0 {
            return Err(Error::DiskProbe(format!(
                "{} reports a total size of 0 bytes",
                self.probe_dir.display()
            )));
        }
        Ok(usage.free_percent())
    }

    pub fn select_duration(&self, policy: &RetentionPolicy) -> Result<Option<Duration>, Error> {
        if !self.file_system_access {
            return Ok(policy.most_conservative());
        }

        let free_percent = self.free_percent()?;
        let duration = policy.for_free_percent(free_percent);
        debug!(
            "Free space at {} is {:.2}%, selected expiration: {:?}",
            self.probe_dir.display(),
            free_percent,
            duration.map(|d| d.num_days())
        );
        Ok(duration)
    }
}
