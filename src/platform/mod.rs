#[cfg(unix)]
mod unix;
#[cfg(target_os = "windows")]
pub mod windows;

use std::io;
use std::path::Path;

/// Usable and total bytes of the filesystem holding a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub available_bytes: u64,
    pub total_bytes: u64,
}

impl DiskUsage {
    pub fn free_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.available_bytes as f64 / self.total_bytes as f64 * 100.0
    }
}

#[cfg(unix)]
pub fn disk_usage(path: &Path) -> io::Result<DiskUsage> {
    unix::disk_usage(path)
}

#[cfg(target_os = "windows")]
pub fn disk_usage(path: &Path) -> io::Result<DiskUsage> {
    windows::disk_usage(path)
}

#[cfg(not(any(unix, target_os = "windows")))]
pub fn disk_usage(_path: &Path) -> io::Result<DiskUsage> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "disk usage is not available on this platform",
    ))
}

#[cfg(unix)]
pub fn symlink_file(source: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(target_os = "windows")]
pub fn symlink_file(source: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, target)
}

#[cfg(not(any(unix, target_os = "windows")))]
pub fn symlink_file(_source: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not available on this platform",
    ))
}

/// True when something (including a dangling link) already sits at `path`.
pub fn entry_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}
