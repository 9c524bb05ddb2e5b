extern crate winapi;

use super::DiskUsage;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr;
use winapi::um::fileapi::GetDiskFreeSpaceExW;
use winapi::um::winnt::ULARGE_INTEGER;

pub fn disk_usage(path: &Path) -> io::Result<DiskUsage> {
    let path_wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    unsafe {
        let mut available: ULARGE_INTEGER = std::mem::zeroed();
        let mut total: ULARGE_INTEGER = std::mem::zeroed();

        if GetDiskFreeSpaceExW(path_wide.as_ptr(), &mut available, &mut total, ptr::null_mut()) == 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(DiskUsage {
            available_bytes: *available.QuadPart(),
            total_bytes: *total.QuadPart(),
        })
    }
}
