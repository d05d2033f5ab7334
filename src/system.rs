//! Host-wide memory facts that bound what a cgroup limit can mean.

use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use crate::error::{ErrorClass, ErrorKind};
use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] fsutil::ReadError),
    #[error("missing resident page count in `{path}`")]
    MissingResident { path: PathBuf },
    #[error("invalid resident page count in `{path}`: `{value}`: {source}")]
    InvalidResident {
        path: PathBuf,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("page size is unavailable")]
    PageSize,
}

impl ErrorClass for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Read(err) => err.kind(),
            Error::PageSize => ErrorKind::Unavailable,
            Error::MissingResident { .. } | Error::InvalidResident { .. } => ErrorKind::Malformed,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Size of a memory page in bytes.
#[cfg(target_os = "linux")]
pub fn page_size() -> Option<u64> {
    use nix::unistd::{SysconfVar, sysconf};

    sysconf(SysconfVar::PAGE_SIZE)
        .ok()
        .flatten()
        .and_then(|size| u64::try_from(size).ok())
}

/// Total physical memory in bytes (page count times page size).
#[cfg(target_os = "linux")]
pub fn physical_memory() -> Option<u64> {
    use nix::unistd::{SysconfVar, sysconf};

    let pages = sysconf(SysconfVar::_PHYS_PAGES)
        .ok()
        .flatten()
        .and_then(|pages| u64::try_from(pages).ok())?;
    Some(pages.saturating_mul(page_size()?))
}

/// Soft limit of the process's virtual address space (`RLIMIT_AS`).
///
/// An infinite limit is reported as `u64::MAX`.
#[cfg(target_os = "linux")]
#[allow(clippy::useless_conversion)]
pub fn address_space_limit() -> Option<u64> {
    use nix::sys::resource::{Resource, getrlimit};

    match getrlimit(Resource::RLIMIT_AS) {
        Ok((soft, _hard)) => Some(u64::try_from(soft).unwrap_or(u64::MAX)),
        Err(errno) => {
            log::debug!("getrlimit(RLIMIT_AS) failed: {errno}");
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn page_size() -> Option<u64> {
    None
}

#[cfg(not(target_os = "linux"))]
pub fn physical_memory() -> Option<u64> {
    None
}

#[cfg(not(target_os = "linux"))]
pub fn address_space_limit() -> Option<u64> {
    None
}

/// Resident set size of the process in bytes, read from a `statm` file.
///
/// # Errors
///
/// - [`Error::Read`] if the file can't be read.
/// - [`Error::MissingResident`] or [`Error::InvalidResident`] if the second
///   field is absent or not an integer.
/// - [`Error::PageSize`] if the page size can't be determined.
pub fn resident_set_size(statm: &Path) -> Result<u64> {
    let line = fsutil::read_first_line(statm)?;
    let pages = parse_resident_pages(statm, &line)?;
    let page_size = page_size().ok_or(Error::PageSize)?;
    Ok(pages.saturating_mul(page_size))
}

/// Extracts the resident page count, the second whitespace-separated field of `statm`.
pub fn parse_resident_pages(path: &Path, line: &str) -> Result<u64> {
    let value = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::MissingResident {
            path: path.to_path_buf(),
        })?;
    value.parse().map_err(|source| Error::InvalidResident {
        path: path.to_path_buf(),
        value: value.to_owned(),
        source,
    })
}
