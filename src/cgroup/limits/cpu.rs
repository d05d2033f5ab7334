//! CPU bandwidth limits.
//!
//! - v1 splits the limit into `cpu.cfs_quota_us` and `cpu.cfs_period_us`, each
//!   holding a single integer. A quota of `-1` means unlimited.
//! - v2 keeps both in `cpu.max` as `<quota> <period>`, where the quota may be
//!   the literal `max`.
//!
//! Quota and period are in microseconds.

use std::path::Path;

use super::{Error, Result, parse_value};
use crate::cgroup::CgroupVersion;
use crate::fsutil;

const V1_QUOTA_FILE: &str = "cpu.cfs_quota_us";
const V1_PERIOD_FILE: &str = "cpu.cfs_period_us";
const V2_MAX_FILE: &str = "cpu.max";

/// Added before truncation so that any fractional CPU rounds up.
const ROUND_UP: f64 = 0.999_999_999;

/// A finite CPU bandwidth allotment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuMax {
    /// Runtime allowed per period, in microseconds.
    pub quota: u64,
    /// Length of the enforcement period, in microseconds.
    pub period: u64,
}

impl CpuMax {
    pub fn cpu_count(&self) -> u32 {
        compute_cpu_limit(self.quota, self.period)
    }
}

/// Converts a quota/period pair into a whole number of CPUs.
///
/// Never reports less than one CPU, and rounds fractional allotments up:
/// 2.5 CPUs worth of quota yields 3. Saturates at `u32::MAX`.
pub fn compute_cpu_limit(quota: u64, period: u64) -> u32 {
    if quota <= period {
        return 1;
    }

    let cpu_count = quota as f64 / period as f64 + ROUND_UP;
    if cpu_count < f64::from(u32::MAX) {
        cpu_count as u32
    } else {
        u32::MAX
    }
}

/// Reads the CPU limit of the controller directory `dir` as a CPU count.
///
/// # Errors
///
/// - [`Error::Unsupported`] for [`CgroupVersion::None`].
/// - [`Error::Read`] if a limit file can't be read.
/// - [`Error::Unlimited`] if no quota is configured.
/// - [`Error::InvalidValue`], [`Error::NonPositive`] or [`Error::MissingField`]
///   if the files are malformed.
pub fn read_cpu_limit(dir: &Path, version: CgroupVersion) -> Result<u32> {
    let limit = match version {
        CgroupVersion::V1 => read_cfs_limit(dir)?,
        CgroupVersion::V2 => {
            let path = dir.join(V2_MAX_FILE);
            log::trace!("Reading CPU limit from `{}`", path.display());
            let line = fsutil::read_first_line(&path)?;
            parse_cpu_max(&path, &line)?
        }
        CgroupVersion::None => return Err(Error::Unsupported),
    };

    Ok(limit.cpu_count())
}

fn read_cfs_limit(dir: &Path) -> Result<CpuMax> {
    // The period is only consulted once a quota is known to be set.
    let quota = read_cfs_value(&dir.join(V1_QUOTA_FILE))?;
    let period = read_cfs_value(&dir.join(V1_PERIOD_FILE))?;
    Ok(CpuMax { quota, period })
}

fn read_cfs_value(path: &Path) -> Result<u64> {
    log::trace!("Reading CFS value from `{}`", path.display());
    let line = fsutil::read_first_line(path)?;
    match parse_value::<i64>(path, line.trim())? {
        -1 => Err(Error::Unlimited {
            path: path.to_path_buf(),
        }),
        value => positive(path, value),
    }
}

/// Parses the `<quota> <period>` line of `cpu.max`.
///
/// # Errors
///
/// - [`Error::MissingField`] if either token is absent.
/// - [`Error::Unlimited`] if the quota is `max`.
/// - [`Error::InvalidValue`] or [`Error::NonPositive`] for bad numbers.
pub fn parse_cpu_max(path: &Path, line: &str) -> Result<CpuMax> {
    let mut tokens = line.split_whitespace();
    let missing = |field| Error::MissingField {
        path: path.to_path_buf(),
        field,
    };
    let quota = tokens.next().ok_or_else(|| missing("quota"))?;
    let period = tokens.next().ok_or_else(|| missing("period"))?;

    if quota == "max" {
        return Err(Error::Unlimited {
            path: path.to_path_buf(),
        });
    }

    let quota = positive(path, parse_value(path, quota)?)?;
    let period = positive(path, parse_value(path, period)?)?;
    Ok(CpuMax { quota, period })
}

fn positive(path: &Path, value: i64) -> Result<u64> {
    u64::try_from(value)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| Error::NonPositive {
            path: path.to_path_buf(),
            value,
        })
}
