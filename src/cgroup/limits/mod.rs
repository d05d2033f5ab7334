//! Readers for the memory and CPU limits configured on a controller directory.
//!
//! Every call opens and parses the files afresh; nothing is cached.
//!
//! | Query        | v1                                       | v2            |
//! |--------------|------------------------------------------|---------------|
//! | memory limit | `memory.limit_in_bytes`                  | `memory.max`  |
//! | memory usage | `memory.stat`                            | `memory.stat` |
//! | CPU limit    | `cpu.cfs_quota_us` + `cpu.cfs_period_us` | `cpu.max`     |

mod cpu;
mod error;
mod memory;

pub use cpu::{CpuMax, compute_cpu_limit, parse_cpu_max, read_cpu_limit};
pub use error::{Error, Result};
pub use memory::{
    UNBOUNDED_MEMORY_SENTINEL, UsageKeys, parse_memory_limit, read_memory_limit,
    read_memory_usage, restrict_memory_limit, sum_memory_usage_from_reader,
};

use std::path::Path;
use std::str::FromStr;

/// Parses `value` read from `path` as a base-10 integer.
fn parse_value<T>(path: &Path, value: &str) -> Result<T>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    value.parse::<T>().map_err(|source| Error::InvalidValue {
        path: path.to_path_buf(),
        value: value.to_owned(),
        source,
    })
}
