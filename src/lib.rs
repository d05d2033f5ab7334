//! Creo Limits: discovers the resource limits a Linux control group imposes on
//! the current process.
//!
//! At startup [`ResourceContext::initialize`] detects whether the process runs
//! under cgroup v1 or v2 and locates its memory and CPU controller directories.
//! Afterwards the context answers, at any time and from any thread:
//!
//! - the physical memory limit ([`ResourceContext::try_get_memory_limit_bytes`]),
//! - the memory usage as the OOM killer accounts it
//!   ([`ResourceContext::try_get_memory_usage_bytes`]),
//! - the CPU quota as a whole CPU count ([`ResourceContext::try_get_cpu_limit_count`]).
//!
//! Discovery is best effort. Whatever cannot be determined is reported as
//! `None` and the resource is treated as unconstrained.
pub mod cgroup;
pub mod config;
pub mod context;
pub mod error;
pub mod fsutil;
pub mod mountinfo;
pub mod system;

pub use cgroup::CgroupVersion;
pub use config::Config;
pub use context::{ResourceContext, ResourceLimits};
