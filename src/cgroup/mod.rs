//! cgroup discovery for the current process.
//!
//! Detects which cgroup schema is in effect, locates the memory and CPU
//! controller directories of the current process, and reads the limits
//! configured on them.
//!
//! # Key Components
//!
//! - [`detect_version`]: picks [`CgroupVersion::V1`] or [`CgroupVersion::V2`]
//!   from the filesystem type of `/sys/fs/cgroup`.
//! - [`membership`]: parses `/proc/self/cgroup`.
//! - [`resolve_controller_path`]: joins the hierarchy mount (from
//!   [`crate::mountinfo`]) with the membership path, handling the overlap seen
//!   inside containers.
//! - [`limits`]: version-specific readers for the memory limit, memory usage
//!   and CPU limit.
mod controller;
mod error;
pub mod limits;
pub mod membership;
mod path;
mod version;

pub use controller::{Controller, hierarchy_label};
pub use error::{Error, Result};
pub use path::{join_controller_path, resolve_controller_path};
pub use version::{CgroupVersion, detect_version};
