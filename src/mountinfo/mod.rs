//! Scanning of `/proc/self/mountinfo` for cgroup hierarchy mounts.
mod error;
mod parser;
mod scan;

pub use error::{Error, Result};
pub use parser::{MountField, MountRecord, ParseError, parse_mount_record};
pub use scan::{HierarchyMount, find_hierarchy_mount, find_hierarchy_mount_from_reader};
