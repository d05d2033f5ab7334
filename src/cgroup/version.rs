use std::path::Path;

use super::Controller;

/// `statfs(2)` magic of a tmpfs, the parent of individually mounted v1 hierarchies.
const TMPFS_MAGIC: i64 = 0x0102_1994;
/// `statfs(2)` magic of the unified cgroup filesystem.
const CGROUP2_SUPER_MAGIC: i64 = 0x6367_7270;

/// Which cgroup schema governs the process.
///
/// "Legacy" and "hybrid" setups are both [`CgroupVersion::V1`]: in either case
/// resources are managed by v1 controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CgroupVersion {
    /// No cgroup support was detected.
    #[default]
    None,
    /// One hierarchy per controller (or per group of controllers).
    V1,
    /// A single unified hierarchy.
    V2,
}

impl CgroupVersion {
    /// Maps the filesystem magic of the cgroup mount root to a version.
    pub fn from_fs_magic(magic: i64) -> Self {
        match magic {
            TMPFS_MAGIC => CgroupVersion::V1,
            CGROUP2_SUPER_MAGIC => CgroupVersion::V2,
            _ => CgroupVersion::None,
        }
    }

    pub fn is_available(self) -> bool {
        !matches!(self, CgroupVersion::None)
    }

    /// The hierarchy filter used when scanning mount and membership tables.
    ///
    /// v1 hierarchies are selected by controller name; v2 has exactly one
    /// hierarchy, so every controller maps to `None`.
    pub fn hierarchy_filter(self, controller: Controller) -> Option<Controller> {
        match self {
            CgroupVersion::V1 => Some(controller),
            CgroupVersion::V2 | CgroupVersion::None => None,
        }
    }
}

impl std::fmt::Display for CgroupVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CgroupVersion::None => "none",
            CgroupVersion::V1 => "v1",
            CgroupVersion::V2 => "v2",
        };
        f.write_str(name)
    }
}

/// Detects the cgroup version from the filesystem type of `cgroup_root`
/// (normally `/sys/fs/cgroup`).
///
/// Any failure, including a platform without `statfs(2)`, yields
/// [`CgroupVersion::None`].
#[cfg(target_os = "linux")]
pub fn detect_version(cgroup_root: impl AsRef<Path>) -> CgroupVersion {
    let cgroup_root = cgroup_root.as_ref();
    match nix::sys::statfs::statfs(cgroup_root) {
        Ok(stat) => {
            #[allow(clippy::unnecessary_cast)]
            let magic = stat.filesystem_type().0 as i64;
            let version = CgroupVersion::from_fs_magic(magic);
            if version.is_available() {
                log::debug!("Detected cgroup {version} at `{}`", cgroup_root.display());
            } else {
                log::debug!(
                    "Unexpected file system type {magic:#x} for `{}`",
                    cgroup_root.display()
                );
            }
            version
        }
        Err(errno) => {
            log::debug!("statfs of `{}` failed: {errno}", cgroup_root.display());
            CgroupVersion::None
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn detect_version(cgroup_root: impl AsRef<Path>) -> CgroupVersion {
    log::debug!(
        "cgroup detection is unsupported on this platform; ignoring `{}`",
        cgroup_root.as_ref().display()
    );
    CgroupVersion::None
}
