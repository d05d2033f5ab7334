//! Locations of the pseudo-files consulted during limit discovery.

use std::path::{Path, PathBuf};

/// Environment variable that points at an alternative root filesystem.
pub const ROOTFS_ENV: &str = "ROOTFS_MOUNT_PATH";

const MOUNTINFO: &str = "proc/self/mountinfo";
const CGROUP_MEMBERSHIP: &str = "proc/self/cgroup";
const STATM: &str = "proc/self/statm";
const CGROUP_ROOT: &str = "sys/fs/cgroup";

/// Where [`ResourceContext`](crate::ResourceContext) looks for `/proc` and `/sys`.
///
/// Every absolute path the kernel reports (mount points, controller directories)
/// is re-rooted under [`Config::rootfs`] before it is opened. With the default
/// rootfs of `/` this is the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    rootfs: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rootfs: PathBuf::from("/"),
        }
    }
}

impl Config {
    pub fn new(rootfs: impl Into<PathBuf>) -> Self {
        Self {
            rootfs: rootfs.into(),
        }
    }

    /// Builds a config from [`ROOTFS_ENV`], falling back to `/` when unset.
    pub fn from_env() -> Self {
        let config = std::env::var_os(ROOTFS_ENV)
            .map(Self::new)
            .unwrap_or_default();
        log::debug!("Using rootfs: {}", config.rootfs.display());
        config
    }

    pub fn rootfs(&self) -> &Path {
        &self.rootfs
    }

    /// Path of the process's mount-information table.
    pub fn mountinfo_path(&self) -> PathBuf {
        self.rootfs.join(MOUNTINFO)
    }

    /// Path of the process's cgroup-membership table.
    pub fn cgroup_membership_path(&self) -> PathBuf {
        self.rootfs.join(CGROUP_MEMBERSHIP)
    }

    /// Path of the process's memory-status table, used for the RSS fallback.
    pub fn statm_path(&self) -> PathBuf {
        self.rootfs.join(STATM)
    }

    /// Canonical cgroup mount root whose filesystem type selects the cgroup version.
    pub fn cgroup_root(&self) -> PathBuf {
        self.rootfs.join(CGROUP_ROOT)
    }

    /// Re-roots an absolute path from the process's view under [`Config::rootfs`].
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        self.rootfs.join(path.strip_prefix("/").unwrap_or(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(
            config.mountinfo_path(),
            PathBuf::from("/proc/self/mountinfo")
        );
        assert_eq!(
            config.cgroup_membership_path(),
            PathBuf::from("/proc/self/cgroup")
        );
        assert_eq!(config.statm_path(), PathBuf::from("/proc/self/statm"));
        assert_eq!(config.cgroup_root(), PathBuf::from("/sys/fs/cgroup"));
    }

    #[test]
    fn test_resolve_is_identity_for_default_rootfs() {
        let config = Config::default();
        assert_eq!(
            config.resolve("/sys/fs/cgroup/memory/my_named_cgroup"),
            PathBuf::from("/sys/fs/cgroup/memory/my_named_cgroup")
        );
    }

    #[test]
    fn test_resolve_under_custom_rootfs() {
        let config = Config::new("/rootfs");
        assert_eq!(
            config.resolve("/sys/fs/cgroup/cpu"),
            PathBuf::from("/rootfs/sys/fs/cgroup/cpu")
        );
        assert_eq!(
            config.mountinfo_path(),
            PathBuf::from("/rootfs/proc/self/mountinfo")
        );
    }
}
