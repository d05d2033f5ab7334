use std::path::{Path, PathBuf};

use crate::cgroup::limits::{self, UsageKeys};
use crate::cgroup::{self, CgroupVersion, Controller};
use crate::config::Config;
use crate::error::ResultOkLogExt;
use crate::system;

/// Resource limits of the current process at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResourceLimits {
    pub cgroup_version: CgroupVersion,
    /// Memory limit after host-side clamping, `None` if unconstrained.
    pub memory_limit_bytes: Option<u64>,
    /// Non-reclaimable memory in use, or the resident set size as a fallback.
    pub memory_usage_bytes: Option<u64>,
    /// CPU quota rounded up to whole CPUs, `None` if unconstrained.
    pub cpu_limit: Option<u32>,
}

/// Process-wide cgroup state, discovered once and immutable afterwards.
///
/// Created by [`ResourceContext::initialize`] during startup, before worker
/// threads exist. Every query afterwards reads the limit files afresh and takes
/// `&self`, so the context can be shared across threads without locking.
///
/// Every query returns `None` when the answer is unknown: no cgroup support, no
/// controller for that resource, or unparsable contents. Failures are logged
/// and never propagate.
///
/// # Example
///
/// ```no_run
/// use creo_limits::{Config, ResourceContext};
///
/// let context = ResourceContext::initialize(Config::default());
/// if let Some(cpus) = context.try_get_cpu_limit_count() {
///     println!("limited to {cpus} CPUs");
/// }
/// context.cleanup();
/// ```
#[derive(Debug)]
pub struct ResourceContext {
    config: Config,
    version: CgroupVersion,
    memory_controller_path: Option<PathBuf>,
    cpu_controller_path: Option<PathBuf>,
    usage_keys: UsageKeys,
}

impl ResourceContext {
    /// Detects the cgroup version and resolves both controller directories.
    pub fn initialize(config: Config) -> Self {
        let version = cgroup::detect_version(config.cgroup_root());
        Self::initialize_with_version(config, version)
    }

    /// Like [`ResourceContext::initialize`], but with an already known version.
    pub fn initialize_with_version(config: Config, version: CgroupVersion) -> Self {
        let usage_keys = UsageKeys::for_version(version);
        let memory_controller_path = resolve(&config, version, Controller::Memory);
        let cpu_controller_path = resolve(&config, version, Controller::Cpu);

        log::debug!(
            "Initialized resource context: version={version}, memory={:?}, cpu={:?}",
            memory_controller_path,
            cpu_controller_path
        );

        Self {
            config,
            version,
            memory_controller_path,
            cpu_controller_path,
            usage_keys,
        }
    }

    /// Releases the context. No query can run afterwards.
    pub fn cleanup(self) {
        log::debug!("Releasing resource context");
    }

    pub fn version(&self) -> CgroupVersion {
        self.version
    }

    pub fn memory_controller_path(&self) -> Option<&Path> {
        self.memory_controller_path.as_deref()
    }

    pub fn cpu_controller_path(&self) -> Option<&Path> {
        self.cpu_controller_path.as_deref()
    }

    /// Raw memory limit as reported by the kernel, without any clamping.
    pub fn physical_memory_limit(&self) -> Option<u64> {
        if !self.version.is_available() {
            return None;
        }
        let dir = self.memory_controller_path.as_deref()?;
        limits::read_memory_limit(dir, self.version).ok_log()
    }

    /// Non-reclaimable memory charged to the cgroup, as the OOM killer counts it.
    pub fn physical_memory_usage(&self) -> Option<u64> {
        if !self.version.is_available() {
            return None;
        }
        let dir = self.memory_controller_path.as_deref()?;
        limits::read_memory_usage(dir, self.usage_keys).ok_log()
    }

    /// CPU quota of the cgroup as a whole number of CPUs.
    pub fn cpu_limit(&self) -> Option<u32> {
        if !self.version.is_available() {
            return None;
        }
        let dir = self.cpu_controller_path.as_deref()?;
        limits::read_cpu_limit(dir, self.version).ok_log()
    }

    /// The memory limit clamped to the address-space limit and physical memory.
    ///
    /// Returns `None` if the cgroup reports the "unbounded" sentinel.
    pub fn restricted_memory_limit(&self) -> Option<u64> {
        let raw = self.physical_memory_limit()?;
        limits::restrict_memory_limit(raw, system::address_space_limit(), system::physical_memory())
    }

    pub fn try_get_memory_limit_bytes(&self) -> Option<u64> {
        self.restricted_memory_limit()
    }

    /// Memory usage from the cgroup, falling back to the resident set size.
    pub fn try_get_memory_usage_bytes(&self) -> Option<u64> {
        self.physical_memory_usage()
            .or_else(|| system::resident_set_size(&self.config.statm_path()).ok_log())
    }

    pub fn try_get_cpu_limit_count(&self) -> Option<u32> {
        self.cpu_limit()
    }

    pub fn snapshot(&self) -> ResourceLimits {
        ResourceLimits {
            cgroup_version: self.version,
            memory_limit_bytes: self.try_get_memory_limit_bytes(),
            memory_usage_bytes: self.try_get_memory_usage_bytes(),
            cpu_limit: self.try_get_cpu_limit_count(),
        }
    }
}

fn resolve(config: &Config, version: CgroupVersion, controller: Controller) -> Option<PathBuf> {
    cgroup::resolve_controller_path(
        config.mountinfo_path(),
        config.cgroup_membership_path(),
        version,
        controller,
    )
    .map(|path| config.resolve(path))
    .ok_log()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rootfs_with(mountinfo: &str, membership: &str) -> tempfile::TempDir {
        let rootfs = tempfile::tempdir().unwrap();
        let proc_self = rootfs.path().join("proc/self");
        fs::create_dir_all(&proc_self).unwrap();
        fs::write(proc_self.join("mountinfo"), mountinfo).unwrap();
        fs::write(proc_self.join("cgroup"), membership).unwrap();
        rootfs
    }

    fn controller_dir(rootfs: &Path, path: &str, files: &[(&str, &str)]) {
        let dir = rootfs.join(path);
        fs::create_dir_all(&dir).unwrap();
        for (name, contents) in files {
            fs::write(dir.join(name), contents).unwrap();
        }
    }

    #[test]
    fn test_context_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResourceContext>();
    }

    #[test]
    fn test_no_cgroup_support_short_circuits() {
        let config = Config::new("/definitely/does/not/exist");
        let context = ResourceContext::initialize_with_version(config, CgroupVersion::None);

        assert_eq!(context.version(), CgroupVersion::None);
        assert!(context.memory_controller_path().is_none());
        assert!(context.cpu_controller_path().is_none());
        assert_eq!(context.physical_memory_limit(), None);
        assert_eq!(context.physical_memory_usage(), None);
        assert_eq!(context.try_get_cpu_limit_count(), None);
        assert_eq!(context.try_get_memory_usage_bytes(), None);
    }

    #[test]
    fn test_no_cgroup_mount_leaves_controllers_unresolved() {
        let rootfs = rootfs_with(
            "25 1 0:24 / /proc rw,relatime - proc proc rw\n",
            "3:memory:/my_named_cgroup\n4:cpu,cpuacct:/my_named_cgroup\n",
        );
        let context =
            ResourceContext::initialize_with_version(Config::new(rootfs.path()), CgroupVersion::V1);

        assert!(context.memory_controller_path().is_none());
        assert!(context.cpu_controller_path().is_none());
        assert_eq!(context.physical_memory_limit(), None);
        assert_eq!(context.try_get_cpu_limit_count(), None);
    }

    #[test]
    fn test_v2_queries() {
        let rootfs = rootfs_with(
            "30 23 0:26 / /sys/fs/cgroup rw,nosuid - cgroup2 cgroup2 rw,nsdelegate\n",
            "0::/kubepods/pod1\n",
        );
        controller_dir(
            rootfs.path(),
            "sys/fs/cgroup/kubepods/pod1",
            &[
                ("memory.max", "536870912\n"),
                ("memory.stat", "anon 4096\nfile 8192\nfile_dirty 4096\nunevictable 0\n"),
                ("cpu.max", "250000 100000\n"),
            ],
        );

        let context =
            ResourceContext::initialize_with_version(Config::new(rootfs.path()), CgroupVersion::V2);

        assert_eq!(
            context.memory_controller_path(),
            Some(rootfs.path().join("sys/fs/cgroup/kubepods/pod1").as_path())
        );
        assert_eq!(context.memory_controller_path(), context.cpu_controller_path());
        assert_eq!(context.physical_memory_limit(), Some(536_870_912));
        assert_eq!(context.physical_memory_usage(), Some(8192));
        assert_eq!(context.try_get_cpu_limit_count(), Some(3));
    }

    #[test]
    fn test_v2_unlimited() {
        let rootfs = rootfs_with(
            "30 23 0:26 / /sys/fs/cgroup rw - cgroup2 cgroup2 rw\n",
            "0::/\n",
        );
        controller_dir(
            rootfs.path(),
            "sys/fs/cgroup",
            &[("memory.max", "max\n"), ("cpu.max", "max 100000\n")],
        );

        let context =
            ResourceContext::initialize_with_version(Config::new(rootfs.path()), CgroupVersion::V2);

        assert_eq!(context.physical_memory_limit(), None);
        assert_eq!(context.try_get_memory_limit_bytes(), None);
        assert_eq!(context.try_get_cpu_limit_count(), None);
    }

    #[test]
    fn test_v1_sentinel_limit_is_no_limit() {
        let rootfs = rootfs_with(
            "33 26 0:30 / /sys/fs/cgroup/memory rw - cgroup cgroup rw,memory\n",
            "3:memory:/\n",
        );
        controller_dir(
            rootfs.path(),
            "sys/fs/cgroup/memory",
            &[("memory.limit_in_bytes", "9223372036854771712\n")],
        );

        let context =
            ResourceContext::initialize_with_version(Config::new(rootfs.path()), CgroupVersion::V1);

        assert_eq!(context.physical_memory_limit(), Some(9_223_372_036_854_771_712));
        assert_eq!(context.try_get_memory_limit_bytes(), None);
    }

    #[test]
    fn test_usage_falls_back_to_rss() {
        let rootfs = rootfs_with(
            "30 23 0:26 / /sys/fs/cgroup rw - cgroup2 cgroup2 rw\n",
            "0::/\n",
        );
        fs::write(rootfs.path().join("proc/self/statm"), "10240 2048 512 1 0 4096 0\n").unwrap();
        controller_dir(rootfs.path(), "sys/fs/cgroup", &[("memory.stat", "anon 4096\n")]);

        let context =
            ResourceContext::initialize_with_version(Config::new(rootfs.path()), CgroupVersion::V2);

        assert_eq!(context.physical_memory_usage(), None);
        let expected = system::page_size().map(|page_size| 2048 * page_size);
        assert_eq!(context.try_get_memory_usage_bytes(), expected);
    }

    #[test]
    fn test_queries_read_fresh_values() {
        let rootfs = rootfs_with(
            "30 23 0:26 / /sys/fs/cgroup rw - cgroup2 cgroup2 rw\n",
            "0::/\n",
        );
        controller_dir(rootfs.path(), "sys/fs/cgroup", &[("cpu.max", "100000 100000\n")]);
        let context =
            ResourceContext::initialize_with_version(Config::new(rootfs.path()), CgroupVersion::V2);
        assert_eq!(context.try_get_cpu_limit_count(), Some(1));

        fs::write(rootfs.path().join("sys/fs/cgroup/cpu.max"), "400000 100000\n").unwrap();
        assert_eq!(context.try_get_cpu_limit_count(), Some(4));
    }

    #[test]
    fn test_snapshot_serializes() {
        let context = ResourceContext::initialize_with_version(
            Config::new("/definitely/does/not/exist"),
            CgroupVersion::None,
        );
        let json = serde_json::to_value(context.snapshot()).unwrap();
        assert_eq!(json["cgroup_version"], "none");
        assert!(json["cpu_limit"].is_null());
    }
}
