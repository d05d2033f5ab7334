use std::path::Path;

use super::{CgroupVersion, Controller, Error, Result, membership};
use crate::mountinfo::{self, HierarchyMount};

/// Resolves the absolute directory of `controller` for the current process.
///
/// Combines the hierarchy mount found in `mountinfo_path` with the process's
/// membership path found in `membership_path`, see [`join_controller_path`].
///
/// # Errors
///
/// - [`Error::Unsupported`] if `version` is [`CgroupVersion::None`].
/// - [`Error::Mount`] if no hierarchy mount serves the controller.
/// - [`Error::MissingMembership`] if the process has no membership in that hierarchy.
///
/// # Example
///
/// ```no_run
/// use creo_limits::cgroup::{CgroupVersion, Controller, resolve_controller_path};
///
/// let dir = resolve_controller_path(
///     "/proc/self/mountinfo",
///     "/proc/self/cgroup",
///     CgroupVersion::V2,
///     Controller::Memory,
/// )
/// .unwrap();
/// println!("memory controller at {dir}");
/// ```
pub fn resolve_controller_path(
    mountinfo_path: impl AsRef<Path>,
    membership_path: impl AsRef<Path>,
    version: CgroupVersion,
    controller: Controller,
) -> Result<String> {
    if !version.is_available() {
        return Err(Error::Unsupported);
    }
    let filter = version.hierarchy_filter(controller);

    let mount = mountinfo::find_hierarchy_mount(mountinfo_path, filter)?;
    let relative = membership::find_membership_path(membership_path, filter)?;
    let resolved = join_controller_path(&mount, &relative);

    log::debug!("Resolved {controller} controller path: {resolved}");
    Ok(resolved)
}

/// Appends the membership path to the mount point, dropping the part already
/// covered by the mount root.
///
/// Outside a container the mount root is `/` and the membership path is used
/// verbatim:
///
/// ```text
/// mount point:     /sys/fs/cgroup/cpu
/// mount root:      /
/// membership path: /my_named_cgroup
/// result:          /sys/fs/cgroup/cpu/my_named_cgroup
/// ```
///
/// Inside a container the mount root is a prefix of the membership path:
///
/// ```text
/// mount point:     /sys/fs/cgroup/cpu
/// mount root:      /docker/87ee2de5
/// membership path: /docker/87ee2de5/my_named_cgroup
/// result:          /sys/fs/cgroup/cpu/my_named_cgroup
/// ```
pub fn join_controller_path(mount: &HierarchyMount, membership_path: &str) -> String {
    let root = mount.root.as_str();
    let prefix_len = if root == "/" || !membership_path.starts_with(root) {
        0
    } else {
        root.len()
    };

    let relative = &membership_path[prefix_len..];
    debug_assert!(
        relative.is_empty() || relative.starts_with('/'),
        "mount root `{root}` does not end at a path boundary of `{membership_path}`"
    );

    let mut resolved = String::with_capacity(mount.mount_point.len() + relative.len());
    resolved.push_str(&mount.mount_point);
    resolved.push_str(relative);
    resolved
}
