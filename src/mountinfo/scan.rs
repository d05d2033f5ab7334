use std::io::BufRead;
use std::path::Path;

use super::parser::{MountRecord, parse_mount_record};
use super::{Error, Result};
use crate::cgroup::{Controller, hierarchy_label};
use crate::fsutil;

/// Where a cgroup hierarchy is mounted and which subtree of it is visible.
///
/// Inside a container the `root` is usually the container's own cgroup
/// (e.g. `/docker/<id>`), while on the host it is `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyMount {
    /// Mount point in the process's view, e.g. `/sys/fs/cgroup/memory`.
    pub mount_point: String,
    /// Root of the mount within the hierarchy.
    pub root: String,
}

/// Finds the first cgroup mount serving `controller` in the given `mountinfo` file.
///
/// With `controller == None` the first mount of any `cgroup*` filesystem
/// matches, which is what the single unified (v2) hierarchy needs. With
/// `Some(controller)` the mount must also list the controller among its
/// superblock options, as v1 hierarchies do.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::MissingHierarchy`] if no matching mount is found.
///
/// # Example
///
/// ```no_run
/// use creo_limits::cgroup::Controller;
/// use creo_limits::mountinfo::find_hierarchy_mount;
///
/// let mount = find_hierarchy_mount("/proc/self/mountinfo", Some(Controller::Memory)).unwrap();
/// println!("memory hierarchy at {} (root {})", mount.mount_point, mount.root);
/// ```
pub fn find_hierarchy_mount(
    path: impl AsRef<Path>,
    controller: Option<Controller>,
) -> Result<HierarchyMount> {
    let path = path.as_ref();
    let buf = fsutil::open_file_reader(path)?;

    find_hierarchy_mount_from_reader(buf, path, controller)
}

/// Reader-based implementation of [`find_hierarchy_mount`].
///
/// Lines that fail to parse are logged and skipped. The line buffer is reused
/// across iterations, so it only grows to the longest line seen.
///
/// # Errors
///
/// - [`Error::ReadLine`] if reading a line fails.
/// - [`Error::MissingHierarchy`] if no matching entry is found.
pub fn find_hierarchy_mount_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
    controller: Option<Controller>,
) -> Result<HierarchyMount> {
    let mut buf = Vec::with_capacity(256);
    let mut lineno = 0usize;

    while reader
        .read_until(b'\n', &mut buf)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        lineno += 1;
        // Mount points are not escaped for non-UTF-8 bytes.
        let Ok(line) = std::str::from_utf8(&buf) else {
            log::warn!(
                "Skipping non-UTF-8 line {lineno} in `{}`",
                origin.display()
            );
            buf.clear();
            continue;
        };
        match parse_mount_record(line) {
            Ok(record) if record.is_cgroup() && serves(&record, controller) => {
                log::debug!(
                    "Found `{}` mount for the {} hierarchy with root `{}`: {}",
                    record.fs_type,
                    hierarchy_label(controller),
                    record.root,
                    record.mount_point
                );
                return Ok(HierarchyMount {
                    mount_point: record.mount_point.to_owned(),
                    root: record.root.to_owned(),
                });
            }
            Ok(_) => {}
            Err(err) => log::warn!(
                "Skipping malformed line {lineno} in `{}`: {err}",
                origin.display()
            ),
        }

        buf.clear();
    }

    Err(Error::MissingHierarchy {
        path: origin.to_path_buf(),
        hierarchy: hierarchy_label(controller),
    })
}

fn serves(record: &MountRecord<'_>, controller: Option<Controller>) -> bool {
    controller.is_none_or(|controller| record.super_options().any(|opt| controller.matches(opt)))
}
