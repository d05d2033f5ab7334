//! Mountinfo line parser for Linux systems.
//!
//! Parses lines in `/proc/[pid]/mountinfo` format. See
//! [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)
//! for details on the structure. Only the fields needed to locate a cgroup
//! hierarchy are kept.

/// A parsed mountinfo line.
#[derive(Debug, PartialEq, Eq)]
pub struct MountRecord<'a> {
    /// Root of the mount within the filesystem.
    pub root: &'a str,
    /// Mount point relative to the process's root.
    pub mount_point: &'a str,
    /// Filesystem type (e.g., `cgroup`, `cgroup2`, `tmpfs`).
    pub fs_type: &'a str,
    /// Source of the mount (e.g., device).
    pub source: &'a str,
    /// Comma-separated superblock options. For cgroup v1 mounts these name the
    /// controllers bound to the hierarchy.
    pub super_options: &'a str,
}

impl<'a> MountRecord<'a> {
    /// Returns true for both `cgroup` (v1) and `cgroup2` mounts.
    pub fn is_cgroup(&self) -> bool {
        self.fs_type.starts_with("cgroup")
    }

    /// Iterates the comma-separated superblock options.
    pub fn super_options(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.super_options.split(',').filter(|opt| !opt.is_empty())
    }
}

/// Named fields in a mountinfo line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountField {
    Root,
    MountPoint,
    FsType,
    Source,
    SuperOptions,
}

impl std::fmt::Display for MountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MountField::Root => "root",
            MountField::MountPoint => "mount_point",
            MountField::FsType => "fs_type",
            MountField::Source => "source",
            MountField::SuperOptions => "super_options",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur when parsing a mountinfo line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing separator ` - ` in line: `{0}`")]
    MissingSeparator(String),

    #[error("missing `{field}` in line: `{line}`")]
    MissingField { field: MountField, line: String },
}

/// Parses a single line of mountinfo data.
///
/// The returned record borrows from `line`; nothing is allocated on success.
///
/// # Errors
///
/// Returns [`ParseError::MissingSeparator`] if the ` - ` separator before the
/// filesystem type is absent, and [`ParseError::MissingField`] if any required
/// field is absent.
pub fn parse_mount_record(line: &str) -> Result<MountRecord<'_>, ParseError> {
    let trimmed = line.trim_end();
    let (pre, post) = trimmed
        .split_once(" - ")
        .ok_or_else(|| ParseError::MissingSeparator(trimmed.to_owned()))?;
    let missing = |field| ParseError::MissingField {
        field,
        line: trimmed.to_owned(),
    };

    // mount ID, parent ID and major:minor precede the mount root.
    let mut pre_fields = pre.split_whitespace().skip(3);
    let root = pre_fields.next().ok_or_else(|| missing(MountField::Root))?;
    let mount_point = pre_fields
        .next()
        .ok_or_else(|| missing(MountField::MountPoint))?;

    let mut post_fields = post.split_whitespace();
    let fs_type = post_fields
        .next()
        .ok_or_else(|| missing(MountField::FsType))?;
    let source = post_fields
        .next()
        .ok_or_else(|| missing(MountField::Source))?;
    let super_options = post_fields
        .next()
        .ok_or_else(|| missing(MountField::SuperOptions))?;

    Ok(MountRecord {
        root,
        mount_point,
        fs_type,
        source,
        super_options,
    })
}
