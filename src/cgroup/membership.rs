//! Parser and scanner for `/proc/[pid]/cgroup`.
//!
//! Each line has the form `<hierarchy-id>:<controller-list>:<cgroup-path>`:
//!
//! - v1: the hierarchy id is arbitrary and the controller list is a
//!   comma-separated list such as `cpu,cpuacct`.
//! - v2: the line is always `0::<cgroup-path>`.
//!
//! The path is relative to the root of the hierarchy.

use std::io::BufRead;
use std::path::Path;

use super::{Controller, Error, Result, hierarchy_label};
use crate::fsutil;

/// A parsed line of `/proc/[pid]/cgroup`.
#[derive(Debug, PartialEq, Eq)]
pub struct MembershipRecord<'a> {
    pub hierarchy_id: &'a str,
    /// Comma-separated controller names, empty for the unified hierarchy.
    pub controllers: &'a str,
    /// Hierarchy-relative cgroup path.
    pub path: &'a str,
}

impl MembershipRecord<'_> {
    /// Returns true if this record describes the unified (v2) hierarchy.
    pub fn is_unified(&self) -> bool {
        self.hierarchy_id == "0" && self.controllers.is_empty()
    }

    /// Returns true if the record belongs to the hierarchy selected by `controller`.
    ///
    /// `None` selects the unified hierarchy.
    pub fn serves(&self, controller: Option<Controller>) -> bool {
        match controller {
            Some(controller) => self
                .controllers
                .split(',')
                .any(|name| controller.matches(name)),
            None => self.is_unified(),
        }
    }
}

/// Errors that may occur when parsing a membership line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("expected `<hierarchy-id>:<controllers>:<path>` in line: `{0}`")]
    MissingSeparator(String),
    #[error("missing cgroup path in line: `{0}`")]
    MissingPath(String),
}

/// Parses a single line of `/proc/[pid]/cgroup`.
///
/// # Errors
///
/// Returns [`ParseError::MissingSeparator`] if the line has fewer than three
/// `:`-separated fields, and [`ParseError::MissingPath`] if the path is empty.
pub fn parse_membership_line(line: &str) -> std::result::Result<MembershipRecord<'_>, ParseError> {
    let trimmed = line.trim_end();
    let mut fields = trimmed.splitn(3, ':');
    let (Some(hierarchy_id), Some(controllers), Some(path)) =
        (fields.next(), fields.next(), fields.next())
    else {
        return Err(ParseError::MissingSeparator(trimmed.to_owned()));
    };

    let path = path
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::MissingPath(trimmed.to_owned()))?;

    Ok(MembershipRecord {
        hierarchy_id,
        controllers,
        path,
    })
}

/// Finds the hierarchy-relative cgroup path of the current process for the
/// hierarchy selected by `controller` (`None` for the unified hierarchy).
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::MissingMembership`] if no record matches.
pub fn find_membership_path(
    path: impl AsRef<Path>,
    controller: Option<Controller>,
) -> Result<String> {
    let path = path.as_ref();
    let buf = fsutil::open_file_reader(path)?;

    find_membership_path_from_reader(buf, path, controller)
}

/// Reader-based implementation of [`find_membership_path`]. The first matching
/// record wins; malformed lines are logged and skipped.
pub fn find_membership_path_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
    controller: Option<Controller>,
) -> Result<String> {
    let mut buf = Vec::with_capacity(128);
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
        let Ok(line) = std::str::from_utf8(&buf) else {
            log::warn!(
                "Skipping non-UTF-8 line {lineno} in `{}`",
                origin.display()
            );
            buf.clear();
            continue;
        };
        match parse_membership_line(line) {
            Ok(record) if record.serves(controller) => {
                log::debug!(
                    "Found membership in the {} hierarchy: {}",
                    hierarchy_label(controller),
                    record.path
                );
                return Ok(record.path.to_owned());
            }
            Ok(_) => {}
            Err(err) => log::warn!(
                "Skipping malformed line {lineno} in `{}`: {err}",
                origin.display()
            ),
        }

        buf.clear();
    }

    Err(Error::MissingMembership {
        path: origin.to_path_buf(),
        hierarchy: hierarchy_label(controller),
    })
}
