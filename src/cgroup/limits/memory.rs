use std::io::BufRead;
use std::path::Path;

use super::{Error, Result, parse_value};
use crate::cgroup::CgroupVersion;
use crate::fsutil;

const V1_LIMIT_FILE: &str = "memory.limit_in_bytes";
const V2_LIMIT_FILE: &str = "memory.max";
const STAT_FILE: &str = "memory.stat";

/// Limits at or above this value mean "no limit".
///
/// An unlimited v1 cgroup reports `0x7FFFFFFFFFFFF000` (2^63-1 rounded down to
/// a 4k page), which this bound also covers for larger page sizes.
pub const UNBOUNDED_MEMORY_SENTINEL: u64 = 0x7FFF_FFFF_0000_0000;

/// The `memory.stat` keys that sum up to the non-reclaimable memory the OOM
/// killer accounts for. Page cache that can be reclaimed is left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageKeys(&'static [&'static str]);

impl UsageKeys {
    pub const V1: UsageKeys = UsageKeys(&[
        "total_inactive_anon",
        "total_active_anon",
        "total_dirty",
        "total_unevictable",
    ]);
    pub const V2: UsageKeys = UsageKeys(&["anon", "file_dirty", "unevictable"]);

    pub fn for_version(version: CgroupVersion) -> Self {
        match version {
            CgroupVersion::V1 => UsageKeys::V1,
            CgroupVersion::V2 | CgroupVersion::None => UsageKeys::V2,
        }
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Matches `line` against the keys by exact `"<key> "` prefix and returns
    /// the index of the key together with the rest of the line.
    fn match_line<'l>(&self, line: &'l str) -> Option<(usize, &'l str)> {
        self.0.iter().enumerate().find_map(|(index, key)| {
            line.strip_prefix(key)
                .and_then(|rest| rest.strip_prefix(' '))
                .map(|rest| (index, rest))
        })
    }
}

/// Reads the raw memory limit of the controller directory `dir`.
///
/// # Errors
///
/// - [`Error::Unsupported`] for [`CgroupVersion::None`].
/// - [`Error::Read`] if the limit file can't be read.
/// - [`Error::Unlimited`] if the file holds `max`.
/// - [`Error::InvalidValue`] if the value is not an integer.
pub fn read_memory_limit(dir: &Path, version: CgroupVersion) -> Result<u64> {
    let file = match version {
        CgroupVersion::V1 => V1_LIMIT_FILE,
        CgroupVersion::V2 => V2_LIMIT_FILE,
        CgroupVersion::None => return Err(Error::Unsupported),
    };
    let path = dir.join(file);
    log::trace!("Reading memory limit from `{}`", path.display());

    let line = fsutil::read_first_line(&path)?;
    parse_memory_limit(&path, &line)
}

/// Parses the contents of `memory.limit_in_bytes` or `memory.max`.
pub fn parse_memory_limit(path: &Path, value: &str) -> Result<u64> {
    match value.trim() {
        "max" => Err(Error::Unlimited {
            path: path.to_path_buf(),
        }),
        value => parse_value(path, value),
    }
}

/// Applies the host-side clamps to a raw cgroup memory limit.
///
/// Returns `None` for the unbounded sentinel. Otherwise the limit is clamped to
/// the address-space limit and the physical memory, where known, and saturated
/// at `usize::MAX`.
pub fn restrict_memory_limit(
    raw: u64,
    address_space_limit: Option<u64>,
    physical_memory: Option<u64>,
) -> Option<u64> {
    if raw >= UNBOUNDED_MEMORY_SENTINEL {
        return None;
    }

    let limit = [address_space_limit, physical_memory]
        .into_iter()
        .flatten()
        .fold(raw, u64::min);

    Some(u64::try_from(usize::MAX).map_or(limit, |max| limit.min(max)))
}

/// Reads `memory.stat` of the controller directory `dir` and sums up `keys`.
pub fn read_memory_usage(dir: &Path, keys: UsageKeys) -> Result<u64> {
    let path = dir.join(STAT_FILE);
    log::trace!("Reading memory usage from `{}`", path.display());

    let reader = fsutil::open_file_reader(&path)?;
    sum_memory_usage_from_reader(reader, &path, keys)
}

/// Sums the values of `keys` in a `memory.stat`-formatted reader.
///
/// Each line is tested against every key; the first matching key consumes the
/// line. Reading stops once all keys have been seen.
///
/// # Errors
///
/// - [`Error::ReadLine`] if reading fails.
/// - [`Error::InvalidValue`] if a matched value is not an integer.
/// - [`Error::DuplicateKey`] if a key occurs twice.
/// - [`Error::MissingKeys`] if the input ends before every key was found. No
///   partial sum is returned.
pub fn sum_memory_usage_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
    keys: UsageKeys,
) -> Result<u64> {
    let mut seen = vec![false; keys.len()];
    let mut found = 0usize;
    let mut total = 0u64;

    let mut line = String::with_capacity(64);
    let mut lineno = 0usize;

    while found < keys.len()
        && reader
            .read_line(&mut line)
            .map_err(|source| Error::ReadLine {
                path: origin.to_path_buf(),
                source,
            })?
            != 0
    {
        lineno += 1;
        if let Some((index, value)) = keys.match_line(&line) {
            let value: u64 = parse_value(origin, value.trim())?;
            if seen[index] {
                return Err(Error::DuplicateKey {
                    path: origin.to_path_buf(),
                    key: keys.names()[index],
                    line: lineno,
                });
            }
            seen[index] = true;
            found += 1;
            total = total.saturating_add(value);
        }

        line.clear();
    }

    if found == keys.len() {
        return Ok(total);
    }

    let missing = keys
        .names()
        .iter()
        .zip(&seen)
        .filter(|(_, seen)| !**seen)
        .map(|(key, _)| *key)
        .collect();
    Err(Error::MissingKeys {
        path: origin.to_path_buf(),
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorClass, ErrorKind};
    use std::io::Write;

    const V1_STAT: &str = "\
cache 1536000
rss 4096000
rss_huge 0
total_cache 1536000
total_rss 4096000
total_dirty 8192
total_inactive_anon 1000
total_active_anon 4095000
total_inactive_file 1200000
total_active_file 336000
total_unevictable 4096
";

    const V2_STAT: &str = "\
anon 2650112
file 5001216
kernel_stack 81920
anon_thp 0
file_dirty 12288
file_writeback 0
unevictable 4096
";

    fn dummy() -> &'static Path {
        Path::new("/dummy")
    }

    #[test]
    fn test_v1_usage_sums_non_reclaimable_keys() {
        let usage = sum_memory_usage_from_reader(V1_STAT.as_bytes(), dummy(), UsageKeys::V1)
            .unwrap();
        assert_eq!(usage, 1000 + 4_095_000 + 8192 + 4096);
    }

    #[test]
    fn test_v2_usage_does_not_match_longer_keys() {
        let usage = sum_memory_usage_from_reader(V2_STAT.as_bytes(), dummy(), UsageKeys::V2)
            .unwrap();
        assert_eq!(usage, 2_650_112 + 12_288 + 4096);
    }

    #[test]
    fn test_missing_key_yields_no_partial_sum() {
        let data = "\
total_inactive_anon 1000
total_active_anon 2000
total_dirty 3000
";
        let err =
            sum_memory_usage_from_reader(data.as_bytes(), dummy(), UsageKeys::V1).unwrap_err();
        match &err {
            Error::MissingKeys { missing, .. } => assert_eq!(missing, &vec!["total_unevictable"]),
            other => panic!("Expected MissingKeys, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_invalid_usage_value() {
        let data = "anon abc\nfile_dirty 1\nunevictable 2\n";
        let err =
            sum_memory_usage_from_reader(data.as_bytes(), dummy(), UsageKeys::V2).unwrap_err();
        match err {
            Error::InvalidValue { value, .. } => assert_eq!(value, "abc"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_usage_key() {
        let data = "anon 1\nanon 2\nfile_dirty 1\nunevictable 2\n";
        let err =
            sum_memory_usage_from_reader(data.as_bytes(), dummy(), UsageKeys::V2).unwrap_err();
        match err {
            Error::DuplicateKey { key, line, .. } => {
                assert_eq!(key, "anon");
                assert_eq!(line, 2);
            }
            other => panic!("Expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn test_usage_keys_for_version() {
        assert_eq!(UsageKeys::for_version(CgroupVersion::V1).len(), 4);
        assert_eq!(UsageKeys::for_version(CgroupVersion::V2).len(), 3);
    }

    #[test]
    fn test_parse_memory_limit() {
        assert_eq!(parse_memory_limit(dummy(), "536870912\n").unwrap(), 536_870_912);
        assert!(matches!(
            parse_memory_limit(dummy(), "max").unwrap_err(),
            Error::Unlimited { .. }
        ));
        assert!(matches!(
            parse_memory_limit(dummy(), "lots").unwrap_err(),
            Error::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_read_memory_limit_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memory.limit_in_bytes"), "9223372036854771712\n").unwrap();
        std::fs::write(dir.path().join("memory.max"), "max\n").unwrap();

        let raw = read_memory_limit(dir.path(), CgroupVersion::V1).unwrap();
        assert_eq!(raw, 9_223_372_036_854_771_712);
        assert_eq!(restrict_memory_limit(raw, None, None), None);

        let err = read_memory_limit(dir.path(), CgroupVersion::V2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_read_memory_limit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_memory_limit(dir.path(), CgroupVersion::V2).unwrap_err();
        assert!(matches!(err, Error::Read(_)));
    }

    #[test]
    fn test_read_memory_usage_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("memory.stat")).unwrap();
        file.write_all(V2_STAT.as_bytes()).unwrap();

        let usage = read_memory_usage(dir.path(), UsageKeys::V2).unwrap();
        assert_eq!(usage, 2_666_496);
    }

    #[test]
    fn test_restrict_memory_limit_clamps() {
        let gib = 1 << 30;
        assert_eq!(restrict_memory_limit(4 * gib, None, None), Some(4 * gib));
        assert_eq!(
            restrict_memory_limit(4 * gib, Some(2 * gib), Some(8 * gib)),
            Some(2 * gib)
        );
        assert_eq!(
            restrict_memory_limit(4 * gib, Some(u64::MAX), Some(gib)),
            Some(gib)
        );
        assert_eq!(
            restrict_memory_limit(UNBOUNDED_MEMORY_SENTINEL, Some(gib), Some(gib)),
            None
        );
        assert_eq!(
            restrict_memory_limit(UNBOUNDED_MEMORY_SENTINEL - 1, None, None),
            Some(UNBOUNDED_MEMORY_SENTINEL - 1)
        );
    }
}
