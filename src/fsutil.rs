use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{ErrorClass, ErrorKind};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Errors that may occur when reading a single-line pseudo-file.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Open(#[from] FileOpenError),
    #[error("failed to read from file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file `{path}` is empty")]
    Empty { path: PathBuf },
}

impl ErrorClass for ReadError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReadError::Open(_) | ReadError::Read { .. } => ErrorKind::Unavailable,
            ReadError::Empty { .. } => ErrorKind::Malformed,
        }
    }
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use creo_limits::fsutil;
/// let reader = fsutil::open_file_reader("/proc/self/mountinfo")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Reads the first line of the file at `path`, without its line terminator.
///
/// cgroup limit files such as `memory.max` or `cpu.max` hold exactly one line.
///
/// # Errors
///
/// - [`ReadError::Open`] if the file cannot be opened.
/// - [`ReadError::Read`] if reading fails.
/// - [`ReadError::Empty`] if the file has no content at all.
pub fn read_first_line(path: impl AsRef<Path>) -> Result<String, ReadError> {
    let path = path.as_ref();
    let mut reader = open_file_reader(path)?;
    let mut line = String::with_capacity(64);

    let read = reader
        .read_line(&mut line)
        .map_err(|source| ReadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if read == 0 {
        return Err(ReadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let len = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(len);
    Ok(line)
}
