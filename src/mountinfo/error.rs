use std::path::PathBuf;

use crate::error::{ErrorClass, ErrorKind};
use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no cgroup mount for the {hierarchy} hierarchy in file `{path}`")]
    MissingHierarchy {
        path: PathBuf,
        hierarchy: &'static str,
    },
}

impl ErrorClass for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Unavailable
    }
}

pub type Result<T> = std::result::Result<T, Error>;
