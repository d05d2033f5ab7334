use std::path::PathBuf;

use crate::error::{ErrorClass, ErrorKind};
use crate::{fsutil, mountinfo};

/// Errors that may occur while resolving a controller directory.
///
/// All of them mean the controller is unknown and its resource is treated as
/// unconstrained.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cgroup support was not detected")]
    Unsupported,
    #[error(transparent)]
    Mount(#[from] mountinfo::Error),
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no membership in the {hierarchy} hierarchy in file `{path}`")]
    MissingMembership {
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
