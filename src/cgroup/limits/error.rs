//! Errors raised by the cgroup limit readers.
//!
//! [`Error::kind`](crate::error::ErrorClass::kind) separates limits that are
//! simply not set (e.g. `max`) from files whose contents could not be parsed.

use std::num::ParseIntError;
use std::path::PathBuf;

use crate::error::{ErrorClass, ErrorKind};
use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cgroup support was not detected")]
    Unsupported,

    #[error(transparent)]
    Read(#[from] fsutil::ReadError),

    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),

    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no limit is configured in `{path}`")]
    Unlimited { path: PathBuf },

    #[error("invalid value in `{path}`: `{value}`: {source}")]
    InvalidValue {
        path: PathBuf,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("non-positive value in `{path}`: {value}")]
    NonPositive { path: PathBuf, value: i64 },

    #[error("missing field `{field}` in `{path}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("duplicate key `{key}` at line {line} in `{path}`")]
    DuplicateKey {
        path: PathBuf,
        key: &'static str,
        line: usize,
    },

    #[error("missing keys {missing:?} in `{path}`")]
    MissingKeys {
        path: PathBuf,
        missing: Vec<&'static str>,
    },
}

impl ErrorClass for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Read(err) => err.kind(),
            Error::Unsupported
            | Error::FileOpen(_)
            | Error::ReadLine { .. }
            | Error::Unlimited { .. } => ErrorKind::Unavailable,
            Error::InvalidValue { .. }
            | Error::NonPositive { .. }
            | Error::MissingField { .. }
            | Error::DuplicateKey { .. }
            | Error::MissingKeys { .. } => ErrorKind::Malformed,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
