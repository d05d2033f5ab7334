/// Coarse classification of a failed limit query.
///
/// Both kinds collapse to "unknown" at the public API; the distinction only
/// decides how loudly the failure is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The information does not exist here, e.g. no cgroup support, no matching
    /// hierarchy, or a missing file. Expected outside of containers.
    Unavailable,
    /// The information exists but could not be understood.
    Malformed,
}

/// Errors that can be sorted into an [`ErrorKind`].
pub trait ErrorClass {
    fn kind(&self) -> ErrorKind;
}

pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + ErrorClass,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                match err.kind() {
                    ErrorKind::Unavailable => log::debug!("{err}"),
                    ErrorKind::Malformed => log::warn!("{err}"),
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("test error")]
    struct TestError(ErrorKind);

    impl ErrorClass for TestError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    #[test]
    fn test_ok_log_keeps_value() {
        let res: Result<u32, TestError> = Ok(7);
        assert_eq!(res.ok_log(), Some(7));
    }

    #[test]
    fn test_ok_log_discards_errors_of_any_kind() {
        let unavailable: Result<u32, TestError> = Err(TestError(ErrorKind::Unavailable));
        let malformed: Result<u32, TestError> = Err(TestError(ErrorKind::Malformed));
        assert_eq!(unavailable.ok_log(), None);
        assert_eq!(malformed.ok_log(), None);
    }
}
