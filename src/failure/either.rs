use thiserror::Error;

/// A failure from one of two streams, keeping both concrete types.
///
/// This is the typed alternative to erasing two unrelated failure types into
/// a [`BoxError`](super::BoxError): callers can match on the side which failed
/// instead of downcasting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EitherError<L, R> {
    /// The failure came from the left arm.
    #[error(transparent)]
    Left(L),

    /// The failure came from the right arm.
    #[error(transparent)]
    Right(R),
}

impl<L, R> EitherError<L, R> {
    /// Returns `true` if the failure came from the left arm.
    pub fn is_left(&self) -> bool {
        matches!(self, EitherError::Left(_))
    }

    /// Returns `true` if the failure came from the right arm.
    pub fn is_right(&self) -> bool {
        matches!(self, EitherError::Right(_))
    }

    /// The left failure, if that is the side which failed.
    pub fn left(self) -> Option<L> {
        match self {
            EitherError::Left(error) => Some(error),
            EitherError::Right(_) => None,
        }
    }

    /// The right failure, if that is the side which failed.
    pub fn right(self) -> Option<R> {
        match self {
            EitherError::Left(_) => None,
            EitherError::Right(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn display_is_transparent() {
        let error: EitherError<DiskFull, std::fmt::Error> = EitherError::Left(DiskFull);
        assert_eq!(error.to_string(), "disk full");
        assert!(error.source().is_none());
        assert_eq!(error.left(), Some(DiskFull));
    }

    #[test]
    fn right_side() {
        let error: EitherError<DiskFull, std::fmt::Error> = EitherError::Right(std::fmt::Error);
        assert!(error.is_right());
        assert!(!error.is_left());
        assert_eq!(error.right(), Some(std::fmt::Error));
    }
}
