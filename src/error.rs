use std::{error, fmt, io, result};

/// Where a row was found in the decoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Byte offset of the row's first character
    pub byte: u64,
    /// Zero-based index of the row among decoded rows, blank ones included
    pub row: u64,
}

/// The specific type of an error.
///
/// Note that decoding, normalizing and matching never fail: errors only
/// arise when loading a roster strictly or from a reader.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Wrap a [std::io::Error], which includes invalid UTF-8 input.
    Io(io::Error),

    /// Indicate that a non-flexible roster loader found a data row having an
    /// incorrect number of fields.
    UnequalLengths {
        /// Expected number of fields
        expected_len: usize,
        /// Actual and incorrect number of fields observed
        len: usize,
        /// Position of the offending row, if known
        pos: Option<Position>,
    },
}

/// An error occurring when loading a roster.
#[derive(Debug)]
pub struct Error(ErrorKind);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self(kind)
    }

    /// Return whether the wrapped error is a [`std::io::Error`].
    pub fn is_io_error(&self) -> bool {
        matches!(self.0, ErrorKind::Io(_))
    }

    /// Return a reference to the underlying [`ErrorKind`].
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwraps the error into its underlying [`ErrorKind`].
    pub fn into_kind(self) -> ErrorKind {
        self.0
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err.0 {
            ErrorKind::Io(inner) => inner,
            kind => Self::new(io::ErrorKind::InvalidData, Error(kind)),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.0 {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::UnequalLengths {
                expected_len,
                len,
                pos: Some(Position { byte, row }),
            } => write!(
                f,
                "roster error: row {} (byte: {}) has {} fields, but {} were expected",
                row, byte, len, expected_len
            ),
            ErrorKind::UnequalLengths {
                expected_len,
                len,
                pos: None,
            } => write!(
                f,
                "roster error: found row with {} fields, but {} were expected",
                len, expected_len
            ),
        }
    }
}

/// A type alias for `Result<T, roster_search::Error>`.
pub type Result<T> = result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::new(ErrorKind::UnequalLengths {
            expected_len: 20,
            len: 3,
            pos: Some(Position { byte: 42, row: 2 }),
        });

        assert_eq!(
            err.to_string(),
            "roster error: row 2 (byte: 42) has 3 fields, but 20 were expected"
        );
        assert!(!err.is_io_error());

        let err = Error::new(ErrorKind::UnequalLengths {
            expected_len: 2,
            len: 1,
            pos: None,
        });

        assert_eq!(
            err.to_string(),
            "roster error: found row with 1 fields, but 2 were expected"
        );
    }

    #[test]
    fn test_io_conversions() {
        let err = Error::from(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8"));

        assert!(err.is_io_error());
        assert_eq!(io::Error::from(err).kind(), io::ErrorKind::InvalidData);
    }
}
