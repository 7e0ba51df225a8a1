use std::fmt::{self, Display};

/// The kind of error that occurred while talking to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received (connection refused, reset, etc).
    Network,
    /// The backend answered with a non-success HTTP status.
    Status(u16),
    /// The response body could not be decoded.
    InvalidResponse,
}

impl ErrorKind {
    /// Returns the HTTP status code, if this is a status error.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        match self {
            ErrorKind::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "Network error"),
            ErrorKind::Status(code) => write!(f, "HTTP error! status: {code}"),
            ErrorKind::InvalidResponse => write!(f, "Invalid response"),
        }
    }
}
