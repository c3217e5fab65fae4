//! Error kinds shared by the comment and diary services.
//!
//! Service errors keep their full cause chain; callers that only need to
//! pick a response class match on [`ErrorKind`].

use std::fmt::{Display, Formatter};

/// Closed classification of service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced post, comment or diary is absent.
    NotFound,
    /// Requester is not the comment author.
    Forbidden,
    /// Diary date already taken while uniqueness is enforced.
    Conflict,
    /// Store, driver or decoding failure.
    StoreFailure,
}

impl ErrorKind {
    /// Stable snake_case code used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::StoreFailure => "store_failure",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
