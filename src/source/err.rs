//! Errors of the remote lecture source.
//!
//! Like with most things talking to a remote service, we only distinguish a
//! few coarse "kinds" of errors. Those decide how the error is treated: fetch
//! errors are shown with a retry option, creation errors are shown right where
//! the record was entered. This module also offers a couple macros to easily
//! create an error.

use std::fmt;


pub(crate) type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug)]
pub(crate) struct SourceError {
    pub(crate) msg: String,
    pub(crate) kind: SourceErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceErrorKind {
    /// Network, backend or auth failure. Retryable by the user.
    SourceUnavailable,

    /// The media reference of a new record is already used by another one.
    Conflict,

    /// A new record is missing required fields or has invalid values.
    Validation,

    /// Creating records requires a signed-in user.
    NotAuthorized,
}

impl SourceErrorKind {
    fn message_prefix(&self) -> &str {
        match self {
            Self::SourceUnavailable => "Lecture source unavailable",
            Self::Conflict => "Conflict",
            Self::Validation => "Invalid input",
            Self::NotAuthorized => "Not authorized",
        }
    }
}

impl SourceError {
    pub(crate) fn is_retryable(&self) -> bool {
        self.kind == SourceErrorKind::SourceUnavailable
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.message_prefix(), self.msg)
    }
}

impl std::error::Error for SourceError {}


// ===== Helper macros to easily create errors ==================================================

/// Creates a `SourceError` with a `format!` like syntax.
macro_rules! source_err {
    ($kind:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::source::SourceError {
            msg: format!($fmt $(, $arg)*),
            kind: $crate::source::SourceErrorKind::$kind,
        }
    };
}

macro_rules! unavailable {
    ($($t:tt)+) => { $crate::source::err::source_err!(SourceUnavailable, $($t)*) };
}

macro_rules! conflict {
    ($($t:tt)+) => { $crate::source::err::source_err!(Conflict, $($t)*) };
}

macro_rules! invalid_input {
    ($($t:tt)+) => { $crate::source::err::source_err!(Validation, $($t)*) };
}

macro_rules! not_authorized {
    ($($t:tt)+) => { $crate::source::err::source_err!(NotAuthorized, $($t)*) };
}

pub(crate) use source_err;
pub(crate) use unavailable;
pub(crate) use conflict;
pub(crate) use invalid_input;
pub(crate) use not_authorized;
