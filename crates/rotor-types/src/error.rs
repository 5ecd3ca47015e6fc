// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Error Taxonomy
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coded error category shared by the solver, the Monte Carlo driver and the gates.
///
/// Numeric codes are stable; downstream report writers key on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    OutOfRange,
    Parse,
    Io,
    InvariantViolation,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 10,
            ErrorKind::OutOfRange => 22,
            ErrorKind::InvariantViolation => 30,
            ErrorKind::Internal => 32,
            ErrorKind::Io => 40,
            ErrorKind::Parse => 41,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::Parse => "parse",
            ErrorKind::Io => "io",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

/// Uniform error object: coded category, message, and the source site that raised it.
#[derive(Error, Debug)]
pub enum RotorError {
    #[error("Invalid argument: {message} [at {location}]")]
    InvalidArgument {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("Value out of range: {message} [at {location}]")]
    OutOfRange {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("Parse error: {message} [at {location}]")]
    Parse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
        location: &'static Location<'static>,
    },

    #[error("IO error: {message} [at {location}]")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        location: &'static Location<'static>,
    },

    #[error("Invariant violated: {message} [at {location}]")]
    InvariantViolation {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("Internal error: {message} [at {location}]")]
    Internal {
        message: String,
        location: &'static Location<'static>,
    },
}

pub type RotorResult<T> = Result<T, RotorError>;

impl RotorError {
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = non_empty(message.into());
        let location = Location::caller();
        match kind {
            ErrorKind::InvalidArgument => RotorError::InvalidArgument { message, location },
            ErrorKind::OutOfRange => RotorError::OutOfRange { message, location },
            ErrorKind::Parse => RotorError::Parse {
                message,
                source: None,
                location,
            },
            ErrorKind::Io => RotorError::Io {
                source: std::io::Error::other(message.clone()),
                message,
                location,
            },
            ErrorKind::InvariantViolation => {
                RotorError::InvariantViolation { message, location }
            }
            ErrorKind::Internal => RotorError::Internal { message, location },
        }
    }

    #[track_caller]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    #[track_caller]
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, message)
    }

    #[track_caller]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    #[track_caller]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvariantViolation, message)
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RotorError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            RotorError::OutOfRange { .. } => ErrorKind::OutOfRange,
            RotorError::Parse { .. } => ErrorKind::Parse,
            RotorError::Io { .. } => ErrorKind::Io,
            RotorError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            RotorError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    pub fn message(&self) -> &str {
        match self {
            RotorError::InvalidArgument { message, .. }
            | RotorError::OutOfRange { message, .. }
            | RotorError::Parse { message, .. }
            | RotorError::Io { message, .. }
            | RotorError::InvariantViolation { message, .. }
            | RotorError::Internal { message, .. } => message,
        }
    }

    /// Source site (file, line, column) where the error was raised.
    pub fn location(&self) -> &'static Location<'static> {
        match self {
            RotorError::InvalidArgument { location, .. }
            | RotorError::OutOfRange { location, .. }
            | RotorError::Parse { location, .. }
            | RotorError::Io { location, .. }
            | RotorError::InvariantViolation { location, .. }
            | RotorError::Internal { location, .. } => location,
        }
    }

    /// True for an internal invariant violation, such as merging aggregates of
    /// mismatched configuration. Other fatal kinds return false.
    pub fn is_invariant(&self) -> bool {
        self.kind() == ErrorKind::InvariantViolation
    }
}

impl From<std::io::Error> for RotorError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        RotorError::Io {
            message: source.to_string(),
            source,
            location: Location::caller(),
        }
    }
}

impl From<serde_json::Error> for RotorError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        RotorError::Parse {
            message: format!(
                "{} (line {}, column {})",
                source,
                source.line(),
                source.column()
            ),
            source: Some(source),
            location: Location::caller(),
        }
    }
}

/// Fail with `kind` unless `cond` holds. The message is built lazily.
#[track_caller]
pub fn ensure<F, S>(cond: bool, kind: ErrorKind, message: F) -> RotorResult<()>
where
    F: FnOnce() -> S,
    S: Into<String>,
{
    if cond {
        Ok(())
    } else {
        Err(RotorError::new(kind, message()))
    }
}

fn non_empty(message: String) -> String {
    if message.is_empty() {
        "<empty error message>".to_string()
    } else {
        message
    }
}
