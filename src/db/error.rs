//! Database error types.

use derive_more::{Display, Error};

/// Classifies a [`DbError`] so callers can distinguish a missing record
/// from a storage fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// A point lookup found no record.
    NotFound,
    /// A write violated a uniqueness constraint.
    Conflict,
    /// Any other storage failure.
    Storage,
}

/// Database error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Database error: {} at {}:{}", message, file, line)]
pub struct DbError {
    /// Error classification.
    pub kind: DbErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates a new storage error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(DbErrorKind::Storage, message)
    }

    /// Creates a not-found error with caller location tracking.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(DbErrorKind::NotFound, message)
    }

    /// Creates a uniqueness-conflict error with caller location tracking.
    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_kind(DbErrorKind::Conflict, message)
    }

    #[track_caller]
    fn with_kind(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// True if the error is a missing-record condition.
    pub fn is_not_found(&self) -> bool {
        self.kind == DbErrorKind::NotFound
    }

    /// True if the error is a uniqueness-constraint violation.
    pub fn is_conflict(&self) -> bool {
        self.kind == DbErrorKind::Conflict
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::NotFound => Self::not_found("Record not found"),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::conflict(format!("Unique constraint violated: {}", info.message()))
            }
            _ => Self::new(format!("Diesel error: {}", err)),
        }
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("Connection error: {}", err))
    }
}
