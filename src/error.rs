//! Error types shared by the stores, authentication and the operation set.
//!
//! Every failure in the core is returned to the caller. None of these abort
//! the process; the front-end decides how to report each kind.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations
pub type Result<T, E = RosterError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RosterError {
    /// A collection file could not be opened, written or replaced.
    /// Durable state is left as it was.
    #[error("storage unavailable: {}: {source}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored line could not be decoded
    #[error("{}:{line}: malformed record", .path.display())]
    Corrupt { path: PathBuf, line: usize },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Student with Roll Number {0} not found")]
    NotFound(i32),

    #[error("[{field}]: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Menu selection outside the permitted set for the session role
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),
}

impl RosterError {
    pub fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StoreUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Recoverable errors leave the menu loop running
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Validation { .. } | Self::InvalidChoice(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = RosterError::validation("marks", "must be between 0 and 100");
        assert_eq!(err.to_string(), "[marks]: must be between 0 and 100");
    }

    #[test]
    fn test_unavailable_display_names_path() {
        let err = RosterError::unavailable(
            "data/students.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("data/students.txt"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(RosterError::NotFound(3).is_recoverable());
        assert!(RosterError::InvalidChoice("9".into()).is_recoverable());
        assert!(!RosterError::InvalidCredentials.is_recoverable());
        assert!(!RosterError::Corrupt {
            path: "x".into(),
            line: 1
        }
        .is_recoverable());
    }
}
