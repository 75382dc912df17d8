//! Custom error types for Tally
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. The four reconciliation failures
//! (`Conflict`, `InvalidState`, `NotFound`, `Precondition`) are always
//! recoverable by the caller re-issuing a corrected action.

use thiserror::Error;

use crate::models::SessionStateError;

/// The main error type for Tally operations
#[derive(Error, Debug)]
pub enum TallyError {
    /// An account already has an in-progress reconciliation session,
    /// or an audit record would be rewritten
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation attempted against a session in the wrong state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Entity not found, or not owned by the expected account
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A required input has not been supplied yet
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TallyError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for statements
    pub fn statement_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Statement",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for reconciliation sessions
    pub fn session_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Session",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if this is an invalid state error
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    /// Check if this is a precondition error
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for TallyError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<SessionStateError> for TallyError {
    fn from(err: SessionStateError) -> Self {
        match err {
            SessionStateError::NotInProgress { .. } => Self::InvalidState(err.to_string()),
            SessionStateError::ActualBalanceUnset => Self::Precondition(err.to_string()),
        }
    }
}

/// Result type alias for Tally operations
pub type TallyResult<T> = Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TallyError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = TallyError::statement_not_found("stm-1234abcd");
        assert_eq!(err.to_string(), "Statement not found: stm-1234abcd");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_reconciliation_predicates() {
        assert!(TallyError::Conflict("open session".into()).is_conflict());
        assert!(TallyError::InvalidState("completed".into()).is_invalid_state());
        assert!(TallyError::Precondition("no balance".into()).is_precondition());
        assert_eq!(
            TallyError::Precondition("actual ending balance not set".into()).to_string(),
            "Precondition failed: actual ending balance not set"
        );
    }

    #[test]
    fn test_from_session_state_error() {
        let err: TallyError = SessionStateError::ActualBalanceUnset.into();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let tally_err: TallyError = io_err.into();
        assert!(matches!(tally_err, TallyError::Io(_)));
    }
}
