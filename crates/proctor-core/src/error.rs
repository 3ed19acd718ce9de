// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for catalog and domain operations
#[derive(Error, Debug, Diagnostic)]
pub enum ProctorError {
    /// A single record is malformed
    #[error("Invalid record: {reason}")]
    #[diagnostic(code(proctor::invalid_record), help("{suggestion}"))]
    InvalidRecord {
        #[allow(unused)]
        reason: String,
        #[allow(unused)]
        suggestion: String,
    },

    /// Catalog validation found one or more problems
    #[error("Catalog validation failed with {} problem(s): {}", problems.len(), problems.join("; "))]
    #[diagnostic(
        code(proctor::validation_failed),
        help("Fix the listed records in the catalog file and import it again")
    )]
    ValidationFailed {
        #[allow(unused)]
        problems: Vec<String>,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(proctor::serialization_error),
        help("Ensure the document is valid JSON or YAML and matches the catalog format")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(proctor::internal_error),
        help("This is likely a bug. Please report it with the full error details")
    )]
    InternalError {
        #[allow(unused)]
        message: String,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, ProctorError>;

impl ProctorError {
    /// Create an InvalidRecord error
    pub fn invalid_record(reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a ValidationFailed error
    pub fn validation_failed(problems: Vec<String>) -> Self {
        Self::ValidationFailed { problems }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }

    /// Create an InternalError
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_message() {
        let err = ProctorError::validation_failed(vec![
            "duplicate room id 3".to_string(),
            "room 4 has zero capacity".to_string(),
        ]);
        let message = err.to_string();
        assert!(message.contains("2 problem(s)"));
        assert!(message.contains("duplicate room id 3"));
    }
}
