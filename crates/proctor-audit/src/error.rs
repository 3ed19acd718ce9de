// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use proctor_core::SessionId;
use thiserror::Error;

/// Audit error type
///
/// Finding conflicts is a successful audit; these are the cases where no
/// audit could be made.
#[derive(Error, Debug, Diagnostic)]
pub enum AuditError {
    /// Session not found
    #[error("Session not found: {session}")]
    #[diagnostic(
        code(audit::session_not_found),
        help("Import the session with `proctor import` before auditing it")
    )]
    SessionNotFound { session: SessionId },

    /// Storage error
    #[error("Storage error: {0}")]
    #[diagnostic(
        code(audit::storage_error),
        help("Check the underlying storage system; previous conflict records were left in place")
    )]
    StorageError(#[from] proctor_storage::StorageError),
}

/// Result type for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

impl AuditError {
    /// Create a SessionNotFound error
    pub fn session_not_found(session: SessionId) -> Self {
        Self::SessionNotFound { session }
    }
}
