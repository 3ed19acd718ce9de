// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
///
/// Infeasible units are not errors; they are reported in the scheduling
/// result. Only failures that abort a run end up here.
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// Storage error
    #[error("Storage error: {0}")]
    #[diagnostic(
        code(scheduler::storage_error),
        help("The run was aborted and nothing from it was persisted; retry once storage is healthy")
    )]
    StorageError(#[from] proctor_storage::StorageError),

    /// Internal error
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(scheduler::internal_error),
        help("This is likely a bug. Please report it")
    )]
    InternalError { message: String },
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create an InternalError
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}
