use crate::Result;
use parking_lot::Mutex;
use proctor_core::{Assignment, ConflictRecord, ExamUnit, Professor, Room, Session, SessionId};
use std::sync::Arc;

/// Read-only access to the domain catalog
///
/// Implementations are treated as synchronous, retryable I/O boundaries.
pub trait CatalogProvider: Send + Sync {
    /// Get a session by id
    fn session(&self, id: SessionId) -> Result<Option<Session>>;

    /// All sessions, ordered by id
    fn sessions(&self) -> Result<Vec<Session>>;

    /// The full room catalog
    fn rooms(&self) -> Result<Vec<Room>>;

    /// The full professor catalog, with current load counts
    fn professors(&self) -> Result<Vec<Professor>>;

    /// Every exam unit registered for the session, scheduled or not
    fn exam_units(&self, session: SessionId) -> Result<Vec<ExamUnit>>;
}

/// Persistence for committed assignments and audit findings
pub trait AssignmentStore: Send + Sync {
    /// Assignments committed for the session
    fn assignments(&self, session: SessionId) -> Result<Vec<Assignment>>;

    /// Append assignments to the session in one transaction
    ///
    /// Either every assignment is written or none is. Existing assignments
    /// are never rewritten.
    fn commit_assignments(&self, session: SessionId, assignments: &[Assignment]) -> Result<()>;

    /// Conflict records from the session's latest audit
    fn conflicts(&self, session: SessionId) -> Result<Vec<ConflictRecord>>;

    /// Replace the session's conflict records in one transaction
    fn replace_conflicts(&self, session: SessionId, conflicts: &[ConflictRecord]) -> Result<()>;

    /// Lock serializing planning runs on one session
    ///
    /// Every call for the same session returns the same mutex.
    fn session_lock(&self, session: SessionId) -> Arc<Mutex<()>>;
}
