use crate::conflict::detect_conflicts;
use crate::{AuditError, Result};
use proctor_core::{ConflictKind, ConflictRecord, SessionId};
use proctor_storage::{AssignmentStore, CatalogProvider};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Conflict auditor
///
/// Reads a session's committed assignments, whatever produced them, and
/// replaces the session's conflict records with what it finds.
pub struct Auditor<S> {
    store: Arc<S>,
}

impl<S: CatalogProvider + AssignmentStore> Auditor<S> {
    /// Create a new auditor
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Audit the session and persist the findings
    pub fn audit(&self, session: SessionId) -> Result<Vec<ConflictRecord>> {
        let lock = self.store.session_lock(session);
        let _guard = lock.lock();

        if self.store.session(session)?.is_none() {
            return Err(AuditError::session_not_found(session));
        }

        let assignments = self.store.assignments(session)?;
        let rooms = self.store.rooms()?;
        let professors = self.store.professors()?;
        debug!(
            "Auditing {} assignments of session {}",
            assignments.len(),
            session
        );

        let conflicts = detect_conflicts(session, &assignments, &rooms, &professors);
        self.store.replace_conflicts(session, &conflicts)?;

        if conflicts.is_empty() {
            info!("Session {}: no conflicts", session);
        } else {
            let mut counts: BTreeMap<ConflictKind, usize> = BTreeMap::new();
            for conflict in &conflicts {
                *counts.entry(conflict.kind).or_insert(0) += 1;
            }
            for (kind, count) in &counts {
                warn!("Session {}: {} {} conflict(s)", session, count, kind);
            }
        }

        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proctor_core::{
        Assignment, Catalog, DepartmentId, ExamUnit, FormationId, GroupId, ModuleId, Period,
        Professor, ProfessorId, Room, RoomId, Session, Slot,
    };
    use proctor_storage::Repository;

    fn exam(formation: u32, group: u32) -> ExamUnit {
        ExamUnit {
            session: SessionId(1),
            formation: FormationId(formation),
            department: DepartmentId(1),
            module: ModuleId(1),
            group: GroupId(group),
            group_size: 30,
        }
    }

    fn repository() -> Arc<Repository> {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let repo = Repository::in_memory();
        repo.import_catalog(&Catalog {
            sessions: vec![Session::new(SessionId(1), "January", date, date)],
            rooms: vec![Room::new(RoomId(1), "A", 40)],
            professors: vec![
                Professor::new(ProfessorId(1), "One", DepartmentId(1), 3),
                Professor::new(ProfessorId(2), "Two", DepartmentId(1), 3),
            ],
            exam_units: vec![exam(1, 1), exam(2, 2)],
        })
        .unwrap();
        Arc::new(repo)
    }

    fn slot() -> Slot {
        Slot::new(
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            Period::from_index(0).unwrap(),
        )
    }

    #[test]
    fn test_audit_persists_and_replaces_conflicts() {
        let repo = repository();
        let a = Assignment::new(exam(1, 1), slot(), RoomId(1), ProfessorId(1));
        let b = Assignment::new(exam(2, 2), slot(), RoomId(1), ProfessorId(2));
        repo.put_assignment(&a).unwrap();
        repo.put_assignment(&b).unwrap();

        let auditor = Auditor::new(repo.clone());
        let conflicts = auditor.audit(SessionId(1)).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::RoomDoubleBooked);
        assert_eq!(repo.conflicts(SessionId(1)).unwrap(), conflicts);

        // Move the second sitting to another slot and audit again
        let mut moved = b.clone();
        moved.slot = Slot::new(slot().date, Period::from_index(1).unwrap());
        repo.put_assignment(&moved).unwrap();

        assert!(auditor.audit(SessionId(1)).unwrap().is_empty());
        assert!(repo.conflicts(SessionId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_audit_unknown_session() {
        let auditor = Auditor::new(repository());
        let err = auditor.audit(SessionId(7)).unwrap_err();
        assert!(matches!(err, AuditError::SessionNotFound { .. }));
    }
}
