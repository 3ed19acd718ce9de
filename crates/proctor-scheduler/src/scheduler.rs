use crate::engine::{pending_exam_units, Engine, PlanInput};
use crate::types::{ScheduleStatus, SchedulingResult};
use crate::{Result, SchedulerError};
use proctor_core::{Assignment, ExamUnit, ExamUnitKey, SessionId};
use proctor_storage::{AssignmentStore, CatalogProvider};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for the scheduler
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Stop trying new units once a run has taken this long
    pub deadline: Option<Duration>,
}

/// Exam session scheduler
///
/// Loads a session's catalog and committed assignments from the store,
/// plans the pending exam units and appends the new assignments in one
/// transaction.
pub struct Scheduler<S> {
    store: Arc<S>,
    config: SchedulerConfig,
    engine: Engine,
}

impl<S: CatalogProvider + AssignmentStore> Scheduler<S> {
    /// Create a new scheduler
    pub fn new(store: Arc<S>, config: SchedulerConfig) -> Self {
        Self {
            store,
            config,
            engine: Engine::new(),
        }
    }

    /// Plan every pending exam unit of the session
    ///
    /// Runs on the same session are serialized through the store's session
    /// lock. On a storage error nothing from this run is persisted.
    pub fn schedule(&self, session_id: SessionId) -> Result<SchedulingResult> {
        let started = Instant::now();
        let lock = self.store.session_lock(session_id);
        let _guard = lock.lock();

        info!("Scheduling session {}", session_id);

        let Some(session) = self.store.session(session_id)? else {
            warn!("Session {} not found", session_id);
            return Ok(SchedulingResult::empty(
                session_id,
                ScheduleStatus::SessionNotFound,
                started.elapsed(),
            ));
        };

        let exam_units = self.store.exam_units(session_id)?;
        let committed = self.store.assignments(session_id)?;
        let pending = pending_exam_units(&exam_units, &committed);

        if pending.is_empty() {
            debug!("No pending exam units in session {}", session_id);
            return Ok(SchedulingResult::empty(
                session_id,
                ScheduleStatus::NothingPending,
                started.elapsed(),
            ));
        }

        let rooms = self.store.rooms()?;
        let professors = self.store.professors()?;
        if rooms.is_empty() || professors.is_empty() {
            warn!(
                "Catalog has {} rooms and {} professors; nothing can be placed",
                rooms.len(),
                professors.len()
            );
        }

        info!(
            "Session {}: {} pending exam units, {} already committed",
            session_id,
            pending.len(),
            committed.len()
        );

        let input = PlanInput {
            session: &session,
            rooms: &rooms,
            professors: &professors,
            pending: &pending,
            committed: &committed,
        };
        let deadline = self.config.deadline.map(|limit| started + limit);
        let plan = self.engine.plan(&input, deadline);

        let by_key: BTreeMap<ExamUnitKey, &ExamUnit> =
            pending.iter().map(|exam| (exam.key(), exam)).collect();
        let assignments = plan
            .placements
            .iter()
            .map(|placement| {
                by_key
                    .get(&placement.exam)
                    .map(|exam| {
                        Assignment::new(
                            (*exam).clone(),
                            placement.slot,
                            placement.room,
                            placement.professor,
                        )
                    })
                    .ok_or_else(|| {
                        SchedulerError::internal_error(format!(
                            "Placement for unknown exam unit {}",
                            placement.exam
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        self.store.commit_assignments(session_id, &assignments)?;

        let status = if rooms.is_empty() || professors.is_empty() {
            ScheduleStatus::EmptyCatalog
        } else if plan.unscheduled.is_empty() {
            ScheduleStatus::Completed
        } else {
            ScheduleStatus::Partial
        };

        let elapsed = started.elapsed();
        info!(
            "Session {}: placed {} exam units, {} unscheduled in {:?}",
            session_id,
            assignments.len(),
            plan.unscheduled.len(),
            elapsed
        );

        Ok(SchedulingResult {
            session: session_id,
            status,
            assignments_created: assignments.len(),
            assignments,
            unscheduled: plan.unscheduled,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnscheduledReason;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use proctor_core::{
        Catalog, ConflictRecord, DepartmentId, FormationId, GroupId, ModuleId, Placement,
        Professor, ProfessorId, Room, RoomId, Session,
    };
    use proctor_storage::{RedbBackend, Repository, StorageError};
    use std::collections::BTreeSet;
    use std::thread;
    use tempfile::tempdir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn exam(formation: u32, group: u32, department: u32, size: u32) -> ExamUnit {
        ExamUnit {
            session: SessionId(1),
            formation: FormationId(formation),
            department: DepartmentId(department),
            module: ModuleId(1),
            group: GroupId(group),
            group_size: size,
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            sessions: vec![Session::new(SessionId(1), "January", date(6), date(10))],
            rooms: vec![
                Room::new(RoomId(1), "R50", 50),
                Room::new(RoomId(2), "R45", 45),
                Room::new(RoomId(3), "R30", 30),
            ],
            professors: vec![
                Professor::new(ProfessorId(1), "P1", DepartmentId(1), 3),
                Professor::new(ProfessorId(2), "P2", DepartmentId(1), 3),
                Professor::new(ProfessorId(3), "P3", DepartmentId(2), 3),
                Professor::new(ProfessorId(4), "P4", DepartmentId(2), 3),
            ],
            exam_units: vec![
                exam(1, 1, 1, 40),
                exam(1, 2, 1, 40),
                exam(2, 3, 2, 40),
                exam(2, 4, 2, 40),
            ],
        }
    }

    fn scheduler_with(catalog: &Catalog) -> (Arc<Repository>, Scheduler<Repository>) {
        let repo = Arc::new(Repository::in_memory());
        repo.import_catalog(catalog).unwrap();
        let scheduler = Scheduler::new(repo.clone(), SchedulerConfig::default());
        (repo, scheduler)
    }

    fn placements(assignments: &[Assignment]) -> BTreeSet<Placement> {
        assignments.iter().map(|a| a.placement()).collect()
    }

    #[test]
    fn test_schedule_session() {
        let (repo, scheduler) = scheduler_with(&catalog());
        let result = scheduler.schedule(SessionId(1)).unwrap();

        assert_eq!(result.status, ScheduleStatus::Completed);
        assert_eq!(result.assignments_created, 4);
        assert!(result.unscheduled.is_empty());

        let stored = repo.assignments(SessionId(1)).unwrap();
        assert_eq!(placements(&stored), placements(&result.assignments));
        let capacity: BTreeMap<RoomId, u32> = catalog()
            .rooms
            .iter()
            .map(|room| (room.id, room.capacity))
            .collect();
        assert!(stored
            .iter()
            .all(|a| capacity[&a.room] >= a.exam.group_size));
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let (_, first) = scheduler_with(&catalog());
        let (_, second) = scheduler_with(&catalog());

        let a = first.schedule(SessionId(1)).unwrap();
        let b = second.schedule(SessionId(1)).unwrap();
        assert_eq!(placements(&a.assignments), placements(&b.assignments));
    }

    #[test]
    fn test_second_run_has_nothing_pending() {
        let (repo, scheduler) = scheduler_with(&catalog());
        scheduler.schedule(SessionId(1)).unwrap();
        let result = scheduler.schedule(SessionId(1)).unwrap();

        assert_eq!(result.status, ScheduleStatus::NothingPending);
        assert_eq!(result.assignments_created, 0);
        assert_eq!(repo.assignments(SessionId(1)).unwrap().len(), 4);
    }

    #[test]
    fn test_unknown_session() {
        let (_, scheduler) = scheduler_with(&catalog());
        let result = scheduler.schedule(SessionId(99)).unwrap();
        assert_eq!(result.status, ScheduleStatus::SessionNotFound);
        assert_eq!(result.assignments_created, 0);
    }

    #[test]
    fn test_empty_catalog_is_reported_not_raised() {
        let mut catalog = catalog();
        catalog.rooms.clear();
        let (repo, scheduler) = scheduler_with(&catalog);
        let result = scheduler.schedule(SessionId(1)).unwrap();

        assert_eq!(result.status, ScheduleStatus::EmptyCatalog);
        assert_eq!(result.unscheduled.len(), 4);
        assert!(repo.assignments(SessionId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_group_is_partial() {
        let mut catalog = catalog();
        catalog.exam_units.push(ExamUnit {
            module: ModuleId(2),
            ..exam(1, 5, 1, 120)
        });
        let (_, scheduler) = scheduler_with(&catalog);
        let result = scheduler.schedule(SessionId(1)).unwrap();

        assert_eq!(result.status, ScheduleStatus::Partial);
        assert_eq!(result.assignments_created, 4);
        assert_eq!(result.unscheduled.len(), 1);
        assert!(matches!(
            result.unscheduled[0].reason,
            UnscheduledReason::NoRoomOfSufficientCapacity { group_size: 120, .. }
        ));
    }

    #[test]
    fn test_rerun_after_quota_change_keeps_committed() {
        let (repo, scheduler) = scheduler_with(&catalog());
        let first = scheduler.schedule(SessionId(1)).unwrap();
        let before = repo.assignments(SessionId(1)).unwrap();

        // Professor 1 is now over quota on the date of their supervision
        let mut tired = catalog().professors[0].clone();
        tired.daily_quota = 0;
        repo.put_professor(&tired).unwrap();
        repo.put_exam_unit(&ExamUnit {
            module: ModuleId(2),
            ..exam(1, 1, 1, 40)
        })
        .unwrap();

        let second = scheduler.schedule(SessionId(1)).unwrap();
        assert_eq!(second.assignments_created, 1);
        assert_ne!(second.assignments[0].professor, ProfessorId(1));

        let after = repo.assignments(SessionId(1)).unwrap();
        assert_eq!(after.len(), before.len() + 1);
        for assignment in &before {
            assert!(after.contains(assignment));
        }
        assert_eq!(first.assignments_created, 4);
    }

    #[test]
    fn test_expired_deadline_places_nothing() {
        let repo = Arc::new(Repository::in_memory());
        repo.import_catalog(&catalog()).unwrap();
        let config = SchedulerConfig {
            deadline: Some(Duration::ZERO),
        };
        let scheduler = Scheduler::new(repo.clone(), config);
        let result = scheduler.schedule(SessionId(1)).unwrap();

        assert_eq!(result.status, ScheduleStatus::Partial);
        assert!(result
            .unscheduled
            .iter()
            .all(|u| u.reason == UnscheduledReason::DeadlineExceeded));
        assert!(repo.assignments(SessionId(1)).unwrap().is_empty());
    }

    /// Store whose assignment writes always fail
    struct FailingCommits(Repository);

    impl CatalogProvider for FailingCommits {
        fn session(&self, id: SessionId) -> proctor_storage::Result<Option<Session>> {
            self.0.session(id)
        }
        fn sessions(&self) -> proctor_storage::Result<Vec<Session>> {
            self.0.sessions()
        }
        fn rooms(&self) -> proctor_storage::Result<Vec<Room>> {
            self.0.rooms()
        }
        fn professors(&self) -> proctor_storage::Result<Vec<Professor>> {
            self.0.professors()
        }
        fn exam_units(&self, session: SessionId) -> proctor_storage::Result<Vec<ExamUnit>> {
            self.0.exam_units(session)
        }
    }

    impl AssignmentStore for FailingCommits {
        fn assignments(&self, session: SessionId) -> proctor_storage::Result<Vec<Assignment>> {
            self.0.assignments(session)
        }
        fn commit_assignments(
            &self,
            _session: SessionId,
            _assignments: &[Assignment],
        ) -> proctor_storage::Result<()> {
            Err(StorageError::transaction_error("disk full"))
        }
        fn conflicts(&self, session: SessionId) -> proctor_storage::Result<Vec<ConflictRecord>> {
            self.0.conflicts(session)
        }
        fn replace_conflicts(
            &self,
            session: SessionId,
            conflicts: &[ConflictRecord],
        ) -> proctor_storage::Result<()> {
            self.0.replace_conflicts(session, conflicts)
        }
        fn session_lock(&self, session: SessionId) -> Arc<Mutex<()>> {
            self.0.session_lock(session)
        }
    }

    #[test]
    fn test_storage_error_aborts_run() {
        let repo = Repository::in_memory();
        repo.import_catalog(&catalog()).unwrap();
        let store = Arc::new(FailingCommits(repo));
        let scheduler = Scheduler::new(store.clone(), SchedulerConfig::default());

        let err = scheduler.schedule(SessionId(1)).unwrap_err();
        assert!(matches!(err, SchedulerError::StorageError(_)));
        assert!(store.assignments(SessionId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_runs_on_one_session_do_not_double_book() {
        let (repo, _) = scheduler_with(&catalog());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = repo.clone();
                thread::spawn(move || {
                    Scheduler::new(repo, SchedulerConfig::default())
                        .schedule(SessionId(1))
                        .unwrap()
                        .assignments_created
                })
            })
            .collect();

        let created: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(created, 4);
        assert_eq!(repo.assignments(SessionId(1)).unwrap().len(), 4);
    }

    #[test]
    fn test_schedule_over_redb() {
        let dir = tempdir().unwrap();
        let kv = Arc::new(RedbBackend::new(dir.path().join("proctor.redb")).unwrap());
        let repo = Arc::new(Repository::new(kv));
        repo.import_catalog(&catalog()).unwrap();

        let scheduler = Scheduler::new(repo.clone(), SchedulerConfig::default());
        let result = scheduler.schedule(SessionId(1)).unwrap();
        assert_eq!(result.assignments_created, 4);
        assert_eq!(repo.assignments(SessionId(1)).unwrap().len(), 4);
    }
}
