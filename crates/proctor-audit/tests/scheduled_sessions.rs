use chrono::NaiveDate;
use proctor_audit::{detect_conflicts, Auditor};
use proctor_core::{
    Assignment, BlackoutRange, Catalog, ConflictKind, DepartmentId, ExamUnit, FormationId,
    GroupId, ModuleId, Professor, ProfessorId, Room, RoomCategory, RoomId, Session, SessionId,
};
use proctor_scheduler::{ScheduleStatus, Scheduler, SchedulerConfig};
use proctor_storage::{AssignmentStore, CatalogProvider, RedbBackend, Repository};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tempfile::tempdir;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

/// Two departments, three formations with several modules and groups each
fn faculty() -> Catalog {
    let mut exam_units = Vec::new();
    for (formation, department, groups) in [(1, 1, 3), (2, 1, 2), (3, 2, 2)] {
        for module in 1..=4 {
            for group in 1..=groups {
                exam_units.push(ExamUnit {
                    session: SessionId(1),
                    formation: FormationId(formation),
                    department: DepartmentId(department),
                    module: ModuleId(module),
                    group: GroupId(formation * 10 + group),
                    group_size: 25 + group * 5,
                });
            }
        }
    }

    Catalog {
        sessions: vec![Session::new(SessionId(1), "January", date(6), date(17))],
        rooms: vec![
            Room::new(RoomId(1), "Amphi A", 120).with_category(RoomCategory::Large),
            Room::new(RoomId(2), "S101", 40),
            Room::new(RoomId(3), "S102", 40),
            Room::new(RoomId(4), "S103", 30),
        ],
        professors: vec![
            Professor::new(ProfessorId(1), "Amrani", DepartmentId(1), 2),
            Professor::new(ProfessorId(2), "Belkacem", DepartmentId(1), 2)
                .with_blackout(BlackoutRange::new(date(6), date(8)).unwrap()),
            Professor::new(ProfessorId(3), "Cherif", DepartmentId(1), 1).with_load(5),
            Professor::new(ProfessorId(4), "Djebbar", DepartmentId(2), 3),
            Professor::new(ProfessorId(5), "Haddad", DepartmentId(2), 3),
        ],
        exam_units,
    }
}

fn scheduled_repository() -> Arc<Repository> {
    let repo = Arc::new(Repository::in_memory());
    repo.import_catalog(&faculty()).unwrap();
    let result = Scheduler::new(repo.clone(), SchedulerConfig::default())
        .schedule(SessionId(1))
        .unwrap();
    assert_eq!(result.status, ScheduleStatus::Completed);
    repo
}

#[test]
fn test_scheduled_session_audits_clean() {
    let repo = scheduled_repository();
    let assignments = repo.assignments(SessionId(1)).unwrap();
    assert_eq!(assignments.len(), faculty().exam_units.len());

    let conflicts = Auditor::new(repo.clone()).audit(SessionId(1)).unwrap();
    assert!(conflicts.is_empty(), "unexpected conflicts: {:?}", conflicts);
}

#[test]
fn test_scheduled_session_invariants() {
    let repo = scheduled_repository();
    let assignments = repo.assignments(SessionId(1)).unwrap();
    let rooms: BTreeMap<RoomId, Room> = repo
        .rooms()
        .unwrap()
        .into_iter()
        .map(|room| (room.id, room))
        .collect();
    let professors: BTreeMap<ProfessorId, Professor> = repo
        .professors()
        .unwrap()
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut rooms_at = BTreeSet::new();
    let mut professors_at = BTreeSet::new();
    let mut per_day: BTreeMap<(ProfessorId, NaiveDate), u32> = BTreeMap::new();
    let mut sittings: BTreeMap<_, Vec<&Assignment>> = BTreeMap::new();

    for a in &assignments {
        assert!(rooms[&a.room].capacity >= a.exam.group_size);
        assert!(rooms_at.insert((a.slot, a.room)));
        assert!(professors_at.insert((a.slot, a.professor)));
        assert!(!professors[&a.professor].is_blacked_out(a.slot.date));
        *per_day.entry((a.professor, a.slot.date)).or_insert(0) += 1;
        sittings.entry(a.scheduling_unit()).or_default().push(a);
    }

    for ((professor, _), count) in per_day {
        assert!(count <= professors[&professor].daily_quota);
    }

    for members in sittings.values() {
        let slots: BTreeSet<_> = members.iter().map(|a| a.slot).collect();
        let rooms: BTreeSet<_> = members.iter().map(|a| a.room).collect();
        let professors: BTreeSet<_> = members.iter().map(|a| a.professor).collect();
        assert_eq!(slots.len(), 1);
        assert_eq!(rooms.len(), members.len());
        assert_eq!(professors.len(), members.len());
    }
}

#[test]
fn test_manual_room_clash_is_reported_once() {
    let repo = scheduled_repository();
    let assignments = repo.assignments(SessionId(1)).unwrap();

    // Move one sitting into a room already used by another unit at that slot
    let target = &assignments[0];
    let mut edited = assignments
        .iter()
        .find(|a| a.scheduling_unit() != target.scheduling_unit() && a.slot != target.slot)
        .cloned()
        .unwrap();
    edited.slot = target.slot;
    edited.room = target.room;
    edited.professor = ProfessorId(99);

    // Only the edited assignment and the one it clashes with
    let pair = [target.clone(), edited.clone()];
    let conflicts = detect_conflicts(
        SessionId(1),
        &pair,
        &repo.rooms().unwrap(),
        &repo.professors().unwrap(),
    );
    let room_conflicts: Vec<_> = conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::RoomDoubleBooked)
        .collect();
    assert_eq!(room_conflicts.len(), 1);
    assert!(room_conflicts[0].involves(target.id));
    assert!(room_conflicts[0].involves(edited.id));

    repo.put_assignment(&edited).unwrap();
    let conflicts = Auditor::new(repo.clone()).audit(SessionId(1)).unwrap();
    assert_eq!(
        conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::RoomDoubleBooked)
            .count(),
        1
    );
    assert!(conflicts
        .iter()
        .any(|c| c.kind == ConflictKind::DanglingReference && c.involves(edited.id)));
    assert_eq!(repo.conflicts(SessionId(1)).unwrap().len(), conflicts.len());
}

#[test]
fn test_rescheduling_is_deterministic_on_redb() {
    let first = {
        let dir = tempdir().unwrap();
        let kv = Arc::new(RedbBackend::new(dir.path().join("first.redb")).unwrap());
        let repo = Arc::new(Repository::new(kv));
        repo.import_catalog(&faculty()).unwrap();
        Scheduler::new(repo, SchedulerConfig::default())
            .schedule(SessionId(1))
            .unwrap()
    };
    let second = {
        let repo = Arc::new(Repository::in_memory());
        repo.import_catalog(&faculty()).unwrap();
        Scheduler::new(repo, SchedulerConfig::default())
            .schedule(SessionId(1))
            .unwrap()
    };

    let placements = |assignments: &[Assignment]| -> BTreeSet<_> {
        assignments.iter().map(|a| a.placement()).collect()
    };
    assert_eq!(
        placements(&first.assignments),
        placements(&second.assignments)
    );
}
