//! Catalog validation
//!
//! Checks the structural integrity of a catalog before it is written to the
//! store. Every problem is collected so a single import reports all of them:
//! - duplicate session, room, professor and exam unit identities
//! - exam units referring to unknown sessions
//! - sessions or blackout ranges that end before they start
//! - rooms without seats, empty groups, professors with a zero quota
//! - formations whose exam units disagree on their department

use crate::catalog::Catalog;
use crate::error::{ProctorError, Result};
use crate::types::{DepartmentId, FormationId, SessionId};
use std::collections::{BTreeMap, BTreeSet};

/// Validate a catalog, returning every problem found
pub fn validate_catalog(catalog: &Catalog) -> Result<()> {
    let problems = collect_problems(catalog);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ProctorError::validation_failed(problems))
    }
}

fn collect_problems(catalog: &Catalog) -> Vec<String> {
    let mut problems = Vec::new();

    let mut session_ids = BTreeSet::new();
    for session in &catalog.sessions {
        if !session_ids.insert(session.id) {
            problems.push(format!("duplicate session id {}", session.id));
        }
        if session.start > session.end {
            problems.push(format!(
                "session {} starts on {} after it ends on {}",
                session.id, session.start, session.end
            ));
        }
    }

    let mut room_ids = BTreeSet::new();
    for room in &catalog.rooms {
        if !room_ids.insert(room.id) {
            problems.push(format!("duplicate room id {}", room.id));
        }
        if room.capacity == 0 {
            problems.push(format!("room {} ({}) has zero capacity", room.id, room.name));
        }
    }

    let mut professor_ids = BTreeSet::new();
    for professor in &catalog.professors {
        if !professor_ids.insert(professor.id) {
            problems.push(format!("duplicate professor id {}", professor.id));
        }
        if professor.daily_quota == 0 {
            problems.push(format!(
                "professor {} ({}) has a daily quota of zero",
                professor.id, professor.name
            ));
        }
        for blackout in &professor.blackouts {
            if blackout.start > blackout.end {
                problems.push(format!(
                    "professor {} has a blackout starting on {} after it ends on {}",
                    professor.id, blackout.start, blackout.end
                ));
            }
        }
    }

    let mut exam_keys = BTreeSet::new();
    let mut formation_departments: BTreeMap<(SessionId, FormationId), DepartmentId> =
        BTreeMap::new();
    for exam in &catalog.exam_units {
        if !session_ids.contains(&exam.session) {
            problems.push(format!(
                "exam unit ({}) refers to unknown session {}",
                exam.key(),
                exam.session
            ));
        }
        if !exam_keys.insert((exam.session, exam.key())) {
            problems.push(format!(
                "duplicate exam unit ({}) in session {}",
                exam.key(),
                exam.session
            ));
        }
        if exam.group_size == 0 {
            problems.push(format!("exam unit ({}) has an empty group", exam.key()));
        }
        let department = formation_departments
            .entry((exam.session, exam.formation))
            .or_insert(exam.department);
        if *department != exam.department {
            problems.push(format!(
                "formation {} has exam units in departments {} and {}",
                exam.formation, department, exam.department
            ));
        }
    }

    problems
}
