use crate::calendar::Slot;
use crate::catalog::ExamUnit;
use crate::types::{
    AssignmentId, ConflictId, ExamUnitKey, ProfessorId, RoomId, SchedulingUnitKey, SessionId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an exam unit sits: the part of an assignment the engine decides
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub exam: ExamUnitKey,
    pub slot: Slot,
    pub room: RoomId,
    pub professor: ProfessorId,
}

/// A committed placement of an exam unit into a slot, room and professor
///
/// The exam unit is stored alongside the placement so the set can be audited
/// without the pending list it was planned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub session: SessionId,
    pub exam: ExamUnit,
    pub slot: Slot,
    pub room: RoomId,
    pub professor: ProfessorId,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(exam: ExamUnit, slot: Slot, room: RoomId, professor: ProfessorId) -> Self {
        Self {
            id: AssignmentId::generate(),
            session: exam.session,
            exam,
            slot,
            room,
            professor,
            created_at: Utc::now(),
        }
    }

    pub fn placement(&self) -> Placement {
        Placement {
            exam: self.exam.key(),
            slot: self.slot,
            room: self.room,
            professor: self.professor,
        }
    }

    pub fn scheduling_unit(&self) -> SchedulingUnitKey {
        self.exam.scheduling_unit()
    }
}

/// Kind of violation found by the auditor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// One professor supervises two exams at the same slot
    ProfessorDoubleBooked,
    /// One room hosts two exams of different scheduling units at the same slot
    RoomDoubleBooked,
    /// One group sits two exams at the same slot
    GroupDoubleBooked,
    /// Two groups of the same sitting share a room
    DuplicateRoomInSitting,
    /// The groups of one scheduling unit are spread over several slots
    SplitSitting,
    /// The room has fewer seats than the group
    CapacityExceeded,
    /// A professor supervises more exams on a date than their daily quota
    QuotaExceeded,
    /// A professor supervises on a date they declared unavailable
    ProfessorUnavailable,
    /// A professor supervises an exam of another department
    DepartmentMismatch,
    /// The assignment names a room or professor missing from the catalog
    DanglingReference,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::ProfessorDoubleBooked => "professor_double_booked",
            ConflictKind::RoomDoubleBooked => "room_double_booked",
            ConflictKind::GroupDoubleBooked => "group_double_booked",
            ConflictKind::DuplicateRoomInSitting => "duplicate_room_in_sitting",
            ConflictKind::SplitSitting => "split_sitting",
            ConflictKind::CapacityExceeded => "capacity_exceeded",
            ConflictKind::QuotaExceeded => "quota_exceeded",
            ConflictKind::ProfessorUnavailable => "professor_unavailable",
            ConflictKind::DepartmentMismatch => "department_mismatch",
            ConflictKind::DanglingReference => "dangling_reference",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violation of a scheduling invariant, with the assignments involved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub id: ConflictId,
    pub session: SessionId,
    pub kind: ConflictKind,
    pub assignments: Vec<AssignmentId>,
    pub explanation: String,
    pub detected_at: DateTime<Utc>,
}

impl ConflictRecord {
    pub fn new(
        session: SessionId,
        kind: ConflictKind,
        assignments: Vec<AssignmentId>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id: ConflictId::generate(),
            session,
            kind,
            assignments,
            explanation: explanation.into(),
            detected_at: Utc::now(),
        }
    }

    /// Whether this record names the assignment
    pub fn involves(&self, id: AssignmentId) -> bool {
        self.assignments.contains(&id)
    }
}

impl fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.explanation)
    }
}
