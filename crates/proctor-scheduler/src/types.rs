use proctor_core::{
    Assignment, DepartmentId, ExamUnit, ExamUnitKey, SchedulingUnitKey, SessionId,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Exam units of one (formation, module) that must sit together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingUnit {
    pub key: SchedulingUnitKey,
    /// Members in group order
    pub members: Vec<ExamUnit>,
}

impl SchedulingUnit {
    pub fn new(key: SchedulingUnitKey, mut members: Vec<ExamUnit>) -> Self {
        members.sort_by_key(|exam| exam.key());
        Self { key, members }
    }
}

/// Why an exam unit was left unscheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnscheduledReason {
    /// No room in the catalog can seat the group
    NoRoomOfSufficientCapacity {
        group_size: u32,
        largest_room: Option<u32>,
    },
    /// The catalog has no professor in the exam's department
    NoProfessorInDepartment { department: DepartmentId },
    /// Every fitting room was taken at each tried slot
    NoFreeRoom,
    /// No eligible professor was free at each tried slot
    NoAvailableProfessor,
    /// The group already sits another exam on each tried date
    GroupBusy,
    /// Another group of the same sitting could not be placed
    BlockedBySibling,
    /// The session has no business days
    EmptyCalendar,
    /// The unit's committed sitting lies outside the session calendar
    SittingOutsideCalendar,
    /// The run deadline passed before this unit was tried
    DeadlineExceeded,
}

impl fmt::Display for UnscheduledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnscheduledReason::NoRoomOfSufficientCapacity { .. } => {
                write!(f, "no room of sufficient capacity")
            }
            UnscheduledReason::NoProfessorInDepartment { department } => {
                write!(f, "no professor in department {}", department)
            }
            UnscheduledReason::NoFreeRoom => write!(f, "no free room of sufficient capacity"),
            UnscheduledReason::NoAvailableProfessor => write!(f, "no eligible professor available"),
            UnscheduledReason::GroupBusy => write!(f, "no free slot for required groups"),
            UnscheduledReason::BlockedBySibling => {
                write!(f, "co-sitting partner could not be placed")
            }
            UnscheduledReason::EmptyCalendar => write!(f, "session has no schedulable slots"),
            UnscheduledReason::SittingOutsideCalendar => {
                write!(f, "committed sitting lies outside the session calendar")
            }
            UnscheduledReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// An exam unit the engine could not place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledUnit {
    pub exam: ExamUnitKey,
    pub group_size: u32,
    pub reason: UnscheduledReason,
    /// Human-readable form of `reason`
    pub explanation: String,
}

impl UnscheduledUnit {
    pub fn new(exam: &ExamUnit, reason: UnscheduledReason) -> Self {
        Self {
            exam: exam.key(),
            group_size: exam.group_size,
            reason,
            explanation: reason.to_string(),
        }
    }
}

/// Terminal state of a scheduling run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Every pending unit was placed
    Completed,
    /// Some pending units were left unscheduled
    Partial,
    /// The session had no pending units
    NothingPending,
    /// The session does not exist
    SessionNotFound,
    /// The catalog has no rooms or no professors
    EmptyCatalog,
}

/// Outcome of [`crate::Scheduler::schedule`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub session: SessionId,
    pub status: ScheduleStatus,
    pub assignments_created: usize,
    pub assignments: Vec<Assignment>,
    pub unscheduled: Vec<UnscheduledUnit>,
    pub elapsed: Duration,
}

impl SchedulingResult {
    /// A result with nothing placed and nothing reported
    pub fn empty(session: SessionId, status: ScheduleStatus, elapsed: Duration) -> Self {
        Self {
            session,
            status,
            assignments_created: 0,
            assignments: Vec::new(),
            unscheduled: Vec::new(),
            elapsed,
        }
    }
}

/// Result of checking one candidate against one filter
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Whether the candidate passed the filter
    pub passed: bool,
    /// Reason for failure (if any)
    pub reason: Option<String>,
}

impl FilterResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::{FormationId, GroupId, ModuleId};

    fn exam(group: u32) -> ExamUnit {
        ExamUnit {
            session: SessionId(1),
            formation: FormationId(1),
            department: DepartmentId(1),
            module: ModuleId(1),
            group: GroupId(group),
            group_size: 30,
        }
    }

    #[test]
    fn test_scheduling_unit_orders_members() {
        let unit = SchedulingUnit::new(
            SchedulingUnitKey::new(FormationId(1), ModuleId(1)),
            vec![exam(3), exam(1), exam(2)],
        );
        let groups: Vec<_> = unit.members.iter().map(|e| e.group.get()).collect();
        assert_eq!(groups, vec![1, 2, 3]);
    }

    #[test]
    fn test_unscheduled_reason_text() {
        let reason = UnscheduledReason::NoRoomOfSufficientCapacity {
            group_size: 120,
            largest_room: Some(60),
        };
        let unit = UnscheduledUnit::new(&exam(1), reason);
        assert_eq!(unit.explanation, "no room of sufficient capacity");

        let json = serde_json::to_value(&unit).unwrap();
        assert_eq!(json["reason"]["kind"], "no_room_of_sufficient_capacity");
        assert_eq!(json["reason"]["largest_room"], 60);
    }

    #[test]
    fn test_filter_result() {
        let pass = FilterResult::pass();
        assert!(pass.passed);
        assert!(pass.reason.is_none());

        let fail = FilterResult::fail("Blacked out");
        assert!(!fail.passed);
        assert_eq!(fail.reason, Some("Blacked out".to_string()));
    }
}
