use crate::occupancy::OccupancyState;
use crate::types::FilterResult;
use proctor_core::{ExamUnit, Professor, ProfessorId, Room, RoomId, Slot};
use std::collections::BTreeSet;

/// What a candidate is checked against: one exam unit at one slot
pub struct CandidateContext<'a> {
    pub exam: &'a ExamUnit,
    pub slot: Slot,
    pub occupancy: &'a OccupancyState,
    /// Rooms already reserved by the sitting being assembled
    pub reserved_rooms: &'a BTreeSet<RoomId>,
    /// Professors already reserved by the sitting being assembled
    pub reserved_professors: &'a BTreeSet<ProfessorId>,
}

/// Filter predicate for supervising professors
pub trait ProfessorFilter: Send + Sync {
    /// Check a professor for the exam unit in the context
    fn filter(&self, context: &CandidateContext<'_>, professor: &Professor) -> FilterResult;

    /// Name of the filter
    fn name(&self) -> &str;
}

/// Professors only supervise exams of their own department
pub struct DepartmentMatch;

impl ProfessorFilter for DepartmentMatch {
    fn filter(&self, context: &CandidateContext<'_>, professor: &Professor) -> FilterResult {
        if professor.department == context.exam.department {
            FilterResult::pass()
        } else {
            FilterResult::fail(format!(
                "Department {} does not match exam department {}",
                professor.department, context.exam.department
            ))
        }
    }

    fn name(&self) -> &str {
        "DepartmentMatch"
    }
}

/// A professor supervises at most one group of a sitting
pub struct NotInSitting;

impl ProfessorFilter for NotInSitting {
    fn filter(&self, context: &CandidateContext<'_>, professor: &Professor) -> FilterResult {
        if context.reserved_professors.contains(&professor.id) {
            FilterResult::fail("Already supervising another group of this sitting")
        } else {
            FilterResult::pass()
        }
    }

    fn name(&self) -> &str {
        "NotInSitting"
    }
}

pub struct NotBlackedOut;

impl ProfessorFilter for NotBlackedOut {
    fn filter(&self, context: &CandidateContext<'_>, professor: &Professor) -> FilterResult {
        if professor.is_blacked_out(context.slot.date) {
            FilterResult::fail(format!("Unavailable on {}", context.slot.date))
        } else {
            FilterResult::pass()
        }
    }

    fn name(&self) -> &str {
        "NotBlackedOut"
    }
}

pub struct UnderDailyQuota;

impl ProfessorFilter for UnderDailyQuota {
    fn filter(&self, context: &CandidateContext<'_>, professor: &Professor) -> FilterResult {
        let count = context
            .occupancy
            .supervisions_on(context.slot.date, professor.id);
        if count < professor.daily_quota {
            FilterResult::pass()
        } else {
            FilterResult::fail(format!(
                "Daily quota reached: {} of {} on {}",
                count, professor.daily_quota, context.slot.date
            ))
        }
    }

    fn name(&self) -> &str {
        "UnderDailyQuota"
    }
}

/// The professor supervises nothing else at this exact slot
pub struct FreeAtSlot;

impl ProfessorFilter for FreeAtSlot {
    fn filter(&self, context: &CandidateContext<'_>, professor: &Professor) -> FilterResult {
        if context.occupancy.professor_free(context.slot, professor.id) {
            FilterResult::pass()
        } else {
            FilterResult::fail(format!("Already supervising at {}", context.slot))
        }
    }

    fn name(&self) -> &str {
        "FreeAtSlot"
    }
}

/// Get the default set of professor filters
pub fn default_filters() -> Vec<Box<dyn ProfessorFilter>> {
    vec![
        Box::new(DepartmentMatch),
        Box::new(NotInSitting),
        Box::new(NotBlackedOut),
        Box::new(UnderDailyQuota),
        Box::new(FreeAtSlot),
    ]
}

/// Check whether a room can host the exam unit in the context
pub fn room_available(context: &CandidateContext<'_>, room: &Room) -> FilterResult {
    if !room.fits(context.exam.group_size) {
        return FilterResult::fail(format!(
            "Capacity {} below group size {}",
            room.capacity, context.exam.group_size
        ));
    }
    if context.reserved_rooms.contains(&room.id) {
        return FilterResult::fail("Reserved by another group of this sitting");
    }
    if !context.occupancy.room_free(context.slot, room.id) {
        return FilterResult::fail(format!("Occupied at {}", context.slot));
    }
    FilterResult::pass()
}
