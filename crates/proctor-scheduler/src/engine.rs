use crate::filter::{default_filters, room_available, CandidateContext, ProfessorFilter};
use crate::occupancy::OccupancyState;
use crate::rank::{rank_professors, rank_rooms};
use crate::types::{SchedulingUnit, UnscheduledReason, UnscheduledUnit};
use proctor_core::{
    Assignment, ExamUnit, ExamUnitKey, Placement, Professor, Room, SchedulingUnitKey, Session,
    Slot,
};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Everything one planning run reads
pub struct PlanInput<'a> {
    pub session: &'a Session,
    pub rooms: &'a [Room],
    pub professors: &'a [Professor],
    /// Exam units without a committed assignment
    pub pending: &'a [ExamUnit],
    /// Assignments already committed for the session
    pub committed: &'a [Assignment],
}

/// Outcome of a planning run, before anything is persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub placements: Vec<Placement>,
    pub unscheduled: Vec<UnscheduledUnit>,
}

enum UnitOutcome {
    Placed(Vec<Placement>),
    Unscheduled(Vec<UnscheduledUnit>),
}

/// Exam units that have no committed assignment yet
pub fn pending_exam_units(exam_units: &[ExamUnit], committed: &[Assignment]) -> Vec<ExamUnit> {
    let placed: BTreeSet<ExamUnitKey> = committed.iter().map(|a| a.exam.key()).collect();
    exam_units
        .iter()
        .filter(|exam| !placed.contains(&exam.key()))
        .cloned()
        .collect()
}

/// Group exam units into scheduling units, ordered by (formation, module)
pub fn scheduling_units(exam_units: &[ExamUnit]) -> Vec<SchedulingUnit> {
    let mut grouped: BTreeMap<SchedulingUnitKey, Vec<ExamUnit>> = BTreeMap::new();
    for exam in exam_units {
        grouped
            .entry(exam.scheduling_unit())
            .or_default()
            .push(exam.clone());
    }
    grouped
        .into_iter()
        .map(|(key, members)| SchedulingUnit::new(key, members))
        .collect()
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

fn report_all(unit: &SchedulingUnit, reason: UnscheduledReason) -> Vec<UnscheduledUnit> {
    unit.members
        .iter()
        .map(|exam| UnscheduledUnit::new(exam, reason))
        .collect()
}

/// Greedy planner
///
/// Visits scheduling units in (formation, module) order and places each one
/// at the first slot where every member gets a room and a professor. A
/// sitting is committed whole or not at all; rooms are tried largest first
/// and professors least loaded first, so the same input always yields the
/// same plan.
pub struct Engine {
    filters: Vec<Box<dyn ProfessorFilter>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_filters(default_filters())
    }

    pub fn with_filters(filters: Vec<Box<dyn ProfessorFilter>>) -> Self {
        Self { filters }
    }

    /// Plan every pending unit of the session
    ///
    /// Units still waiting when `deadline` passes are reported with
    /// [`UnscheduledReason::DeadlineExceeded`].
    pub fn plan(&self, input: &PlanInput<'_>, deadline: Option<Instant>) -> Plan {
        let rooms = rank_rooms(input.rooms);
        let mut occupancy = OccupancyState::from_assignments(input.committed);
        let mut plan = Plan::default();

        for unit in scheduling_units(input.pending) {
            if expired(deadline) {
                plan.unscheduled
                    .extend(report_all(&unit, UnscheduledReason::DeadlineExceeded));
                continue;
            }

            match self.place_unit(input, &unit, &rooms, &mut occupancy, deadline) {
                UnitOutcome::Placed(placements) => plan.placements.extend(placements),
                UnitOutcome::Unscheduled(reports) => {
                    debug!(
                        "Could not place {} ({} group(s))",
                        unit.key,
                        unit.members.len()
                    );
                    plan.unscheduled.extend(reports);
                }
            }
        }

        plan
    }

    fn place_unit(
        &self,
        input: &PlanInput<'_>,
        unit: &SchedulingUnit,
        rooms: &[&Room],
        occupancy: &mut OccupancyState,
        deadline: Option<Instant>,
    ) -> UnitOutcome {
        if let Some(reports) = precheck(unit, rooms, input.professors) {
            return UnitOutcome::Unscheduled(reports);
        }

        // A unit with committed sittings is only tried where it already sits
        let calendar = input.session.calendar();
        let joining: Option<Vec<Slot>> = occupancy
            .unit_slots(unit.key)
            .map(|slots| slots.iter().copied().collect());
        let slots: Vec<Slot> = match &joining {
            Some(slots) => slots
                .iter()
                .filter(|slot| calendar.contains(slot))
                .copied()
                .collect(),
            None => calendar.slots().collect(),
        };
        if slots.is_empty() {
            let reason = match &joining {
                Some(_) if !calendar.is_empty() => UnscheduledReason::SittingOutsideCalendar,
                _ => UnscheduledReason::EmptyCalendar,
            };
            return UnitOutcome::Unscheduled(report_all(unit, reason));
        }

        let professors = rank_professors(input.professors, occupancy);
        let mut failures: BTreeMap<ExamUnitKey, BTreeMap<UnscheduledReason, usize>> =
            BTreeMap::new();
        let mut fail = |exam: ExamUnitKey, reason: UnscheduledReason| {
            *failures
                .entry(exam)
                .or_default()
                .entry(reason)
                .or_insert(0) += 1;
        };

        for slot in slots {
            if expired(deadline) {
                return UnitOutcome::Unscheduled(report_all(
                    unit,
                    UnscheduledReason::DeadlineExceeded,
                ));
            }
            if joining.is_none() && occupancy.unit_placed_at(unit.key, slot) {
                continue;
            }

            let busy: Vec<&ExamUnit> = unit
                .members
                .iter()
                .filter(|exam| occupancy.group_busy_on(slot.date, exam.group))
                .collect();
            if !busy.is_empty() {
                trace!(
                    "{} deferred at {}: {} group(s) already sitting on {}",
                    unit.key,
                    slot,
                    busy.len(),
                    slot.date
                );
                for exam in busy {
                    fail(exam.key(), UnscheduledReason::GroupBusy);
                }
                continue;
            }

            match self.try_sitting(unit, slot, rooms, &professors, occupancy) {
                Ok(placements) => {
                    for placement in &placements {
                        occupancy.commit(placement);
                    }
                    info!(
                        "Placed {} at {} ({} group(s))",
                        unit.key,
                        slot,
                        placements.len()
                    );
                    return UnitOutcome::Placed(placements);
                }
                Err((exam, reason)) => fail(exam, reason),
            }
        }

        let reports = unit
            .members
            .iter()
            .map(|exam| {
                let reason = failures
                    .get(&exam.key())
                    .and_then(|counts| {
                        counts
                            .iter()
                            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                            .map(|(reason, _)| *reason)
                    })
                    .unwrap_or(UnscheduledReason::BlockedBySibling);
                UnscheduledUnit::new(exam, reason)
            })
            .collect();
        UnitOutcome::Unscheduled(reports)
    }

    /// Match every member of the unit to a room and a professor at `slot`
    ///
    /// Stops at the first member that cannot be matched and returns it with
    /// the missing resource.
    fn try_sitting(
        &self,
        unit: &SchedulingUnit,
        slot: Slot,
        rooms: &[&Room],
        professors: &[&Professor],
        occupancy: &OccupancyState,
    ) -> Result<Vec<Placement>, (ExamUnitKey, UnscheduledReason)> {
        let mut reserved_rooms = BTreeSet::new();
        let mut reserved_professors = BTreeSet::new();
        let mut placements = Vec::with_capacity(unit.members.len());

        for exam in &unit.members {
            let context = CandidateContext {
                exam,
                slot,
                occupancy,
                reserved_rooms: &reserved_rooms,
                reserved_professors: &reserved_professors,
            };

            let room = rooms
                .iter()
                .find(|room| room_available(&context, room).passed)
                .ok_or((exam.key(), UnscheduledReason::NoFreeRoom))?;
            let professor = professors
                .iter()
                .find(|professor| self.eligible(&context, professor))
                .ok_or((exam.key(), UnscheduledReason::NoAvailableProfessor))?;

            let placement = Placement {
                exam: exam.key(),
                slot,
                room: room.id,
                professor: professor.id,
            };
            reserved_rooms.insert(placement.room);
            reserved_professors.insert(placement.professor);
            placements.push(placement);
        }

        Ok(placements)
    }

    fn eligible(&self, context: &CandidateContext<'_>, professor: &Professor) -> bool {
        for filter in &self.filters {
            let result = filter.filter(context, professor);
            if !result.passed {
                trace!(
                    "Professor {} filtered out by {}: {}",
                    professor.id,
                    filter.name(),
                    result.reason.unwrap_or_default()
                );
                return false;
            }
        }
        true
    }
}

/// Report members that no slot could ever host, given the catalog alone
fn precheck(
    unit: &SchedulingUnit,
    rooms: &[&Room],
    professors: &[Professor],
) -> Option<Vec<UnscheduledUnit>> {
    let largest_room = rooms.first().map(|room| room.capacity);
    let blocked: BTreeMap<ExamUnitKey, UnscheduledReason> = unit
        .members
        .iter()
        .filter_map(|exam| {
            if !rooms.iter().any(|room| room.fits(exam.group_size)) {
                Some((
                    exam.key(),
                    UnscheduledReason::NoRoomOfSufficientCapacity {
                        group_size: exam.group_size,
                        largest_room,
                    },
                ))
            } else if !professors.iter().any(|p| p.department == exam.department) {
                Some((
                    exam.key(),
                    UnscheduledReason::NoProfessorInDepartment {
                        department: exam.department,
                    },
                ))
            } else {
                None
            }
        })
        .collect();

    if blocked.is_empty() {
        return None;
    }

    Some(
        unit.members
            .iter()
            .map(|exam| {
                let reason = blocked
                    .get(&exam.key())
                    .copied()
                    .unwrap_or(UnscheduledReason::BlockedBySibling);
                UnscheduledUnit::new(exam, reason)
            })
            .collect(),
    )
}
