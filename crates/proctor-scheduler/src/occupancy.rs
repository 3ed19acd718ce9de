use chrono::NaiveDate;
use proctor_core::{Assignment, GroupId, Placement, ProfessorId, RoomId, SchedulingUnitKey, Slot};
use std::collections::{BTreeMap, BTreeSet};

/// Resource usage of one session, as seen by a single planning run
///
/// Built from the committed assignments at the start of a run and updated
/// as the engine commits sittings. Each index is keyed by the structured
/// identity of what it tracks.
#[derive(Debug, Clone, Default)]
pub struct OccupancyState {
    room_at_slot: BTreeSet<(Slot, RoomId)>,
    professor_at_slot: BTreeSet<(Slot, ProfessorId)>,
    professor_at_date: BTreeMap<(NaiveDate, ProfessorId), u32>,
    group_at_date: BTreeSet<(NaiveDate, GroupId)>,
    unit_at_slot: BTreeMap<SchedulingUnitKey, BTreeSet<Slot>>,
    professor_load: BTreeMap<ProfessorId, u32>,
}

impl OccupancyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the indices from committed assignments
    pub fn from_assignments(assignments: &[Assignment]) -> Self {
        let mut state = Self::new();
        for assignment in assignments {
            state.commit(&assignment.placement());
        }
        state
    }

    /// Record a placement in every index
    pub fn commit(&mut self, placement: &Placement) {
        let slot = placement.slot;
        self.room_at_slot.insert((slot, placement.room));
        self.professor_at_slot.insert((slot, placement.professor));
        *self
            .professor_at_date
            .entry((slot.date, placement.professor))
            .or_insert(0) += 1;
        self.group_at_date.insert((slot.date, placement.exam.group));
        self.unit_at_slot
            .entry(placement.exam.scheduling_unit())
            .or_default()
            .insert(slot);
        *self.professor_load.entry(placement.professor).or_insert(0) += 1;
    }

    pub fn room_free(&self, slot: Slot, room: RoomId) -> bool {
        !self.room_at_slot.contains(&(slot, room))
    }

    pub fn professor_free(&self, slot: Slot, professor: ProfessorId) -> bool {
        !self.professor_at_slot.contains(&(slot, professor))
    }

    /// Sittings the professor supervises on `date`
    pub fn supervisions_on(&self, date: NaiveDate, professor: ProfessorId) -> u32 {
        self.professor_at_date
            .get(&(date, professor))
            .copied()
            .unwrap_or(0)
    }

    pub fn group_busy_on(&self, date: NaiveDate, group: GroupId) -> bool {
        self.group_at_date.contains(&(date, group))
    }

    pub fn unit_placed_at(&self, unit: SchedulingUnitKey, slot: Slot) -> bool {
        self.unit_at_slot
            .get(&unit)
            .is_some_and(|slots| slots.contains(&slot))
    }

    /// Slots where the unit already has committed sittings
    pub fn unit_slots(&self, unit: SchedulingUnitKey) -> Option<&BTreeSet<Slot>> {
        self.unit_at_slot.get(&unit)
    }

    /// Supervisions assigned to the professor within this session
    pub fn session_load(&self, professor: ProfessorId) -> u32 {
        self.professor_load.get(&professor).copied().unwrap_or(0)
    }
}
