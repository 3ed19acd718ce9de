use chrono::NaiveDate;
use proctor_core::{
    Assignment, AssignmentId, ConflictKind, ConflictRecord, Professor, ProfessorId, Room, RoomId,
    SchedulingUnitKey, SessionId, Slot,
};
use std::collections::{BTreeMap, BTreeSet};

/// Room and professor lookups for labelling and per-resource checks
struct Lookup<'a> {
    rooms: BTreeMap<RoomId, &'a Room>,
    professors: BTreeMap<ProfessorId, &'a Professor>,
}

impl<'a> Lookup<'a> {
    fn new(rooms: &'a [Room], professors: &'a [Professor]) -> Self {
        Self {
            rooms: rooms.iter().map(|room| (room.id, room)).collect(),
            professors: professors.iter().map(|p| (p.id, p)).collect(),
        }
    }

    fn room(&self, id: RoomId) -> String {
        match self.rooms.get(&id) {
            Some(room) => format!("room {} ({})", room.name, id),
            None => format!("room {}", id),
        }
    }

    fn professor(&self, id: ProfessorId) -> String {
        match self.professors.get(&id) {
            Some(professor) => format!("professor {} ({})", professor.name, id),
            None => format!("professor {}", id),
        }
    }
}

/// Re-derive every invariant violation in a session's assignment set
///
/// Works on any assignment set, whether planned or edited by hand.
/// Assignments of other sessions are ignored. Records come out in slot
/// order within each family of checks: pairwise clashes, per-assignment
/// checks, daily quotas, then split sittings.
pub fn detect_conflicts(
    session: SessionId,
    assignments: &[Assignment],
    rooms: &[Room],
    professors: &[Professor],
) -> Vec<ConflictRecord> {
    let lookup = Lookup::new(rooms, professors);
    let mut ordered: Vec<&Assignment> = assignments
        .iter()
        .filter(|a| a.session == session)
        .collect();
    ordered.sort_by_key(|a| (a.slot, a.exam.key(), a.id));

    let mut conflicts = pairwise_clashes(session, &ordered, &lookup);
    conflicts.extend(resource_checks(session, &ordered, &lookup));
    conflicts.extend(quota_overruns(session, &ordered, &lookup));
    conflicts.extend(split_sittings(session, &ordered));
    conflicts
}

fn pairwise_clashes(
    session: SessionId,
    ordered: &[&Assignment],
    lookup: &Lookup<'_>,
) -> Vec<ConflictRecord> {
    // Only assignments sharing a slot can clash
    let mut by_slot: BTreeMap<Slot, Vec<&Assignment>> = BTreeMap::new();
    for &assignment in ordered {
        by_slot.entry(assignment.slot).or_default().push(assignment);
    }

    let mut conflicts = Vec::new();
    for (slot, sitting) in &by_slot {
        for (i, a) in sitting.iter().enumerate() {
            for b in &sitting[i + 1..] {
                let pair = vec![a.id, b.id];

                if a.professor == b.professor {
                    conflicts.push(ConflictRecord::new(
                        session,
                        ConflictKind::ProfessorDoubleBooked,
                        pair.clone(),
                        format!(
                            "{} supervises {} and {} at {}",
                            lookup.professor(a.professor),
                            a.exam.key(),
                            b.exam.key(),
                            slot
                        ),
                    ));
                }

                if a.room == b.room {
                    let (kind, explanation) = if a.scheduling_unit() == b.scheduling_unit() {
                        (
                            ConflictKind::DuplicateRoomInSitting,
                            format!(
                                "Groups {} and {} of {} share {} at {}",
                                a.exam.group,
                                b.exam.group,
                                a.scheduling_unit(),
                                lookup.room(a.room),
                                slot
                            ),
                        )
                    } else {
                        (
                            ConflictKind::RoomDoubleBooked,
                            format!(
                                "{} hosts {} and {} at {}",
                                lookup.room(a.room),
                                a.exam.key(),
                                b.exam.key(),
                                slot
                            ),
                        )
                    };
                    conflicts.push(ConflictRecord::new(session, kind, pair.clone(), explanation));
                }

                if a.exam.group == b.exam.group {
                    conflicts.push(ConflictRecord::new(
                        session,
                        ConflictKind::GroupDoubleBooked,
                        pair,
                        format!(
                            "Group {} sits {} and {} at {}",
                            a.exam.group,
                            a.exam.key(),
                            b.exam.key(),
                            slot
                        ),
                    ));
                }
            }
        }
    }
    conflicts
}

fn resource_checks(
    session: SessionId,
    ordered: &[&Assignment],
    lookup: &Lookup<'_>,
) -> Vec<ConflictRecord> {
    let mut conflicts = Vec::new();
    for a in ordered {
        match lookup.rooms.get(&a.room) {
            None => conflicts.push(ConflictRecord::new(
                session,
                ConflictKind::DanglingReference,
                vec![a.id],
                format!("{} at {} references unknown room {}", a.exam.key(), a.slot, a.room),
            )),
            Some(room) if !room.fits(a.exam.group_size) => conflicts.push(ConflictRecord::new(
                session,
                ConflictKind::CapacityExceeded,
                vec![a.id],
                format!(
                    "{} has {} students but {} seats {}",
                    a.exam.key(),
                    a.exam.group_size,
                    lookup.room(a.room),
                    room.capacity
                ),
            )),
            Some(_) => {}
        }

        let Some(professor) = lookup.professors.get(&a.professor) else {
            conflicts.push(ConflictRecord::new(
                session,
                ConflictKind::DanglingReference,
                vec![a.id],
                format!(
                    "{} at {} references unknown professor {}",
                    a.exam.key(),
                    a.slot,
                    a.professor
                ),
            ));
            continue;
        };

        if professor.is_blacked_out(a.slot.date) {
            conflicts.push(ConflictRecord::new(
                session,
                ConflictKind::ProfessorUnavailable,
                vec![a.id],
                format!(
                    "{} is unavailable on {} but supervises {}",
                    lookup.professor(a.professor),
                    a.slot.date,
                    a.exam.key()
                ),
            ));
        }
        if professor.department != a.exam.department {
            conflicts.push(ConflictRecord::new(
                session,
                ConflictKind::DepartmentMismatch,
                vec![a.id],
                format!(
                    "{} of department {} supervises {} of department {}",
                    lookup.professor(a.professor),
                    professor.department,
                    a.exam.key(),
                    a.exam.department
                ),
            ));
        }
    }
    conflicts
}

fn quota_overruns(
    session: SessionId,
    ordered: &[&Assignment],
    lookup: &Lookup<'_>,
) -> Vec<ConflictRecord> {
    let mut by_day: BTreeMap<(ProfessorId, NaiveDate), Vec<AssignmentId>> = BTreeMap::new();
    for a in ordered {
        by_day
            .entry((a.professor, a.slot.date))
            .or_default()
            .push(a.id);
    }

    by_day
        .into_iter()
        .filter_map(|((id, date), assignments)| {
            // Unknown professors are reported as dangling references
            let professor = lookup.professors.get(&id)?;
            let count = assignments.len();
            (count > professor.daily_quota as usize).then(|| {
                ConflictRecord::new(
                    session,
                    ConflictKind::QuotaExceeded,
                    assignments,
                    format!(
                        "{} supervises {} sittings on {}, over the daily quota of {}",
                        lookup.professor(id),
                        count,
                        date,
                        professor.daily_quota
                    ),
                )
            })
        })
        .collect()
}

fn split_sittings(session: SessionId, ordered: &[&Assignment]) -> Vec<ConflictRecord> {
    let mut by_unit: BTreeMap<SchedulingUnitKey, (BTreeSet<Slot>, Vec<AssignmentId>)> =
        BTreeMap::new();
    for a in ordered {
        let (slots, ids) = by_unit.entry(a.scheduling_unit()).or_default();
        slots.insert(a.slot);
        ids.push(a.id);
    }

    by_unit
        .into_iter()
        .filter(|(_, (slots, _))| slots.len() > 1)
        .map(|(unit, (slots, ids))| {
            let slots: Vec<String> = slots.iter().map(|slot| slot.to_string()).collect();
            ConflictRecord::new(
                session,
                ConflictKind::SplitSitting,
                ids,
                format!(
                    "Groups of {} sit at {} different slots: {}",
                    unit,
                    slots.len(),
                    slots.join(", ")
                ),
            )
        })
        .collect()
}
