use crate::occupancy::OccupancyState;
use proctor_core::{Professor, Room};

/// Rooms in the order they are tried: largest first, ties by id
pub fn rank_rooms(rooms: &[Room]) -> Vec<&Room> {
    let mut ranked: Vec<&Room> = rooms.iter().collect();
    ranked.sort_by(|a, b| b.capacity.cmp(&a.capacity).then(a.id.cmp(&b.id)));
    ranked
}

/// Current supervision count: catalog load plus this session's assignments
pub fn current_load(professor: &Professor, occupancy: &OccupancyState) -> u32 {
    professor
        .load
        .saturating_add(occupancy.session_load(professor.id))
}

/// Professors in the order they are tried: least loaded first, ties by id
pub fn rank_professors<'a>(
    professors: &'a [Professor],
    occupancy: &OccupancyState,
) -> Vec<&'a Professor> {
    let mut ranked: Vec<&Professor> = professors.iter().collect();
    ranked.sort_by_key(|p| (current_load(p, occupancy), p.id));
    ranked
}
