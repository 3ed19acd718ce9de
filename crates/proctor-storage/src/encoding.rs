use proctor_core::{AssignmentId, ExamUnitKey, ProfessorId, RoomId, SessionId};

/// Key encoder for storage keys
///
/// Numeric ids are zero-padded so that bytewise key order matches numeric
/// order, and every prefix ends in `/` so `sessions/1/` never matches
/// `sessions/10/`.
///
/// Layout:
/// - `sessions/{session}`
/// - `rooms/{room}`
/// - `professors/{professor}`
/// - `exam-units/{session}/{formation}/{module}/{group}`
/// - `assignments/{session}/{assignment}`
/// - `conflicts/{session}/{position}`
pub struct KeyEncoder;

const SESSIONS: &str = "sessions";
const ROOMS: &str = "rooms";
const PROFESSORS: &str = "professors";
const EXAM_UNITS: &str = "exam-units";
const ASSIGNMENTS: &str = "assignments";
const CONFLICTS: &str = "conflicts";

fn pad(id: u32) -> String {
    format!("{:010}", id)
}

impl KeyEncoder {
    pub fn session(id: SessionId) -> String {
        format!("{}/{}", SESSIONS, pad(id.get()))
    }

    pub fn sessions_prefix() -> String {
        format!("{}/", SESSIONS)
    }

    pub fn room(id: RoomId) -> String {
        format!("{}/{}", ROOMS, pad(id.get()))
    }

    pub fn rooms_prefix() -> String {
        format!("{}/", ROOMS)
    }

    pub fn professor(id: ProfessorId) -> String {
        format!("{}/{}", PROFESSORS, pad(id.get()))
    }

    pub fn professors_prefix() -> String {
        format!("{}/", PROFESSORS)
    }

    pub fn exam_unit(session: SessionId, key: &ExamUnitKey) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            EXAM_UNITS,
            pad(session.get()),
            pad(key.formation.get()),
            pad(key.module.get()),
            pad(key.group.get())
        )
    }

    pub fn exam_units_prefix(session: SessionId) -> String {
        format!("{}/{}/", EXAM_UNITS, pad(session.get()))
    }

    pub fn assignment(session: SessionId, id: AssignmentId) -> String {
        format!("{}/{}/{}", ASSIGNMENTS, pad(session.get()), id)
    }

    pub fn assignments_prefix(session: SessionId) -> String {
        format!("{}/{}/", ASSIGNMENTS, pad(session.get()))
    }

    /// Conflict records are keyed by their position in the audit report
    pub fn conflict(session: SessionId, position: u32) -> String {
        format!("{}/{}/{}", CONFLICTS, pad(session.get()), pad(position))
    }

    pub fn conflicts_prefix(session: SessionId) -> String {
        format!("{}/{}/", CONFLICTS, pad(session.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::{FormationId, GroupId, ModuleId};

    #[test]
    fn test_encode_keys() {
        assert_eq!(KeyEncoder::session(SessionId(7)), "sessions/0000000007");
        assert_eq!(KeyEncoder::room(RoomId(12)), "rooms/0000000012");
        let key = ExamUnitKey::new(FormationId(1), ModuleId(2), GroupId(3));
        assert_eq!(
            KeyEncoder::exam_unit(SessionId(4), &key),
            "exam-units/0000000004/0000000001/0000000002/0000000003"
        );
        assert!(KeyEncoder::exam_unit(SessionId(4), &key)
            .starts_with(&KeyEncoder::exam_units_prefix(SessionId(4))));
        assert_eq!(
            KeyEncoder::conflict(SessionId(4), 9),
            "conflicts/0000000004/0000000009"
        );
        assert!(KeyEncoder::conflict(SessionId(4), 9) < KeyEncoder::conflict(SessionId(4), 10));
    }

    #[test]
    fn test_prefixes_do_not_overlap() {
        let one = KeyEncoder::assignments_prefix(SessionId(1));
        let ten = KeyEncoder::assignment(SessionId(10), AssignmentId::generate());
        assert!(!ten.starts_with(&one));
    }
}
