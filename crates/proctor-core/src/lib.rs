//! Proctor Core - Domain types for exam session planning
//!
//! This crate provides:
//! - Identifiers for sessions, rooms, professors, formations, modules and groups
//! - Catalog records (sessions, rooms, professors, exam units)
//! - The slot calendar
//! - Assignments and conflict records
//! - Catalog validation and JSON/YAML helpers

pub mod assignment;
pub mod calendar;
pub mod catalog;
pub mod error;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use assignment::{Assignment, ConflictKind, ConflictRecord, Placement};
pub use calendar::{is_business_day, Period, Slot, SlotCalendar, EXAM_DURATION_MINUTES};
pub use catalog::{BlackoutRange, Catalog, ExamUnit, Professor, Room, RoomCategory, Session};
pub use error::{ProctorError, Result};
pub use types::{
    AssignmentId, ConflictId, DepartmentId, ExamUnitKey, FormationId, GroupId, ModuleId,
    ProfessorId, RoomId, SchedulingUnitKey, SessionId,
};
pub use validation::validate_catalog;

/// Serialize a record to JSON
pub fn to_json<T: serde::Serialize>(record: &T) -> Result<String> {
    serde_json::to_string(record).map_err(|e| {
        ProctorError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Serialize a record to pretty JSON
pub fn to_json_pretty<T: serde::Serialize>(record: &T) -> Result<String> {
    serde_json::to_string_pretty(record).map_err(|e| {
        ProctorError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a record from JSON
pub fn from_json<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| {
        ProctorError::serialization_error(
            format!("Failed to deserialize from JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a record from YAML
///
/// YAML is a superset of JSON, so this also accepts JSON documents.
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_yaml::from_str(data).map_err(|e| {
        ProctorError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_YAML: &str = r#"
sessions:
  - id: 1
    name: January
    start: 2025-01-06
    end: 2025-01-10
rooms:
  - { id: 1, name: Amphi A, capacity: 120, category: large }
  - { id: 2, name: S101, capacity: 40 }
professors:
  - id: 1
    name: Dr. Haddad
    department: 2
    daily_quota: 3
    blackouts:
      - { start: 2025-01-07, end: 2025-01-07 }
exam_units:
  - { session: 1, formation: 1, department: 2, module: 10, group: 100, group_size: 35 }
"#;

    #[test]
    fn test_catalog_from_yaml() {
        let catalog: Catalog = from_yaml(CATALOG_YAML).unwrap();
        assert_eq!(catalog.sessions.len(), 1);
        assert_eq!(catalog.rooms[0].category, RoomCategory::Large);
        assert_eq!(catalog.professors[0].blackouts.len(), 1);
        assert_eq!(catalog.exam_units[0].group_size, 35);
        assert!(validate_catalog(&catalog).is_ok());
    }

    #[test]
    fn test_json_roundtrip_through_yaml_reader() {
        let catalog: Catalog = from_yaml(CATALOG_YAML).unwrap();
        let json = to_json(&catalog).unwrap();
        let back: Catalog = from_yaml(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
