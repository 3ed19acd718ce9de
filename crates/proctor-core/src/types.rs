use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(id: u32) -> Self {
                Self(id)
            }

            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id!(
    /// Identifies an examination session
    SessionId
);
numeric_id!(
    /// Identifies a room in the catalog
    RoomId
);
numeric_id!(
    /// Identifies a supervising professor
    ProfessorId
);
numeric_id!(
    /// Identifies a department
    DepartmentId
);
numeric_id!(
    /// Identifies a formation (degree programme)
    FormationId
);
numeric_id!(
    /// Identifies a module within a formation
    ModuleId
);
numeric_id!(
    /// Identifies a student group
    GroupId
);

/// Identity of one exam unit: one group sitting one module of one formation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExamUnitKey {
    pub formation: FormationId,
    pub module: ModuleId,
    pub group: GroupId,
}

impl ExamUnitKey {
    pub fn new(formation: FormationId, module: ModuleId, group: GroupId) -> Self {
        Self {
            formation,
            module,
            group,
        }
    }

    /// The scheduling unit this exam unit sits with
    pub fn scheduling_unit(&self) -> SchedulingUnitKey {
        SchedulingUnitKey::new(self.formation, self.module)
    }
}

impl fmt::Display for ExamUnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "formation {} / module {} / group {}",
            self.formation, self.module, self.group
        )
    }
}

/// Identity of a scheduling unit: every group of a formation taking one module
///
/// Ordering is (formation, module) ascending, which is also the order in which
/// the engine visits units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchedulingUnitKey {
    pub formation: FormationId,
    pub module: ModuleId,
}

impl SchedulingUnitKey {
    pub fn new(formation: FormationId, module: ModuleId) -> Self {
        Self { formation, module }
    }
}

impl fmt::Display for SchedulingUnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "formation {} / module {}", self.formation, self.module)
    }
}

/// Identifies a committed assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(pub Uuid);

impl AssignmentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a persisted conflict record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictId(pub Uuid);

impl ConflictId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
