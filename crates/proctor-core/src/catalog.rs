use crate::calendar::SlotCalendar;
use crate::error::{ProctorError, Result};
use crate::types::{
    DepartmentId, ExamUnitKey, FormationId, GroupId, ModuleId, ProfessorId, RoomId,
    SchedulingUnitKey, SessionId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An examination session: the calendar window a batch of exams must fit in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    /// First day of the session (inclusive)
    pub start: NaiveDate,
    /// Last day of the session (inclusive)
    pub end: NaiveDate,
}

impl Session {
    pub fn new(id: SessionId, name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            start,
            end,
        }
    }

    /// The slots exams of this session may use
    pub fn calendar(&self) -> SlotCalendar {
        SlotCalendar::new(self.start, self.end)
    }
}

/// Room category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomCategory {
    /// Lecture theatre
    #[serde(alias = "amphi")]
    Large,
    #[default]
    #[serde(alias = "salle")]
    Standard,
}

/// A room that can host one exam unit per slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Number of seats; a hard upper bound on the group size the room hosts
    pub capacity: u32,
    #[serde(default)]
    pub category: RoomCategory,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            category: RoomCategory::Standard,
        }
    }

    pub fn with_category(mut self, category: RoomCategory) -> Self {
        self.category = category;
        self
    }

    pub fn fits(&self, group_size: u32) -> bool {
        self.capacity >= group_size
    }
}

/// A declared unavailability window, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackoutRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BlackoutRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ProctorError::invalid_record(
                format!("blackout range starts on {} after it ends on {}", start, end),
                "Swap the dates or use a single-day range",
            ));
        }
        Ok(Self { start, end })
    }

    /// A blackout covering a single day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A professor who may supervise exams of their own department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub id: ProfessorId,
    pub name: String,
    pub department: DepartmentId,
    /// Maximum number of supervisions on any single date
    pub daily_quota: u32,
    #[serde(default)]
    pub blackouts: Vec<BlackoutRange>,
    /// Supervisions already counted against this professor outside the session
    #[serde(default)]
    pub load: u32,
}

impl Professor {
    pub fn new(
        id: ProfessorId,
        name: impl Into<String>,
        department: DepartmentId,
        daily_quota: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            department,
            daily_quota,
            blackouts: Vec::new(),
            load: 0,
        }
    }

    pub fn with_blackout(mut self, blackout: BlackoutRange) -> Self {
        self.blackouts.push(blackout);
        self
    }

    pub fn with_load(mut self, load: u32) -> Self {
        self.load = load;
        self
    }

    /// Whether any blackout range covers the date
    pub fn is_blacked_out(&self, date: NaiveDate) -> bool {
        self.blackouts.iter().any(|b| b.contains(date))
    }
}

/// One group's sitting of one module: the atomic input to scheduling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamUnit {
    pub session: SessionId,
    pub formation: FormationId,
    pub department: DepartmentId,
    pub module: ModuleId,
    pub group: GroupId,
    pub group_size: u32,
}

impl ExamUnit {
    pub fn key(&self) -> ExamUnitKey {
        ExamUnitKey::new(self.formation, self.module, self.group)
    }

    pub fn scheduling_unit(&self) -> SchedulingUnitKey {
        SchedulingUnitKey::new(self.formation, self.module)
    }
}

/// A full catalog document, as imported by the command-line driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub professors: Vec<Professor>,
    #[serde(default)]
    pub exam_units: Vec<ExamUnit>,
}
