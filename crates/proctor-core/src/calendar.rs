//! Slot calendar
//!
//! A session's schedulable slots are every business day in its date range
//! crossed with a fixed sequence of six 90-minute periods. The enumeration is
//! closed: neither slot length nor the number of periods is configurable.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of every exam sitting, in minutes
pub const EXAM_DURATION_MINUTES: i64 = 90;

/// Start times of the daily periods, as (hour, minute)
const PERIOD_STARTS: [(u32, u32); 6] = [(8, 0), (9, 30), (11, 0), (12, 30), (14, 0), (15, 30)];

/// One of the six fixed exam periods of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(u8);

impl Period {
    /// Number of periods per business day
    pub const PER_DAY: usize = PERIOD_STARTS.len();

    /// All periods in daily order
    pub fn all() -> impl Iterator<Item = Period> + Clone {
        (0..Self::PER_DAY as u8).map(Period)
    }

    /// Get a period by its zero-based index in the day
    pub fn from_index(index: u8) -> Option<Self> {
        ((index as usize) < Self::PER_DAY).then_some(Period(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn start(self) -> NaiveTime {
        let (hour, minute) = PERIOD_STARTS[self.0 as usize];
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn end(self) -> NaiveTime {
        self.start() + Duration::minutes(EXAM_DURATION_MINUTES)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start().format("%H:%M"),
            self.end().format("%H:%M")
        )
    }
}

/// A (date, period) pair. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub period: Period,
}

impl Slot {
    pub fn new(date: NaiveDate, period: Period) -> Self {
        Self { date, period }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.period)
    }
}

/// Whether exams may be held on this date
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The schedulable slots of a date range (both ends inclusive)
///
/// The calendar is a plain value; every call to [`SlotCalendar::slots`]
/// starts a fresh enumeration from the first slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCalendar {
    start: NaiveDate,
    end: NaiveDate,
}

impl SlotCalendar {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Business days of the range, in order
    pub fn business_days(&self) -> impl Iterator<Item = NaiveDate> + Clone {
        let end = self.end;
        self.start
            .iter_days()
            .take_while(move |d| *d <= end)
            .filter(|d| is_business_day(*d))
    }

    /// Slots of the range in chronological order
    pub fn slots(&self) -> impl Iterator<Item = Slot> + Clone {
        self.business_days()
            .flat_map(|date| Period::all().map(move |period| Slot::new(date, period)))
    }

    /// Total number of slots
    pub fn len(&self) -> usize {
        self.business_days().count() * Period::PER_DAY
    }

    pub fn is_empty(&self) -> bool {
        self.business_days().next().is_none()
    }

    /// Whether a slot falls inside this calendar
    pub fn contains(&self, slot: &Slot) -> bool {
        slot.date >= self.start && slot.date <= self.end && is_business_day(slot.date)
    }
}
