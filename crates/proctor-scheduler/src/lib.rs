//! Proctor Scheduler - Exam session planning
//!
//! This crate provides:
//! - Occupancy indices rebuilt from committed assignments
//! - Professor filter predicates and room availability checks
//! - Candidate ranking (rooms by capacity, professors by load)
//! - The greedy planning engine
//! - The store-backed scheduler service

pub mod engine;
pub mod error;
pub mod filter;
pub mod occupancy;
pub mod rank;
pub mod scheduler;
pub mod types;

// Re-export commonly used types
pub use engine::{pending_exam_units, scheduling_units, Engine, Plan, PlanInput};
pub use error::{Result, SchedulerError};
pub use occupancy::OccupancyState;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use types::{
    FilterResult, ScheduleStatus, SchedulingResult, SchedulingUnit, UnscheduledReason,
    UnscheduledUnit,
};
