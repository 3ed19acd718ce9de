//! Proctor Audit - Conflict detection over committed assignments
//!
//! This crate provides:
//! - Pairwise clash detection (professor, room, group, shared room in a sitting)
//! - Per-assignment checks (capacity, blackout, department, dangling references)
//! - Daily quota and split-sitting checks
//! - The store-backed auditor that persists its findings

pub mod auditor;
pub mod conflict;
pub mod error;

// Re-export commonly used types
pub use auditor::Auditor;
pub use conflict::detect_conflicts;
pub use error::{AuditError, Result};
