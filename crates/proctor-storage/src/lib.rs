//! Proctor Storage - Storage abstraction and redb backend
//!
//! This crate provides:
//! - KVStore trait for storage abstraction
//! - redb-based and in-memory implementations
//! - Key encoding for catalog, assignment and conflict records
//! - The catalog and assignment store traits, and a KV-backed repository

pub mod encoding;
pub mod error;
pub mod kv;
pub mod memory;
pub mod redb_backend;
pub mod repository;
pub mod store;

// Re-export commonly used types
pub use encoding::KeyEncoder;
pub use error::{Result, StorageError};
pub use kv::{KVStore, Transaction};
pub use memory::MemoryBackend;
pub use redb_backend::RedbBackend;
pub use repository::{ImportSummary, Repository};
pub use store::{AssignmentStore, CatalogProvider};
