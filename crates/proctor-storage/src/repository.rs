use crate::encoding::KeyEncoder;
use crate::store::{AssignmentStore, CatalogProvider};
use crate::{KVStore, MemoryBackend, Result, StorageError, Transaction};
use parking_lot::Mutex;
use proctor_core::{
    Assignment, Catalog, ConflictRecord, ExamUnit, Professor, Room, Session, SessionId,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Counts of records written by [`Repository::import_catalog`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub sessions: usize,
    pub rooms: usize,
    pub professors: usize,
    pub exam_units: usize,
}

/// Catalog and assignment store backed by a [`KVStore`]
///
/// Records are stored as JSON documents under the keys laid out by
/// [`KeyEncoder`].
pub struct Repository {
    kv: Arc<dyn KVStore>,
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

fn encode<T: Serialize>(key: &str, record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| {
        StorageError::record_error(key, format!("Failed to serialize: {}", e), Some(Box::new(e)))
    })
}

fn decode<T: DeserializeOwned>(key: &[u8], data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| {
        StorageError::record_error(
            String::from_utf8_lossy(key),
            format!("Failed to deserialize: {}", e),
            Some(Box::new(e)),
        )
    })
}

impl Repository {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            kv,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// A repository over a fresh [`MemoryBackend`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    fn put_record<T: Serialize>(&self, key: &str, record: &T) -> Result<()> {
        let data = encode(key, record)?;
        self.kv.put(key.as_bytes(), &data)
    }

    fn get_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv.get(key.as_bytes())? {
            Some(data) => Ok(Some(decode(key.as_bytes(), &data)?)),
            None => Ok(None),
        }
    }

    fn scan_records<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        self.kv
            .scan(prefix.as_bytes())?
            .iter()
            .map(|(key, data)| decode(key, data))
            .collect()
    }

    pub fn put_session(&self, session: &Session) -> Result<()> {
        self.put_record(&KeyEncoder::session(session.id), session)
    }

    pub fn put_room(&self, room: &Room) -> Result<()> {
        self.put_record(&KeyEncoder::room(room.id), room)
    }

    pub fn put_professor(&self, professor: &Professor) -> Result<()> {
        self.put_record(&KeyEncoder::professor(professor.id), professor)
    }

    pub fn put_exam_unit(&self, exam: &ExamUnit) -> Result<()> {
        self.put_record(&KeyEncoder::exam_unit(exam.session, &exam.key()), exam)
    }

    /// Write or overwrite a single assignment outside the planner
    ///
    /// This is the manual-override path; the auditor is expected to catch
    /// whatever it breaks.
    pub fn put_assignment(&self, assignment: &Assignment) -> Result<()> {
        self.put_record(
            &KeyEncoder::assignment(assignment.session, assignment.id),
            assignment,
        )
    }

    /// Write every record of a catalog in one transaction
    pub fn import_catalog(&self, catalog: &Catalog) -> Result<ImportSummary> {
        let mut txn = self.kv.transaction()?;

        for session in &catalog.sessions {
            let key = KeyEncoder::session(session.id);
            txn.put(key.as_bytes(), &encode(&key, session)?)?;
        }
        for room in &catalog.rooms {
            let key = KeyEncoder::room(room.id);
            txn.put(key.as_bytes(), &encode(&key, room)?)?;
        }
        for professor in &catalog.professors {
            let key = KeyEncoder::professor(professor.id);
            txn.put(key.as_bytes(), &encode(&key, professor)?)?;
        }
        for exam in &catalog.exam_units {
            let key = KeyEncoder::exam_unit(exam.session, &exam.key());
            txn.put(key.as_bytes(), &encode(&key, exam)?)?;
        }

        txn.commit()?;

        let summary = ImportSummary {
            sessions: catalog.sessions.len(),
            rooms: catalog.rooms.len(),
            professors: catalog.professors.len(),
            exam_units: catalog.exam_units.len(),
        };
        info!(
            "Imported {} sessions, {} rooms, {} professors, {} exam units",
            summary.sessions, summary.rooms, summary.professors, summary.exam_units
        );
        Ok(summary)
    }
}

impl CatalogProvider for Repository {
    fn session(&self, id: SessionId) -> Result<Option<Session>> {
        self.get_record(&KeyEncoder::session(id))
    }

    fn sessions(&self) -> Result<Vec<Session>> {
        self.scan_records(&KeyEncoder::sessions_prefix())
    }

    fn rooms(&self) -> Result<Vec<Room>> {
        self.scan_records(&KeyEncoder::rooms_prefix())
    }

    fn professors(&self) -> Result<Vec<Professor>> {
        self.scan_records(&KeyEncoder::professors_prefix())
    }

    fn exam_units(&self, session: SessionId) -> Result<Vec<ExamUnit>> {
        self.scan_records(&KeyEncoder::exam_units_prefix(session))
    }
}

impl AssignmentStore for Repository {
    fn assignments(&self, session: SessionId) -> Result<Vec<Assignment>> {
        self.scan_records(&KeyEncoder::assignments_prefix(session))
    }

    fn commit_assignments(&self, session: SessionId, assignments: &[Assignment]) -> Result<()> {
        if assignments.is_empty() {
            return Ok(());
        }

        let mut txn = self.kv.transaction()?;
        for assignment in assignments {
            if assignment.session != session {
                txn.rollback()?;
                return Err(StorageError::transaction_error(format!(
                    "Assignment {} belongs to session {}, not {}",
                    assignment.id, assignment.session, session
                )));
            }
            let key = KeyEncoder::assignment(session, assignment.id);
            if txn.get(key.as_bytes())?.is_some() {
                txn.rollback()?;
                return Err(StorageError::already_exists(key));
            }
            txn.put(key.as_bytes(), &encode(&key, assignment)?)?;
        }
        txn.commit()?;

        debug!(
            "Committed {} assignments for session {}",
            assignments.len(),
            session
        );
        Ok(())
    }

    fn conflicts(&self, session: SessionId) -> Result<Vec<ConflictRecord>> {
        self.scan_records(&KeyEncoder::conflicts_prefix(session))
    }

    fn replace_conflicts(&self, session: SessionId, conflicts: &[ConflictRecord]) -> Result<()> {
        let mut txn = self.kv.transaction()?;

        let stale = txn.keys_with_prefix(KeyEncoder::conflicts_prefix(session).as_bytes())?;
        for key in &stale {
            txn.delete(key)?;
        }
        for (position, conflict) in (0u32..).zip(conflicts) {
            let key = KeyEncoder::conflict(session, position);
            txn.put(key.as_bytes(), &encode(&key, conflict)?)?;
        }
        txn.commit()?;

        debug!(
            "Replaced {} conflict records with {} for session {}",
            stale.len(),
            conflicts.len(),
            session
        );
        Ok(())
    }

    fn session_lock(&self, session: SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        // Drop locks nobody holds a handle to
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(session).or_default())
    }
}
