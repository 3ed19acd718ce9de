use crate::{KVStore, Result, StorageError, Transaction as KVTransaction};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type Records = BTreeMap<Vec<u8>, Bytes>;

/// In-memory storage backend for tests and dry runs
///
/// Keeps records in an ordered map so scans come back in key order, like the
/// redb backend. Transactions buffer their writes and apply them under one
/// write lock on commit.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    records: Arc<RwLock<Records>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn scan_prefix(records: &Records, prefix: &[u8]) -> Vec<(Bytes, Bytes)> {
    records
        .range(prefix.to_vec()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| (Bytes::copy_from_slice(key), value.clone()))
        .collect()
}

impl KVStore for MemoryBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.records
            .write()
            .insert(key.to_vec(), Bytes::copy_from_slice(value));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Bytes, Bytes)>> {
        Ok(scan_prefix(&self.records.read(), prefix))
    }

    fn transaction(&self) -> Result<Box<dyn KVTransaction>> {
        Ok(Box::new(MemoryTransaction {
            records: Arc::clone(&self.records),
            writes: BTreeMap::new(),
            open: true,
        }))
    }
}

/// Buffered transaction over a [`MemoryBackend`]
///
/// `writes` maps a key to its new value, or to `None` for a delete.
struct MemoryTransaction {
    records: Arc<RwLock<Records>>,
    writes: BTreeMap<Vec<u8>, Option<Bytes>>,
    open: bool,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(StorageError::transaction_error(
                "Transaction already committed or rolled back",
            ))
        }
    }
}

impl KVTransaction for MemoryTransaction {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        self.ensure_open()?;
        match self.writes.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => Ok(self.records.read().get(key).cloned()),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.writes
            .insert(key.to_vec(), Some(Bytes::copy_from_slice(value)));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Bytes>> {
        self.ensure_open()?;
        let mut keys: BTreeMap<Vec<u8>, bool> = scan_prefix(&self.records.read(), prefix)
            .into_iter()
            .map(|(key, _)| (key.to_vec(), true))
            .collect();
        for (key, pending) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            keys.insert(key.clone(), pending.is_some());
        }
        Ok(keys
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(key, _)| Bytes::from(key))
            .collect())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.ensure_open()?;
        self.open = false;

        let writes = std::mem::take(&mut self.writes);
        debug!("Committing {} buffered writes", writes.len());

        let mut records = self.records.write();
        for (key, pending) in writes {
            match pending {
                Some(value) => {
                    records.insert(key, value);
                }
                None => {
                    records.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.ensure_open()?;
        self.open = false;
        self.writes.clear();
        Ok(())
    }
}
