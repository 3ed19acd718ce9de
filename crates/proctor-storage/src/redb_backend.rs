use crate::{KVStore, Result, StorageError, Transaction as KVTransaction};
use bytes::Bytes;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

// Every record lives in one table; the key prefix carries the record type
const RECORDS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// redb-based storage backend
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create the database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening redb database at: {}", path.as_ref().display());

        let db = Database::create(path.as_ref())?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS_TABLE)?;
        }
        write_txn.commit()?;

        info!("redb database initialized successfully");

        Ok(Self { db: Arc::new(db) })
    }
}

/// Collect the entries of `table` whose key starts with `prefix`
fn scan_prefix<T>(table: &T, prefix: &[u8]) -> Result<Vec<(Bytes, Bytes)>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut results = Vec::new();
    for entry in table.range(prefix..)? {
        let (key, value) = entry?;
        let key_bytes = key.value();
        if !key_bytes.starts_with(prefix) {
            break;
        }
        results.push((
            Bytes::copy_from_slice(key_bytes),
            Bytes::copy_from_slice(value.value()),
        ));
    }
    Ok(results)
}

impl KVStore for RedbBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS_TABLE)?;
        let value = table.get(key)?;
        Ok(value.map(|v| Bytes::copy_from_slice(v.value())))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        debug!("Putting key: {}", String::from_utf8_lossy(key));

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        debug!("Deleting key: {}", String::from_utf8_lossy(key));

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS_TABLE)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Bytes, Bytes)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS_TABLE)?;
        let results = scan_prefix(&table, prefix)?;
        debug!(
            "Scan of {} found {} results",
            String::from_utf8_lossy(prefix),
            results.len()
        );
        Ok(results)
    }

    fn transaction(&self) -> Result<Box<dyn KVTransaction>> {
        let write_txn = self.db.begin_write()?;
        Ok(Box::new(RedbTransaction {
            txn: Some(write_txn),
        }))
    }
}

/// redb write transaction
struct RedbTransaction {
    txn: Option<redb::WriteTransaction>,
}

impl RedbTransaction {
    fn inner(&self) -> Result<&redb::WriteTransaction> {
        self.txn.as_ref().ok_or_else(|| {
            StorageError::transaction_error("Transaction already committed or rolled back")
        })
    }
}

impl KVTransaction for RedbTransaction {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let table = self.inner()?.open_table(RECORDS_TABLE)?;
        let value = table.get(key)?;
        Ok(value.map(|v| Bytes::copy_from_slice(v.value())))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut table = self.inner()?.open_table(RECORDS_TABLE)?;
        table.insert(key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let mut table = self.inner()?.open_table(RECORDS_TABLE)?;
        table.remove(key)?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Bytes>> {
        let table = self.inner()?.open_table(RECORDS_TABLE)?;
        Ok(scan_prefix(&table, prefix)?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let txn = self.txn.take().ok_or_else(|| {
            StorageError::transaction_error("Transaction already committed or rolled back")
        })?;
        txn.commit()?;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        let txn = self.txn.take().ok_or_else(|| {
            StorageError::transaction_error("Transaction already committed or rolled back")
        })?;
        txn.abort()?;
        Ok(())
    }
}

impl Drop for RedbTransaction {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            let _ = txn.abort();
        }
    }
}
