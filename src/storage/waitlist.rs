//! Waitlist storage, keyed by email.

use crate::models::WaitlistEntry;
use crate::storage::StoreError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const WAITLIST_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("waitlist");

#[derive(Debug, Clone)]
pub struct WaitlistStorage {
    db: Arc<Database>,
}

impl WaitlistStorage {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(WAITLIST_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert the entry unless the email is already present. Returns
    /// whether a new row was written; duplicate signups are a no-op.
    pub fn add(&self, entry: &WaitlistEntry) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(WAITLIST_TABLE)?;
            if table.get(entry.email.as_str())?.is_some() {
                false
            } else {
                let json_bytes = serde_json::to_vec(entry)?;
                table.insert(entry.email.as_str(), json_bytes.as_slice())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    pub fn contains(&self, email: &str) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WAITLIST_TABLE)?;
        Ok(table.get(email)?.is_some())
    }
}
