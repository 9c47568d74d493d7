use std::sync::Arc;

use redb::{Database, Durability, TableDefinition};

use crate::errors::StoreError;

/// Single-row monitor state. Keys are field names, values are slots.
const MONITOR_STATE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("monitor_state");

const CURSOR_KEY: &str = "cursor";

/// The persisted progress cursor: the last fully processed slot. Written by
/// the scheduler only, with immediate durability, after each batch.
pub struct CursorField {
    pub(crate) db: Arc<Database>,
}

impl CursorField {
    pub fn get(&self) -> Result<Option<u64>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(MONITOR_STATE_TABLE) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(table.get(CURSOR_KEY)?.map(|guard| guard.value()))
    }

    pub fn set(&self, slot: u64) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        {
            let mut table = write_txn.open_table(MONITOR_STATE_TABLE)?;
            table.insert(CURSOR_KEY, slot)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
