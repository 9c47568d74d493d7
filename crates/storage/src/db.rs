use std::{path::Path, sync::Arc};

use redb::Builder;
use tracing::info;

use crate::{errors::StoreError, tables::CursorField};

pub const REDB_FILE: &str = "vigil.redb";

#[derive(Clone)]
pub struct MonitorDB {
    db: Arc<redb::Database>,
}

impl MonitorDB {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let path = data_dir.as_ref().join(REDB_FILE);
        let db = Builder::new().create(&path)?;
        info!("Monitor database opened at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }

    pub fn cursor(&self) -> CursorField {
        CursorField {
            db: self.db.clone(),
        }
    }
}
