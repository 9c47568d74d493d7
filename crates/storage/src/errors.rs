use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error")]
    Commit(#[from] redb::CommitError),

    #[error("Storage error")]
    Storage(#[from] redb::StorageError),

    #[error("Table error")]
    Table(#[from] redb::TableError),

    #[error("Io error")]
    Io(#[from] std::io::Error),
}
