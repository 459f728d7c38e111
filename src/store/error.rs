use thiserror::Error;

/// Error type for ledger store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same natural key already exists.
    #[error("{collection}:{id} already exists")]
    Conflict { collection: &'static str, id: String },

    /// The underlying lock primitive was poisoned (a thread panicked while holding it).
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    /// A stored row could not be turned back into a record.
    #[error("corrupt stored record: {0}")]
    Corrupt(String),

    /// The storage engine rejected an operation.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
