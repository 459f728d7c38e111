use thiserror::Error;

use crate::model::MatchRecord;
use crate::model::Record;
use crate::store::StoreError;

/// Caller-facing failures of the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed input, such as a match without exactly four seats.
    /// Always a caller bug; retrying the same call fails the same way.
    #[error("invalid match: {0}")]
    Validation(String),

    /// The match id has already been recorded.
    #[error("match {match_id} is already recorded")]
    Conflict { match_id: String },

    /// The store failed. Nothing from the failed call is visible, so the
    /// whole call may be retried.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { collection, id } if collection == MatchRecord::COLLECTION => {
                LedgerError::Conflict { match_id: id }
            }
            other => LedgerError::Storage(other),
        }
    }
}
