use thiserror::Error;

use crate::RowId;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum ArborStoreError {
    /// An error that occurs when working with a storage backend
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A row that was expected to exist could not be found
    #[error("No row with id {0}")]
    AbsentRow(RowId),

    /// An error that occurs when managing a transaction
    #[error("Transaction error: {0}")]
    Transaction(String),
}
