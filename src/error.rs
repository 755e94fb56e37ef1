use crate::model::RecordKind;
use thiserror::Error;

/// Failure taxonomy for every ledger operation.
///
/// The first four variants are the documented contract; the rest are
/// pass-throughs from the storage and serialization layers.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or out-of-range input: bad amount, bad date, empty or
    /// duplicate category name, unresolvable category reference.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A record's type disagrees with its category's type.
    #[error("record type {record} does not match category type {category}")]
    TypeMismatch {
        record: RecordKind,
        category: RecordKind,
    },

    /// The operation targets an id that does not exist.
    #[error("{entity} not found: id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// File system failure during export/import.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
