//! Unified error types and result handling.

use thiserror::Error;

use crate::core::leave::LeaveType;

/// Every failure the ledger can report to its caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied record or value failed a precondition
    #[error("Invalid leave record: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// `add` was given an id that is already in the store
    #[error("A leave record with id '{id}' already exists")]
    DuplicateId {
        /// The conflicting id
        id: String,
    },

    /// A strict lookup targeted an id that is not in the store
    #[error("Leave record not found: {id}")]
    LeaveNotFound {
        /// The missing id
        id: String,
    },

    /// No quota entry is configured for the given type
    #[error("No quota configured for leave type '{leave_type}'")]
    QuotaNotFound {
        /// The unconfigured type
        leave_type: LeaveType,
    },

    /// The durable key-value store rejected a read or write
    #[error("Persistence error: {message}")]
    Persistence {
        /// Description of the storage failure
        message: String,
    },

    /// An import document was malformed
    #[error("Invalid import document: {message}")]
    ImportFormat {
        /// Why the document was rejected
        message: String,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
