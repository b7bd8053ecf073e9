//! Core business logic - framework-agnostic leave records, quota reconciliation,
//! calendar queries, analytics and the ledger that ties them to storage.

/// Export/import documents
pub mod backup;
/// Day and range queries for calendar views
pub mod calendar;
/// Public holiday calendar
pub mod holidays;
/// Leave record and category types
pub mod leave;
/// The ledger store object
pub mod ledger;
/// Per-record metadata side-map
pub mod metadata;
/// Quota reconciliation
pub mod quota;
/// Insertion-ordered record store
pub mod records;
/// Quota progress and analytics
pub mod report;
