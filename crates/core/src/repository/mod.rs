//! Store-backed repositories, one per resource plus the audit trail.
//!
//! Every mutating operation runs inside a single transaction so its
//! existence check and write are atomic. Repositories take validated drafts
//! only; wire payloads never reach this layer.

pub mod audit;
pub mod observation;
pub mod patient;

/// True when the error is the store reporting a primary-key or unique-index
/// collision.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True when the error is the store rejecting a dangling foreign key.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
