//! Table-change notification and live queries.
//!
//! # Responsibility
//! - Broadcast which table changed after each committed write.
//! - Re-run list queries when their source table changes.
//!
//! # Invariants
//! - Notifications are sent only after commit, never for rolled-back work.
//! - A live query never re-delivers for a change to an unrelated table.

pub mod notifier;
pub mod query;
