//! Domain model for the task/folder store.
//!
//! # Responsibility
//! - Define the records persisted in `tasks` and `folders`.
//! - Own the closed enumerations and their string codecs.
//! - Own the display ordering shared by SQL and in-memory sorting.
//!
//! # Invariants
//! - Id `0` means "not persisted yet"; stored ids are positive.
//! - Required fields are non-optional in Rust, so writes can never bind NULL
//!   for them.

pub mod folder;
pub mod task;
pub mod time;
