//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into application-level operations.
//! - Keep callers (CLI, future UI bindings) decoupled from SQL details.

pub mod backup;
pub mod task_service;
