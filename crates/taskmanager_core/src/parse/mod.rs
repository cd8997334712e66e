//! Free-text input parsing.

pub mod quick_add;
