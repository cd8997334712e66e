//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define task/folder data access contracts.
//! - Isolate SQL, column codecs and transaction scoping from services.
//!
//! # Invariants
//! - Every write runs inside a transaction: its own, or the enclosing batch.
//! - Write paths validate before SQL.
//! - Read paths reject only rows that cannot be decoded (NULL in a required
//!   column, unknown enum name, malformed timestamp); nothing is defaulted.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::live::notifier::{ChangeNotifier, TableChange, TouchedTables};
use crate::model::task::ValidationError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod folder_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task/folder persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    /// Record rejected before reaching SQL.
    Validation(ValidationError),
    /// Storage or constraint failure reported by SQLite.
    Db(DbError),
    /// Keyed write matched no row.
    NotFound { table: &'static str, id: i64 },
    /// Persisted row cannot be materialized (NULL in a required column,
    /// unknown enum name, malformed timestamp).
    InvalidData(String),
    /// Connection was not bootstrapped through `db::open_db*`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "{table} row not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Where a repository write gets its atomicity from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum WriteScope<'a> {
    /// Opens and commits its own transaction, then notifies observers.
    Standalone(Option<&'a ChangeNotifier>),
    /// Runs inside a caller-owned transaction; records the touched table so
    /// the owner can notify after its commit.
    Enclosing(&'a Cell<TouchedTables>),
}

impl WriteScope<'_> {
    pub(crate) fn run<T>(
        self,
        conn: &Connection,
        table: TableChange,
        write: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        match self {
            Self::Standalone(notifier) => {
                let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
                let value = write(&tx)?;
                tx.commit()?;
                if let Some(notifier) = notifier {
                    notifier.notify(table);
                }
                Ok(value)
            }
            Self::Enclosing(touched) => {
                let value = write(conn)?;
                touched.set(touched.get().with(table));
                Ok(value)
            }
        }
    }
}

/// Rejects connections that skipped bootstrap or run an older schema.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}
