//! Repository ports and their SQLite adapters.
//!
//! # Responsibility
//! - Define one persistence trait per entity family; services only see
//!   these traits.
//! - Keep SQL, transactions and cascade sequences inside the adapters.
//!
//! # Invariants
//! - Adapters are only built on connections migrated to `latest_version()`.
//! - Check-then-insert and cascade deletes run in one `BEGIN IMMEDIATE`
//!   transaction each.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::class::Entity;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attribute_repo;
pub mod board_repo;
pub mod comment_repo;
pub mod item_repo;
pub mod setting_repo;
pub mod user_repo;

use attribute_repo::{AttributeRepository, SqliteAttributeRepository};
use board_repo::{BoardRepository, SqliteBoardRepository};
use comment_repo::{CommentRepository, SqliteCommentRepository};
use item_repo::{ItemRepository, SqliteItemRepository};
use setting_repo::{SettingRepository, SqliteSettingRepository};
use user_repo::{SqliteUserRepository, UserRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failures and semantic lookup results from adapters.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        entity: Entity,
        id: i64,
    },
    /// Unique key already taken.
    Duplicate(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Duplicate(message) => write!(f, "duplicate: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "repository requires table `{table}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
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

/// Rows removed by one cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub items: usize,
    pub comments: usize,
}

/// Borrowed set of repository ports handed to services.
///
/// Trait objects keep services independent from the storage adapter, so
/// tests and alternative stores can plug in their own implementations.
#[derive(Clone, Copy)]
pub struct Repositories<'r> {
    pub users: &'r dyn UserRepository,
    pub boards: &'r dyn BoardRepository,
    pub attributes: &'r dyn AttributeRepository,
    pub items: &'r dyn ItemRepository,
    pub comments: &'r dyn CommentRepository,
    pub settings: &'r dyn SettingRepository,
}

/// All SQLite adapters sharing one connection.
pub struct SqliteRepositories<'conn> {
    users: SqliteUserRepository<'conn>,
    boards: SqliteBoardRepository<'conn>,
    attributes: SqliteAttributeRepository<'conn>,
    items: SqliteItemRepository<'conn>,
    comments: SqliteCommentRepository<'conn>,
    settings: SqliteSettingRepository<'conn>,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            users: SqliteUserRepository::try_new(conn)?,
            boards: SqliteBoardRepository::try_new(conn)?,
            attributes: SqliteAttributeRepository::try_new(conn)?,
            items: SqliteItemRepository::try_new(conn)?,
            comments: SqliteCommentRepository::try_new(conn)?,
            settings: SqliteSettingRepository::try_new(conn)?,
        })
    }

    pub fn ports(&self) -> Repositories<'_> {
        Repositories {
            users: &self.users,
            boards: &self.boards,
            attributes: &self.attributes,
            items: &self.items,
            comments: &self.comments,
            settings: &self.settings,
        }
    }
}

/// Verifies schema version and required tables before an adapter is built.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
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
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
