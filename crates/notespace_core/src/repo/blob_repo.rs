//! Blob repository contract with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Provide `get`/`set` of named UTF-8 blobs.
//! - Surface backend failures as `RepoError`; callers decide the policy.
//!
//! # Invariants
//! - `set_blobs` on SQLite writes every entry in one transaction.
//! - Keys are case-sensitive and stored verbatim.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for blob store access.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Store cannot be reached at all (e.g. disabled or detached backend).
    Unavailable(&'static str),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(reason) => write!(f, "blob store unavailable: {reason}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "blob store is missing required table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) | Self::MissingRequiredTable(_) => None,
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

/// Opaque named-blob storage.
pub trait BlobRepository {
    /// Returns the blob stored under `key`, or `None` when absent.
    fn get_blob(&self, key: &str) -> RepoResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_blob(&mut self, key: &str, value: &str) -> RepoResult<()>;

    /// Stores several blobs as one logical write.
    ///
    /// The default implementation writes entries one by one.
    fn set_blobs(&mut self, entries: &[(&str, String)]) -> RepoResult<()> {
        for (key, value) in entries {
            self.set_blob(key, value)?;
        }
        Ok(())
    }
}

/// SQLite-backed blob repository over the `blobs` table.
pub struct SqliteBlobRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBlobRepository<'conn> {
    /// Wraps a migrated connection, verifying the `blobs` table exists.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'blobs'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable("blobs"));
        }
        Ok(Self { conn })
    }
}

const UPSERT_BLOB_SQL: &str = "INSERT INTO blobs (key, value, updated_at)
     VALUES (?1, ?2, strftime('%s', 'now') * 1000)
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at;";

impl BlobRepository for SqliteBlobRepository<'_> {
    fn get_blob(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1;", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_blob(&mut self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(UPSERT_BLOB_SQL, params![key, value])?;
        Ok(())
    }

    fn set_blobs(&mut self, entries: &[(&str, String)]) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (key, value) in entries {
            tx.execute(UPSERT_BLOB_SQL, params![key, value.as_str()])?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// In-process blob repository.
///
/// Useful for embedding without a database and for exercising
/// store-unavailable paths: reads and writes can be made to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobRepository {
    blobs: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    write_count: usize,
}

impl MemoryBlobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent read fail with `RepoError::Unavailable`.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Makes every subsequent write fail with `RepoError::Unavailable`.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful write calls (`set_blob` or `set_blobs`).
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    /// Raw blob lookup that bypasses failure injection.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.blobs.get(key).map(String::as_str)
    }
}

impl BlobRepository for MemoryBlobRepository {
    fn get_blob(&self, key: &str) -> RepoResult<Option<String>> {
        if self.fail_reads {
            return Err(RepoError::Unavailable("reads disabled"));
        }
        Ok(self.blobs.get(key).cloned())
    }

    fn set_blob(&mut self, key: &str, value: &str) -> RepoResult<()> {
        if self.fail_writes {
            return Err(RepoError::Unavailable("writes disabled"));
        }
        self.blobs.insert(key.to_string(), value.to_string());
        self.write_count += 1;
        Ok(())
    }

    fn set_blobs(&mut self, entries: &[(&str, String)]) -> RepoResult<()> {
        if self.fail_writes {
            return Err(RepoError::Unavailable("writes disabled"));
        }
        for (key, value) in entries {
            self.blobs.insert((*key).to_string(), value.clone());
        }
        self.write_count += 1;
        Ok(())
    }
}
