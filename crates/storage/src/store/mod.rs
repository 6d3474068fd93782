#![forbid(unsafe_code)]

mod append;
mod error;
mod query;
mod relocate;
mod rows;
mod support;

pub use error::{ErrorKind, StoreError};
pub use rows::*;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_FILE_NAME: &str = "versioned_graph.db";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogLocation {
    /// Private in-memory database, gone when the log is dropped.
    Memory,
    /// `DB_FILE_NAME` inside this directory; the directory is created on open.
    Directory(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    pub location: LogLocation,
    pub busy_timeout: Duration,
}

impl LogConfig {
    pub fn in_memory() -> Self {
        Self {
            location: LogLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn directory(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            location: LogLocation::Directory(storage_dir.as_ref().to_path_buf()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Durable, append-only record of every committed triple operation.
///
/// Rows live in one of two tables, the active log and the redo log, and are
/// only ever moved between them as whole changesets.
#[derive(Debug)]
pub struct DeltaLog {
    conn: Connection,
    location: LogLocation,
}

impl DeltaLog {
    pub fn open(config: &LogConfig) -> Result<Self, StoreError> {
        let conn = match &config.location {
            LogLocation::Memory => Connection::open_in_memory()?,
            LogLocation::Directory(storage_dir) => {
                std::fs::create_dir_all(storage_dir)?;
                let conn = Connection::open(storage_dir.join(DB_FILE_NAME))?;
                // Rows must be on disk before the live graph is allowed to move.
                conn.execute_batch(
                    r#"
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=FULL;
                    "#,
                )?;
                conn
            }
        };
        conn.busy_timeout(config.busy_timeout)?;

        support::install_schema(&conn)?;

        tracing::debug!(location = ?config.location, "delta log opened");
        Ok(Self {
            conn,
            location: config.location.clone(),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(&LogConfig::in_memory())
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        match &self.location {
            LogLocation::Memory => None,
            LogLocation::Directory(storage_dir) => Some(storage_dir.join(DB_FILE_NAME)),
        }
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, err)| StoreError::Sql(err))
    }
}
