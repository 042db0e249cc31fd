//! SQLite connection for the registry store
//!
//! Snapshot loads open the database read-write. Hosts that only run lenses can
//! open it read-only, typically one connection per thread. Every connection waits
//! up to [`BUSY_TIMEOUT`] for a lock held by another connection instead of failing
//! with `SQLITE_BUSY`.

use anyhow::{anyhow, Result};
use rusqlite::{Connection, OpenFlags, Transaction};
use std::time::Duration;

/// How long a statement waits for a lock held by another connection
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How a registry connection may touch the database file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Creates the file when missing; schema changes and snapshot loads allowed
    ReadWrite,
    /// Lens-only access; the file must already exist
    ReadOnly,
}

/// SQLite connection wrapper used by the registry repositories
pub struct DatabaseConn {
    pub conn: Connection,
    mode: AccessMode,
}

impl DatabaseConn {
    /// Open the database file at `path`
    pub fn open(path: &str, mode: AccessMode) -> Result<Self> {
        let flags = match mode {
            AccessMode::ReadWrite => {
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            AccessMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
        } | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            anyhow!(
                "Failed to open registry database at '{}' ({:?}): {}",
                path,
                mode,
                e
            )
        })?;
        Self::configure(conn, mode)
    }

    /// Create an empty in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?;
        Self::configure(conn, AccessMode::ReadWrite)
    }

    fn configure(conn: Connection, mode: AccessMode) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| anyhow!("Failed to set busy timeout: {}", e))?;

        if mode == AccessMode::ReadWrite {
            // WAL keeps readers unblocked while a snapshot load commits
            let _: String = conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| anyhow!("Failed to set journal mode: {}", e))?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(|e| anyhow!("Failed to set synchronous mode: {}", e))?;
        }

        conn.pragma_update(None, "temp_store", "MEMORY")
            .map_err(|e| anyhow!("Failed to set temp store: {}", e))?;

        Ok(Self { conn, mode })
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Begin the transaction a snapshot load runs in
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        if self.mode == AccessMode::ReadOnly {
            return Err(anyhow!("Registry database is open read-only"));
        }
        self.conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin transaction: {}", e))
    }
}
