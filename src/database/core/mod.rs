//! Core database infrastructure
//!
//! This module provides the foundational database components used by the registry store:
//! - `DatabaseConn`: SQLite connection wrapper, read-write or read-only (`AccessMode`)
//! - `SchemaManager`: Schema initialization and management
//! - `SchemaStatus`: Schema state enumeration

mod connection;
mod schema;

pub use connection::{AccessMode, DatabaseConn, BUSY_TIMEOUT};
pub use schema::{SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION};
