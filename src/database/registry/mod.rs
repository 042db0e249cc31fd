//! Registry database storage
//!
//! The SQLite-backed store holding ASN, prefix, prefix WHOIS, RIR, email, BGP entry
//! and peering records. Lenses never use [`RegistryDatabase`] directly; they read
//! through the [`RegistryStore`] trait it implements.

mod asn;
mod loader;
mod prefix;
mod records;
mod routing;
mod store;

pub use asn::AsnRepository;
pub use loader::{RegistrySnapshot, SnapshotCounts, VersionedSnapshot};
pub use prefix::{decimal_bounds, PrefixRepository};
pub use records::{
    AsnRecord, BgpEntryRecord, EmailRecord, IpVersion, PeerPairRecord, PrefixRecord,
    PrefixWhoisRecord, RirRecord, StoredLines,
};
pub use routing::RoutingRepository;
pub use store::{RegistryStore, StoreError, StoreResult};

use crate::config::DEFAULT_DATABASE_FILE;
use crate::database::core::{AccessMode, DatabaseConn, SchemaManager, SchemaStatus};
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use tracing::info;

/// Default number of ids per `IN (...)` batch lookup
pub const DEFAULT_BATCH_LOOKUP_SIZE: usize = 500;

/// Registry database (SQLite backend)
///
/// Handles schema initialization and hands out per-table repositories.
pub struct RegistryDatabase {
    db: DatabaseConn,
    batch_size: usize,
}

impl RegistryDatabase {
    /// Open the registry database at the specified path
    ///
    /// A missing database is created. An outdated, newer or corrupted schema is
    /// reset, and data must be loaded again.
    pub fn open(path: &str) -> Result<Self> {
        let db = DatabaseConn::open(path, AccessMode::ReadWrite)?;
        let schema = SchemaManager::new(&db.conn);

        match schema.check_status()? {
            SchemaStatus::Current => {
                info!("Registry database schema is current");
            }
            SchemaStatus::NotInitialized => {
                info!("Initializing registry database schema");
                schema.initialize()?;
            }
            SchemaStatus::NeedsMigration { from, to } => {
                info!("Registry database needs migration from v{} to v{}", from, to);
                schema.reset()?;
                schema.initialize()?;
            }
            SchemaStatus::Incompatible {
                database_version,
                required_version,
            } => {
                info!(
                    "Registry database schema incompatible (db: v{}, required: v{}), resetting",
                    database_version, required_version
                );
                schema.reset()?;
                schema.initialize()?;
            }
            SchemaStatus::Corrupted => {
                info!("Registry database schema corrupted, resetting");
                schema.reset()?;
                schema.initialize()?;
            }
        }

        Ok(Self {
            db,
            batch_size: DEFAULT_BATCH_LOOKUP_SIZE,
        })
    }

    /// Open an existing registry database without modifying it
    ///
    /// For hosts that only run lenses. The schema must be current; anything else
    /// is an error and the file is left untouched.
    pub fn open_read_only(path: &str) -> Result<Self> {
        let db = DatabaseConn::open(path, AccessMode::ReadOnly)?;
        let status = SchemaManager::new(&db.conn).check_status()?;
        if status != SchemaStatus::Current {
            return Err(anyhow!(
                "Registry database at '{}' is not ready for reading ({:?}); open it read-write first",
                path,
                status
            ));
        }

        Ok(Self {
            db,
            batch_size: DEFAULT_BATCH_LOOKUP_SIZE,
        })
    }

    /// Open the registry database from a data directory, creating the directory
    ///
    /// Uses the standard file path `{data_dir}/bgpview-data.sqlite3`.
    pub fn open_in_dir(data_dir: &str) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| anyhow!("Failed to create data directory {}: {}", data_dir, e))?;
        let path = format!(
            "{}/{}",
            data_dir.trim_end_matches('/'),
            DEFAULT_DATABASE_FILE
        );
        Self::open(&path)
    }

    /// Create an in-memory registry database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let db = DatabaseConn::open_in_memory()?;
        SchemaManager::new(&db.conn).initialize()?;
        Ok(Self {
            db,
            batch_size: DEFAULT_BATCH_LOOKUP_SIZE,
        })
    }

    /// Override the number of ids per batch lookup
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn asns(&self) -> AsnRepository<'_> {
        AsnRepository::new(&self.db.conn, self.batch_size)
    }

    pub fn prefixes(&self, version: IpVersion) -> PrefixRepository<'_> {
        PrefixRepository::new(&self.db.conn, version, self.batch_size)
    }

    pub fn routing(&self, version: IpVersion) -> RoutingRepository<'_> {
        RoutingRepository::new(&self.db.conn, version)
    }

    /// Get the underlying database connection (for advanced queries)
    pub fn connection(&self) -> &Connection {
        &self.db.conn
    }

    /// Get metadata value from the database
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        SchemaManager::new(&self.db.conn).get_meta(key)
    }

    /// Set metadata value in the database
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        SchemaManager::new(&self.db.conn).set_meta(key, value)
    }
}

impl RegistryStore for RegistryDatabase {
    fn asn(&self, asn: u32) -> StoreResult<Option<AsnRecord>> {
        self.asns().get(asn)
    }

    fn asns_by_number(&self, asns: &[u32]) -> StoreResult<HashMap<u32, AsnRecord>> {
        self.asns().get_batch(asns)
    }

    fn asn_emails(&self, asn_id: i64) -> StoreResult<Vec<EmailRecord>> {
        self.asns().emails(asn_id)
    }

    fn rir_names(&self) -> StoreResult<HashMap<u32, String>> {
        self.asns().rir_names()
    }

    fn prefixes_by_asn(&self, version: IpVersion, asn: u32) -> StoreResult<Vec<PrefixRecord>> {
        self.prefixes(version).by_asn(asn)
    }

    fn prefix_by_network(
        &self,
        version: IpVersion,
        ip: &str,
        cidr: u8,
    ) -> StoreResult<Option<PrefixRecord>> {
        self.prefixes(version).by_network(ip, cidr)
    }

    fn prefix_whois_by_prefix(
        &self,
        version: IpVersion,
        prefix_ids: &[i64],
    ) -> StoreResult<HashMap<i64, PrefixWhoisRecord>> {
        self.prefixes(version).whois_for_prefixes(prefix_ids)
    }

    fn prefix_whois_emails(
        &self,
        version: IpVersion,
        prefix_whois_id: i64,
    ) -> StoreResult<Vec<EmailRecord>> {
        self.prefixes(version).whois_emails(prefix_whois_id)
    }

    fn peer_pairs(&self, version: IpVersion, asn: u32) -> StoreResult<Vec<PeerPairRecord>> {
        self.routing(version).peers_of(asn)
    }

    fn bgp_entries_by_asn(
        &self,
        version: IpVersion,
        asn: u32,
    ) -> StoreResult<Vec<BgpEntryRecord>> {
        self.routing(version).entries_by_asn(asn)
    }

    fn bgp_entries_by_upstream(
        &self,
        version: IpVersion,
        asn: u32,
    ) -> StoreResult<Vec<BgpEntryRecord>> {
        self.routing(version).entries_by_upstream(asn)
    }
}

/// `?,?,...,?` with `count` placeholders
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

fn insert_email(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    email: &EmailRecord,
) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {} (id, {}, email_address, abuse_email) VALUES (?1, ?2, ?3, ?4)",
        table, owner_column
    );
    conn.execute(
        &sql,
        params![
            (email.id > 0).then_some(email.id),
            email.owner_id,
            email.email_address,
            email.abuse_email
        ],
    )
    .map_err(|e| anyhow!("Failed to insert email into {}: {}", table, e))?;
    Ok(conn.last_insert_rowid())
}

fn query_emails(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner_id: i64,
) -> StoreResult<Vec<EmailRecord>> {
    let sql = format!(
        "SELECT id, {col}, email_address, abuse_email FROM {table} WHERE {col} = ?1 ORDER BY id",
        col = owner_column,
        table = table
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StoreError::from_sqlite(table, e))?;
    let rows = stmt
        .query_map([owner_id], |row| {
            Ok(EmailRecord {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                email_address: row.get(2)?,
                abuse_email: row.get(3)?,
            })
        })
        .map_err(|e| StoreError::from_sqlite(table, e))?;

    let emails = rows
        .map(|r| r.map_err(|e| StoreError::from_sqlite(table, e)))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(emails)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = RegistryDatabase::open_in_memory().unwrap();
        assert!(db.asns().is_empty());
    }

    #[test]
    fn test_open_in_dir_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();

        {
            let db = RegistryDatabase::open_in_dir(data_dir).unwrap();
            db.asns()
                .insert(&AsnRecord {
                    asn: 65000,
                    ..Default::default()
                })
                .unwrap();
        }

        let db = RegistryDatabase::open_in_dir(data_dir).unwrap();
        assert!(db.asn(65000).unwrap().is_some());
        assert!(dir.path().join(DEFAULT_DATABASE_FILE).exists());
    }

    #[test]
    fn test_open_in_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested/data");

        RegistryDatabase::open_in_dir(data_dir.to_str().unwrap()).unwrap();
        assert!(data_dir.join(DEFAULT_DATABASE_FILE).exists());
    }

    #[test]
    fn test_open_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_DATABASE_FILE);
        let path = path.to_str().unwrap();

        {
            let db = RegistryDatabase::open(path).unwrap();
            db.asns()
                .insert(&AsnRecord {
                    asn: 65000,
                    ..Default::default()
                })
                .unwrap();
        }

        let db = RegistryDatabase::open_read_only(path).unwrap();
        assert!(db.asn(65000).unwrap().is_some());
        assert!(db.set_meta("source", "reader").is_err());
    }

    #[test]
    fn test_open_read_only_keeps_outdated_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_DATABASE_FILE);
        let path = path.to_str().unwrap();

        {
            let db = RegistryDatabase::open(path).unwrap();
            db.set_meta("schema_version", "999").unwrap();
        }

        assert!(RegistryDatabase::open_read_only(path).is_err());

        let conn = DatabaseConn::open(path, AccessMode::ReadOnly).unwrap();
        let version = SchemaManager::new(&conn.conn).get_meta("schema_version").unwrap();
        assert_eq!(version, Some("999".to_string()));
    }

    #[test]
    fn test_open_read_only_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_DATABASE_FILE);

        assert!(RegistryDatabase::open_read_only(path.to_str().unwrap()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?,?,?");
    }

    #[test]
    fn test_store_surfaces_query_failure() {
        let db = RegistryDatabase::open_in_memory().unwrap();
        db.connection().execute("DROP TABLE ipv4_peers", []).unwrap();

        let err = db.peer_pairs(IpVersion::Ipv4, 65000).unwrap_err();
        assert!(matches!(err, StoreError::Query { ref table, .. } if table == "ipv4_peers"));
    }
}
