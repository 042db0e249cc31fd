//! Routing repository
//!
//! Data access for BGP entries (AS-path hops) and peering adjacencies of one
//! IP version.

use super::records::{BgpEntryRecord, IpVersion, PeerPairRecord};
use super::store::{StoreError, StoreResult};
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, Row};

/// Repository for BGP entry and peer data of one IP version
pub struct RoutingRepository<'a> {
    conn: &'a Connection,
    version: IpVersion,
}

fn row_to_entry(row: &Row) -> rusqlite::Result<BgpEntryRecord> {
    Ok(BgpEntryRecord {
        ip: row.get(0)?,
        cidr: row.get(1)?,
        asn: row.get(2)?,
        upstream_asn: row.get(3)?,
        bgp_path: row.get(4)?,
    })
}

impl<'a> RoutingRepository<'a> {
    pub fn new(conn: &'a Connection, version: IpVersion) -> Self {
        Self { conn, version }
    }

    /// Insert a BGP entry
    pub fn insert_entry(&self, entry: &BgpEntryRecord) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (ip, cidr, asn, upstream_asn, bgp_path) VALUES (?1, ?2, ?3, ?4, ?5)",
            self.version.bgp_entries_table()
        );
        self.conn
            .execute(
                &sql,
                params![
                    entry.ip,
                    entry.cidr,
                    entry.asn,
                    entry.upstream_asn,
                    entry.bgp_path
                ],
            )
            .map_err(|e| {
                anyhow!(
                    "Failed to insert {} BGP entry AS{} -> AS{}: {}",
                    self.version,
                    entry.asn,
                    entry.upstream_asn,
                    e
                )
            })?;
        Ok(())
    }

    /// Insert a peering adjacency
    pub fn insert_peer(&self, pair: &PeerPairRecord) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (asn_1, asn_2) VALUES (?1, ?2)",
            self.version.peers_table()
        );
        self.conn
            .execute(&sql, params![pair.asn_1, pair.asn_2])
            .map_err(|e| {
                anyhow!(
                    "Failed to insert {} peer AS{} <-> AS{}: {}",
                    self.version,
                    pair.asn_1,
                    pair.asn_2,
                    e
                )
            })?;
        Ok(())
    }

    /// Entries where `asn` is the AS itself (its upstream paths)
    pub fn entries_by_asn(&self, asn: u32) -> StoreResult<Vec<BgpEntryRecord>> {
        self.query_entries("asn", asn)
    }

    /// Entries where `asn` is the upstream (its downstream paths)
    pub fn entries_by_upstream(&self, asn: u32) -> StoreResult<Vec<BgpEntryRecord>> {
        self.query_entries("upstream_asn", asn)
    }

    fn query_entries(&self, column: &str, asn: u32) -> StoreResult<Vec<BgpEntryRecord>> {
        let table = self.version.bgp_entries_table();
        let sql = format!(
            "SELECT ip, cidr, asn, upstream_asn, bgp_path FROM {table}
             WHERE {column} = ?1
             ORDER BY {column} ASC, id ASC"
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| StoreError::from_sqlite(table, e))?;
        let rows = stmt
            .query_map([asn], row_to_entry)
            .map_err(|e| StoreError::from_sqlite(table, e))?;

        let entries = rows
            .map(|r| r.map_err(|e| StoreError::from_sqlite(table, e)))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// Peering rows where `asn` is on either side
    pub fn peers_of(&self, asn: u32) -> StoreResult<Vec<PeerPairRecord>> {
        let table = self.version.peers_table();
        let sql = format!(
            "SELECT asn_1, asn_2 FROM {} WHERE asn_1 = ?1 OR asn_2 = ?1 ORDER BY id",
            table
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| StoreError::from_sqlite(table, e))?;
        let rows = stmt
            .query_map([asn], |row| {
                Ok(PeerPairRecord {
                    asn_1: row.get(0)?,
                    asn_2: row.get(1)?,
                })
            })
            .map_err(|e| StoreError::from_sqlite(table, e))?;

        let pairs = rows
            .map(|r| r.map_err(|e| StoreError::from_sqlite(table, e)))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(pairs)
    }

    /// Get the count of BGP entries
    pub fn entry_count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.version.bgp_entries_table());
        self.conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to get {} BGP entry count: {}", self.version, e))
    }
}
