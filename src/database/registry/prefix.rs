//! Prefix repository
//!
//! Data access for BGP prefixes and the WHOIS records of their covering
//! allocations. One repository instance serves one IP version.

use super::records::{EmailRecord, IpVersion, PrefixRecord, PrefixWhoisRecord, StoredLines};
use super::store::{StoreError, StoreResult};
use super::{insert_email, placeholders, query_emails};
use anyhow::{anyhow, Result};
use ipnet::IpNet;
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::net::IpAddr;

const PREFIX_COLUMNS: &str = "id, ip, cidr, ip_dec_start, ip_dec_end, asn, roa_status";

const WHOIS_COLUMNS: &str = "id, bgp_prefix_id, rir_id, ip, cidr, parent_ip, parent_cidr, name, \
     description_full, country_code, owner_address, raw_whois, status";

/// Repository for prefix and prefix WHOIS data of one IP version
pub struct PrefixRepository<'a> {
    conn: &'a Connection,
    version: IpVersion,
    batch_size: usize,
}

fn row_to_prefix(row: &Row) -> rusqlite::Result<PrefixRecord> {
    Ok(PrefixRecord {
        id: row.get(0)?,
        ip: row.get(1)?,
        cidr: row.get(2)?,
        ip_dec_start: row.get(3)?,
        ip_dec_end: row.get(4)?,
        asn: row.get(5)?,
        roa_status: row.get(6)?,
    })
}

fn row_to_whois(row: &Row) -> rusqlite::Result<PrefixWhoisRecord> {
    Ok(PrefixWhoisRecord {
        id: row.get(0)?,
        bgp_prefix_id: row.get(1)?,
        rir_id: row.get(2)?,
        ip: row.get(3)?,
        cidr: row.get(4)?,
        parent_ip: row.get(5)?,
        parent_cidr: row.get(6)?,
        name: row.get(7)?,
        description_full: row.get::<_, Option<String>>(8)?.map(StoredLines::Encoded),
        country_code: row.get(9)?,
        owner_address: row.get::<_, Option<String>>(10)?.map(StoredLines::Encoded),
        raw_whois: row.get(11)?,
        status: row.get(12)?,
    })
}

/// Decimal-encoded first and last address of `ip/cidr`
///
/// Returns `None` when the pair is not a valid network for `version`.
pub fn decimal_bounds(version: IpVersion, ip: &str, cidr: u8) -> Option<(String, String)> {
    let net: IpNet = format!("{}/{}", ip, cidr).parse().ok()?;
    let to_decimal = |addr: IpAddr| match addr {
        IpAddr::V4(v4) => u32::from(v4).to_string(),
        IpAddr::V6(v6) => u128::from(v6).to_string(),
    };

    match (version, &net) {
        (IpVersion::Ipv4, IpNet::V4(_)) | (IpVersion::Ipv6, IpNet::V6(_)) => {
            Some((to_decimal(net.network()), to_decimal(net.broadcast())))
        }
        _ => None,
    }
}

impl<'a> PrefixRepository<'a> {
    pub fn new(conn: &'a Connection, version: IpVersion, batch_size: usize) -> Self {
        Self {
            conn,
            version,
            batch_size: batch_size.max(1),
        }
    }

    /// Get the count of prefix records
    pub fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.version.prefixes_table());
        self.conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to get {} prefix count: {}", self.version, e))
    }

    /// Insert a prefix, returning its row id
    ///
    /// Missing decimal bounds are derived from `ip`/`cidr`; a prefix that is not
    /// a valid network for this repository's IP version is rejected.
    pub fn insert(&self, record: &PrefixRecord) -> Result<i64> {
        let (start, end) = match (&record.ip_dec_start, &record.ip_dec_end) {
            (Some(start), Some(end)) => (start.clone(), end.clone()),
            _ => decimal_bounds(self.version, &record.ip, record.cidr).ok_or_else(|| {
                anyhow!("Invalid {} prefix {}", self.version, record.prefix())
            })?,
        };

        let sql = format!(
            "INSERT INTO {} (id, ip, cidr, ip_dec_start, ip_dec_end, asn, roa_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            self.version.prefixes_table()
        );
        self.conn
            .execute(
                &sql,
                params![
                    (record.id > 0).then_some(record.id),
                    record.ip,
                    record.cidr,
                    start,
                    end,
                    record.asn,
                    record.roa_status,
                ],
            )
            .map_err(|e| anyhow!("Failed to insert prefix {}: {}", record.prefix(), e))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a prefix WHOIS record, returning its row id
    pub fn insert_whois(&self, record: &PrefixWhoisRecord) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {} (id, bgp_prefix_id, rir_id, ip, cidr, parent_ip, parent_cidr, name,
                 description_full, country_code, owner_address, raw_whois, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            self.version.prefix_whois_table()
        );
        self.conn
            .execute(
                &sql,
                params![
                    (record.id > 0).then_some(record.id),
                    record.bgp_prefix_id,
                    record.rir_id,
                    record.ip,
                    record.cidr,
                    record.parent_ip,
                    record.parent_cidr,
                    record.name,
                    record.description_full.as_ref().map(StoredLines::to_column),
                    record.country_code,
                    record.owner_address.as_ref().map(StoredLines::to_column),
                    record.raw_whois,
                    record.status,
                ],
            )
            .map_err(|e| {
                anyhow!(
                    "Failed to insert WHOIS for {}/{}: {}",
                    record.ip,
                    record.cidr,
                    e
                )
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert an email linked to a prefix WHOIS row, returning its row id
    pub fn insert_whois_email(&self, email: &EmailRecord) -> Result<i64> {
        insert_email(
            self.conn,
            self.version.prefix_whois_emails_table(),
            "prefix_whois_id",
            email,
        )
    }

    /// Prefixes originated by `asn`
    pub fn by_asn(&self, asn: u32) -> StoreResult<Vec<PrefixRecord>> {
        let table = self.version.prefixes_table();
        let sql = format!(
            "SELECT {} FROM {} WHERE asn = ?1 ORDER BY id",
            PREFIX_COLUMNS, table
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| StoreError::from_sqlite(table, e))?;
        let rows = stmt
            .query_map([asn], row_to_prefix)
            .map_err(|e| StoreError::from_sqlite(table, e))?;

        let prefixes = rows
            .map(|r| r.map_err(|e| StoreError::from_sqlite(table, e)))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(prefixes)
    }

    /// Prefix with exactly this network address and length
    pub fn by_network(&self, ip: &str, cidr: u8) -> StoreResult<Option<PrefixRecord>> {
        let table = self.version.prefixes_table();
        let sql = format!(
            "SELECT {} FROM {} WHERE ip = ?1 AND cidr = ?2 ORDER BY id LIMIT 1",
            PREFIX_COLUMNS, table
        );

        match self.conn.query_row(&sql, params![ip, cidr], row_to_prefix) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::from_sqlite(table, e)),
        }
    }

    /// WHOIS records linked to the given prefix ids, keyed by prefix id
    pub fn whois_for_prefixes(
        &self,
        prefix_ids: &[i64],
    ) -> StoreResult<HashMap<i64, PrefixWhoisRecord>> {
        let table = self.version.prefix_whois_table();
        let mut result = HashMap::new();

        let mut unique = prefix_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        for chunk in unique.chunks(self.batch_size) {
            let sql = format!(
                "SELECT {} FROM {} WHERE bgp_prefix_id IN ({}) ORDER BY id",
                WHOIS_COLUMNS,
                table,
                placeholders(chunk.len())
            );
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| StoreError::from_sqlite(table, e))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(chunk.iter()), row_to_whois)
                .map_err(|e| StoreError::from_sqlite(table, e))?;

            for row in rows {
                let record = row.map_err(|e| StoreError::from_sqlite(table, e))?;
                if let Some(prefix_id) = record.bgp_prefix_id {
                    result.entry(prefix_id).or_insert(record);
                }
            }
        }

        Ok(result)
    }

    /// Emails linked to a prefix WHOIS row
    pub fn whois_emails(&self, prefix_whois_id: i64) -> StoreResult<Vec<EmailRecord>> {
        query_emails(
            self.conn,
            self.version.prefix_whois_emails_table(),
            "prefix_whois_id",
            prefix_whois_id,
        )
    }
}
