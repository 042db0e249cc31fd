//! ASN repository
//!
//! Data access for ASN records, their contact emails and the RIR reference table.

use super::records::{AsnRecord, EmailRecord, RirRecord, StoredLines};
use super::store::{StoreError, StoreResult};
use super::{insert_email, placeholders, query_emails};
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

const ASN_COLUMNS: &str =
    "id, rir_id, asn, name, description, description_full, country_code, owner_address, raw_whois";

/// Repository for ASN and RIR data
pub struct AsnRepository<'a> {
    conn: &'a Connection,
    batch_size: usize,
}

fn row_to_asn(row: &Row) -> rusqlite::Result<AsnRecord> {
    Ok(AsnRecord {
        id: row.get(0)?,
        rir_id: row.get(1)?,
        asn: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        description_full: row.get::<_, Option<String>>(5)?.map(StoredLines::Encoded),
        country_code: row.get(6)?,
        owner_address: row.get::<_, Option<String>>(7)?.map(StoredLines::Encoded),
        raw_whois: row.get(8)?,
    })
}

impl<'a> AsnRepository<'a> {
    /// Create a new ASN repository
    ///
    /// `batch_size` caps the number of ASNs per `IN (...)` lookup.
    pub fn new(conn: &'a Connection, batch_size: usize) -> Self {
        Self {
            conn,
            batch_size: batch_size.max(1),
        }
    }

    /// Check if no ASN records are stored
    pub fn is_empty(&self) -> bool {
        self.count().map(|c| c == 0).unwrap_or(true)
    }

    /// Get the count of ASN records
    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM asns", [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to get ASN count: {}", e))
    }

    /// Insert or replace a RIR
    pub fn insert_rir(&self, rir: &RirRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO rirs (id, name) VALUES (?1, ?2)",
                params![rir.id, rir.name],
            )
            .map_err(|e| anyhow!("Failed to insert RIR {}: {}", rir.id, e))?;
        Ok(())
    }

    /// Insert an ASN record, returning its row id
    pub fn insert(&self, record: &AsnRecord) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO asns (id, rir_id, asn, name, description, description_full, country_code, owner_address, raw_whois)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    (record.id > 0).then_some(record.id),
                    record.rir_id,
                    record.asn,
                    record.name,
                    record.description,
                    record.description_full.as_ref().map(StoredLines::to_column),
                    record.country_code,
                    record.owner_address.as_ref().map(StoredLines::to_column),
                    record.raw_whois,
                ],
            )
            .map_err(|e| anyhow!("Failed to insert AS{}: {}", record.asn, e))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert an email linked to an ASN row, returning its row id
    pub fn insert_email(&self, email: &EmailRecord) -> Result<i64> {
        insert_email(self.conn, "asn_emails", "asn_id", email)
    }

    /// Look up a single ASN
    pub fn get(&self, asn: u32) -> StoreResult<Option<AsnRecord>> {
        let sql = format!("SELECT {} FROM asns WHERE asn = ?1", ASN_COLUMNS);
        match self.conn.query_row(&sql, [asn], row_to_asn) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::from_sqlite("asns", e)),
        }
    }

    /// Look up many ASNs at once, keyed by AS number
    pub fn get_batch(&self, asns: &[u32]) -> StoreResult<HashMap<u32, AsnRecord>> {
        let mut result = HashMap::new();

        let mut unique = asns.to_vec();
        unique.sort_unstable();
        unique.dedup();

        for chunk in unique.chunks(self.batch_size) {
            let sql = format!(
                "SELECT {} FROM asns WHERE asn IN ({})",
                ASN_COLUMNS,
                placeholders(chunk.len())
            );
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| StoreError::from_sqlite("asns", e))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(chunk.iter()), row_to_asn)
                .map_err(|e| StoreError::from_sqlite("asns", e))?;
            for row in rows {
                let record = row.map_err(|e| StoreError::from_sqlite("asns", e))?;
                result.insert(record.asn, record);
            }
        }

        Ok(result)
    }

    /// Emails linked to an ASN row
    pub fn emails(&self, asn_id: i64) -> StoreResult<Vec<EmailRecord>> {
        query_emails(self.conn, "asn_emails", "asn_id", asn_id)
    }

    /// RIR id to name mapping
    pub fn rir_names(&self) -> StoreResult<HashMap<u32, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM rirs")
            .map_err(|e| StoreError::from_sqlite("rirs", e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| StoreError::from_sqlite("rirs", e))?;

        let names = rows
            .map(|r| r.map_err(|e| StoreError::from_sqlite("rirs", e)))
            .collect::<StoreResult<HashMap<u32, String>>>()?;
        Ok(names)
    }
}
