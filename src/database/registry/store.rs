//! Store access interface consumed by the lenses
//!
//! Every aggregation in `lens` reads through [`RegistryStore`], never through a
//! concrete database type, so tests can substitute an in-memory fake.

use super::records::{
    AsnRecord, BgpEntryRecord, EmailRecord, IpVersion, PeerPairRecord, PrefixRecord,
    PrefixWhoisRecord,
};
use rusqlite::ErrorCode;
use std::collections::HashMap;
use std::fmt;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of the underlying store
///
/// Never produced for missing or malformed data; those degrade to `None`/empty
/// values in the lenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (cannot open, busy, locked, I/O failure)
    Unavailable(String),
    /// A query against `table` failed
    Query { table: String, message: String },
}

impl StoreError {
    /// Classify a SQLite error raised while querying `table`
    pub fn from_sqlite(table: &str, err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::SystemIoFailure,
            ) => StoreError::Unavailable(format!("{}: {}", table, err)),
            _ => StoreError::Query {
                table: table.to_string(),
                message: err.to_string(),
            },
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Registry store unavailable: {}", msg),
            StoreError::Query { table, message } => {
                write!(f, "Query on '{}' failed: {}", table, message)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Read access to ASN, prefix, WHOIS, RIR, BGP entry and peering records
///
/// Lookups of records that do not exist return `Ok(None)` or an empty
/// collection; `Err` is reserved for the store itself failing.
pub trait RegistryStore {
    /// Single ASN record by AS number
    fn asn(&self, asn: u32) -> StoreResult<Option<AsnRecord>>;

    /// ASN records for a set of AS numbers, keyed by AS number; unknown ASNs are absent
    fn asns_by_number(&self, asns: &[u32]) -> StoreResult<HashMap<u32, AsnRecord>>;

    /// Emails linked to an ASN row
    fn asn_emails(&self, asn_id: i64) -> StoreResult<Vec<EmailRecord>>;

    /// Every RIR, id to name
    fn rir_names(&self) -> StoreResult<HashMap<u32, String>>;

    /// Prefixes originated by `asn`, in store order
    fn prefixes_by_asn(&self, version: IpVersion, asn: u32) -> StoreResult<Vec<PrefixRecord>>;

    /// The prefix with exactly this network address and length
    fn prefix_by_network(
        &self,
        version: IpVersion,
        ip: &str,
        cidr: u8,
    ) -> StoreResult<Option<PrefixRecord>>;

    /// WHOIS records linked to the given prefix row ids, keyed by prefix id
    ///
    /// When several WHOIS rows link to one prefix, the lowest row id wins.
    fn prefix_whois_by_prefix(
        &self,
        version: IpVersion,
        prefix_ids: &[i64],
    ) -> StoreResult<HashMap<i64, PrefixWhoisRecord>>;

    /// Emails linked to a prefix WHOIS row
    fn prefix_whois_emails(
        &self,
        version: IpVersion,
        prefix_whois_id: i64,
    ) -> StoreResult<Vec<EmailRecord>>;

    /// Peering rows where `asn` appears in either column, in store order
    fn peer_pairs(&self, version: IpVersion, asn: u32) -> StoreResult<Vec<PeerPairRecord>>;

    /// BGP entries with `asn` as the AS itself, ordered by `asn` then store order
    fn bgp_entries_by_asn(&self, version: IpVersion, asn: u32)
        -> StoreResult<Vec<BgpEntryRecord>>;

    /// BGP entries with `asn` as the upstream, ordered by `upstream_asn` then store order
    fn bgp_entries_by_upstream(
        &self,
        version: IpVersion,
        asn: u32,
    ) -> StoreResult<Vec<BgpEntryRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StoreError::Query {
            table: "ipv4_peers".to_string(),
            message: "no such column".to_string(),
        };
        assert_eq!(err.to_string(), "Query on 'ipv4_peers' failed: no such column");
        assert!(!err.is_unavailable());

        let err = StoreError::Unavailable("connection refused".to_string());
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_from_sqlite_query_error() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn
            .execute("SELECT * FROM missing_table", [])
            .unwrap_err();
        let store_err = StoreError::from_sqlite("missing_table", err);
        assert!(matches!(store_err, StoreError::Query { ref table, .. } if table == "missing_table"));
    }
}
