//! Row types for the registry store
//!
//! One concrete type per stored entity. Fields mirror the table columns; JSON-bearing
//! columns (`description_full`, `owner_address`) are carried as [`StoredLines`] and only
//! decoded by the normalizer in `lens::registry`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IP version selector for the per-version tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    Ipv4,
    Ipv6,
}

impl IpVersion {
    pub const ALL: [IpVersion; 2] = [IpVersion::Ipv4, IpVersion::Ipv6];

    fn table_prefix(&self) -> &'static str {
        match self {
            IpVersion::Ipv4 => "ipv4",
            IpVersion::Ipv6 => "ipv6",
        }
    }

    pub fn prefixes_table(&self) -> &'static str {
        match self {
            IpVersion::Ipv4 => "ipv4_bgp_prefixes",
            IpVersion::Ipv6 => "ipv6_bgp_prefixes",
        }
    }

    pub fn prefix_whois_table(&self) -> &'static str {
        match self {
            IpVersion::Ipv4 => "ipv4_prefix_whois",
            IpVersion::Ipv6 => "ipv6_prefix_whois",
        }
    }

    pub fn prefix_whois_emails_table(&self) -> &'static str {
        match self {
            IpVersion::Ipv4 => "prefix_whois_emails",
            IpVersion::Ipv6 => "ipv6_prefix_whois_emails",
        }
    }

    pub fn bgp_entries_table(&self) -> &'static str {
        match self {
            IpVersion::Ipv4 => "ipv4_bgp_entries",
            IpVersion::Ipv6 => "ipv6_bgp_entries",
        }
    }

    pub fn peers_table(&self) -> &'static str {
        match self {
            IpVersion::Ipv4 => "ipv4_peers",
            IpVersion::Ipv6 => "ipv6_peers",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_prefix())
    }
}

/// A multi-line registry column as handed over by the store
///
/// Rows read from SQLite always carry the JSON text (`Encoded`). Snapshots and
/// callers holding already-decoded data pass `Lines`, which the normalizer
/// accepts as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredLines {
    Lines(Vec<String>),
    Encoded(String),
}

impl StoredLines {
    /// Text form written to the TEXT column
    pub fn to_column(&self) -> String {
        match self {
            StoredLines::Encoded(text) => text.clone(),
            StoredLines::Lines(lines) => serde_json::to_string(lines).unwrap_or_default(),
        }
    }
}

impl From<String> for StoredLines {
    fn from(text: String) -> Self {
        StoredLines::Encoded(text)
    }
}

impl From<Vec<String>> for StoredLines {
    fn from(lines: Vec<String>) -> Self {
        StoredLines::Lines(lines)
    }
}

/// Regional Internet Registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RirRecord {
    pub id: u32,
    pub name: String,
}

/// Registry record of an autonomous system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsnRecord {
    /// Row id; `0` lets the store assign one
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub rir_id: Option<u32>,
    pub asn: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_full: Option<StoredLines>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub owner_address: Option<StoredLines>,
    #[serde(default)]
    pub raw_whois: Option<String>,
}

/// Contact email linked to an ASN or a prefix WHOIS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    #[serde(default)]
    pub id: i64,
    /// `asn_id` or `prefix_whois_id` depending on the owning table
    #[serde(alias = "asn_id", alias = "prefix_whois_id")]
    pub owner_id: i64,
    pub email_address: String,
    #[serde(default)]
    pub abuse_email: bool,
}

/// A prefix observed in BGP, with its originating ASN
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRecord {
    #[serde(default)]
    pub id: i64,
    pub ip: String,
    pub cidr: u8,
    /// Decimal-encoded range bounds; derived from `ip`/`cidr` when absent
    #[serde(default)]
    pub ip_dec_start: Option<String>,
    #[serde(default)]
    pub ip_dec_end: Option<String>,
    pub asn: u32,
    #[serde(default)]
    pub roa_status: Option<String>,
}

impl PrefixRecord {
    /// `ip/cidr` notation
    pub fn prefix(&self) -> String {
        format!("{}/{}", self.ip, self.cidr)
    }
}

/// WHOIS record of the allocation covering a BGP prefix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefixWhoisRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub bgp_prefix_id: Option<i64>,
    #[serde(default)]
    pub rir_id: Option<u32>,
    pub ip: String,
    pub cidr: u8,
    /// Next-larger containing allocation
    #[serde(default)]
    pub parent_ip: Option<String>,
    #[serde(default)]
    pub parent_cidr: Option<u8>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description_full: Option<StoredLines>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub owner_address: Option<StoredLines>,
    #[serde(default)]
    pub raw_whois: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One observed AS-path hop: `asn` reached through `upstream_asn`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpEntryRecord {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub cidr: Option<u8>,
    pub asn: u32,
    pub upstream_asn: u32,
    pub bgp_path: String,
}

/// One observed peering adjacency; column order carries no meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerPairRecord {
    pub asn_1: u32,
    pub asn_2: u32,
}

impl PeerPairRecord {
    /// The ASN on the other side of `target`
    ///
    /// Returns `None` for self-loops on `target` and for rows not involving it.
    pub fn neighbor_of(&self, target: u32) -> Option<u32> {
        match (self.asn_1 == target, self.asn_2 == target) {
            (true, true) | (false, false) => None,
            (true, false) => Some(self.asn_2),
            (false, true) => Some(self.asn_1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_of() {
        let pair = PeerPairRecord {
            asn_1: 65000,
            asn_2: 65001,
        };
        assert_eq!(pair.neighbor_of(65000), Some(65001));
        assert_eq!(pair.neighbor_of(65001), Some(65000));
        assert_eq!(pair.neighbor_of(65002), None);

        let self_loop = PeerPairRecord {
            asn_1: 65000,
            asn_2: 65000,
        };
        assert_eq!(self_loop.neighbor_of(65000), None);
    }

    #[test]
    fn test_stored_lines_deserialize() {
        let encoded: StoredLines = serde_json::from_str(r#""[\"a\",\"b\"]""#).unwrap();
        assert_eq!(encoded, StoredLines::Encoded(r#"["a","b"]"#.to_string()));

        let lines: StoredLines = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(lines, StoredLines::Lines(vec!["a".into(), "b".into()]));
        assert_eq!(lines.to_column(), r#"["a","b"]"#);
    }

    #[test]
    fn test_email_owner_alias() {
        let email: EmailRecord =
            serde_json::from_str(r#"{"asn_id": 7, "email_address": "noc@example.net"}"#).unwrap();
        assert_eq!(email.owner_id, 7);
        assert!(!email.abuse_email);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(IpVersion::Ipv4.prefix_whois_emails_table(), "prefix_whois_emails");
        assert_eq!(
            IpVersion::Ipv6.prefix_whois_emails_table(),
            "ipv6_prefix_whois_emails"
        );
        assert_eq!(IpVersion::Ipv6.to_string(), "ipv6");
    }
}
