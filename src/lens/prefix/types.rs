//! Prefix lens types

use serde::{Deserialize, Serialize};

/// Covering allocation of a prefix, taken from its linked WHOIS record
///
/// Every field is `None` when the prefix has no WHOIS record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixParent {
    /// `parent_ip/parent_cidr`, only when both parts are known
    pub prefix: Option<String>,
    pub ip: Option<String>,
    pub cidr: Option<u8>,
    pub rir_name: Option<String>,
    /// WHOIS status, `"unknown"` when the record carries none
    pub allocation_status: Option<String>,
}

/// A BGP prefix enriched with its WHOIS allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixView {
    pub prefix: String,
    pub ip: String,
    pub cidr: u8,
    pub roa_status: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub country_code: Option<String>,
    pub parent: PrefixParent,
}

/// Enriched prefixes originated by one ASN
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnPrefixes {
    pub ipv4_prefixes: Vec<PrefixView>,
    pub ipv6_prefixes: Vec<PrefixView>,
}
