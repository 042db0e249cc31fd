//! Normalized registry record types

use serde::{Deserialize, Serialize};

/// Normalized WHOIS details of an autonomous system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnDetails {
    pub asn: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub description_full: Vec<String>,
    pub country_code: Option<String>,
    pub rir_name: Option<String>,
    pub owner_address: Option<Vec<String>>,
    pub email_contacts: Vec<String>,
    pub abuse_contacts: Vec<String>,
    /// Raw WHOIS text without the registry source header
    pub raw_whois: Option<String>,
}

/// Normalized WHOIS details of a prefix allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixWhoisDetails {
    pub prefix: String,
    pub ip: String,
    pub cidr: u8,
    pub name: Option<String>,
    /// First meaningful line of `description_full`, falling back to `name`
    pub description: Option<String>,
    pub description_full: Vec<String>,
    pub country_code: Option<String>,
    pub rir_name: Option<String>,
    pub parent_ip: Option<String>,
    pub parent_cidr: Option<u8>,
    pub status: Option<String>,
    pub owner_address: Option<Vec<String>>,
    pub email_contacts: Vec<String>,
    pub abuse_contacts: Vec<String>,
    pub raw_whois: Option<String>,
}
