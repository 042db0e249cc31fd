//! Prefix lens
//!
//! Resolves the BGP prefixes originated by an ASN against their WHOIS
//! allocation records, the covering parent allocation and its RIR.
//!
//! # Example
//!
//! ```rust,ignore
//! use bgpview::database::RegistryDatabase;
//! use bgpview::lens::prefix::PrefixLens;
//!
//! let db = RegistryDatabase::open_in_dir("~/.bgpview")?;
//! let lens = PrefixLens::new(&db);
//! let prefixes = lens.get_prefixes(65000)?;
//! println!("{}", serde_json::to_string_pretty(&prefixes)?);
//! ```

pub mod types;

pub use types::{AsnPrefixes, PrefixParent, PrefixView};

use crate::database::registry::{
    IpVersion, PrefixRecord, PrefixWhoisRecord, RegistryStore, StoreResult,
};
use crate::lens::registry::{self, PrefixWhoisDetails};
use std::collections::HashMap;
use tracing::debug;

/// Enrich one prefix with its linked WHOIS record
///
/// `rir_names` maps RIR ids to names and is expected to be loaded once per
/// batch of prefixes.
pub fn resolve_prefix(
    prefix: &PrefixRecord,
    whois: Option<&PrefixWhoisRecord>,
    rir_names: &HashMap<u32, String>,
) -> PrefixView {
    let Some(whois) = whois else {
        return PrefixView {
            prefix: prefix.prefix(),
            ip: prefix.ip.clone(),
            cidr: prefix.cidr,
            roa_status: prefix.roa_status.clone(),
            name: None,
            description: None,
            country_code: None,
            parent: PrefixParent::default(),
        };
    };

    let description_full = registry::description_lines(whois.description_full.as_ref());
    let parent_ip = whois.parent_ip.clone().filter(|ip| !ip.is_empty());

    let parent = PrefixParent {
        prefix: match (&parent_ip, whois.parent_cidr) {
            (Some(ip), Some(cidr)) => Some(format!("{}/{}", ip, cidr)),
            _ => None,
        },
        ip: parent_ip,
        cidr: whois.parent_cidr,
        rir_name: registry::rir_name(whois.rir_id, rir_names),
        allocation_status: Some(
            whois
                .status
                .clone()
                .filter(|status| !status.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
    };

    PrefixView {
        prefix: prefix.prefix(),
        ip: prefix.ip.clone(),
        cidr: prefix.cidr,
        roa_status: prefix.roa_status.clone(),
        name: whois.name.clone(),
        description: registry::canonical_description(&description_full, whois.name.as_deref()),
        country_code: whois.country_code.clone(),
        parent,
    }
}

/// Prefix lens over a registry store
pub struct PrefixLens<'a> {
    store: &'a dyn RegistryStore,
}

impl<'a> PrefixLens<'a> {
    pub fn new(store: &'a dyn RegistryStore) -> Self {
        Self { store }
    }

    /// All IPv4 and IPv6 prefixes originated by `asn`, enriched with WHOIS data
    pub fn get_prefixes(&self, asn: u32) -> StoreResult<AsnPrefixes> {
        let rir_names = self.store.rir_names()?;

        let ipv4_prefixes = self.resolve_version(IpVersion::Ipv4, asn, &rir_names)?;
        let ipv6_prefixes = self.resolve_version(IpVersion::Ipv6, asn, &rir_names)?;

        Ok(AsnPrefixes {
            ipv4_prefixes,
            ipv6_prefixes,
        })
    }

    fn resolve_version(
        &self,
        version: IpVersion,
        asn: u32,
        rir_names: &HashMap<u32, String>,
    ) -> StoreResult<Vec<PrefixView>> {
        let prefixes = self.store.prefixes_by_asn(version, asn)?;
        if prefixes.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = prefixes.iter().map(|p| p.id).collect();
        let whois = self.store.prefix_whois_by_prefix(version, &ids)?;
        debug!(
            "AS{}: {} {} prefixes, {} with WHOIS records",
            asn,
            prefixes.len(),
            version,
            whois.len()
        );

        let views = prefixes
            .iter()
            .map(|p| resolve_prefix(p, whois.get(&p.id), rir_names))
            .collect();
        Ok(views)
    }

    /// Normalized WHOIS record linked to the prefix `ip/cidr`
    ///
    /// Returns `None` when the prefix is unknown or has no WHOIS record.
    pub fn whois_details(
        &self,
        version: IpVersion,
        ip: &str,
        cidr: u8,
    ) -> StoreResult<Option<PrefixWhoisDetails>> {
        let Some(prefix) = self.store.prefix_by_network(version, ip, cidr)? else {
            return Ok(None);
        };

        let mut whois = self.store.prefix_whois_by_prefix(version, &[prefix.id])?;
        let Some(record) = whois.remove(&prefix.id) else {
            return Ok(None);
        };

        let emails = self.store.prefix_whois_emails(version, record.id)?;
        let rir_names = self.store.rir_names()?;
        Ok(Some(registry::normalize_prefix_whois(
            &record, &emails, &rir_names,
        )))
    }
}
