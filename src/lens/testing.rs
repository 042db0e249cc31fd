//! In-memory `RegistryStore` for lens tests

use crate::database::registry::{
    AsnRecord, BgpEntryRecord, EmailRecord, IpVersion, PeerPairRecord, PrefixRecord,
    PrefixWhoisRecord, RegistryStore, StoreError, StoreResult,
};
use std::cell::Cell;
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub asns: Vec<AsnRecord>,
    pub asn_emails: Vec<EmailRecord>,
    pub rirs: HashMap<u32, String>,
    pub prefixes: HashMap<IpVersion, Vec<PrefixRecord>>,
    pub prefix_whois: HashMap<IpVersion, Vec<PrefixWhoisRecord>>,
    pub bgp_entries: HashMap<IpVersion, Vec<BgpEntryRecord>>,
    pub peers: HashMap<IpVersion, Vec<PeerPairRecord>>,
    /// Make every call fail as if the store went away
    pub unavailable: bool,
    /// Number of single and batch ASN lookups served
    pub asn_lookups: Cell<usize>,
}

impl MemoryStore {
    fn check(&self) -> StoreResult<()> {
        if self.unavailable {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        Ok(())
    }

    fn lookup(&self) -> StoreResult<()> {
        self.asn_lookups.set(self.asn_lookups.get() + 1);
        self.check()
    }

    fn rows<T: Clone>(map: &HashMap<IpVersion, Vec<T>>, version: IpVersion) -> Vec<T> {
        map.get(&version).cloned().unwrap_or_default()
    }
}

impl RegistryStore for MemoryStore {
    fn asn(&self, asn: u32) -> StoreResult<Option<AsnRecord>> {
        self.lookup()?;
        Ok(self.asns.iter().find(|r| r.asn == asn).cloned())
    }

    fn asns_by_number(&self, asns: &[u32]) -> StoreResult<HashMap<u32, AsnRecord>> {
        self.lookup()?;
        let records = self
            .asns
            .iter()
            .filter(|r| asns.contains(&r.asn))
            .map(|r| (r.asn, r.clone()))
            .collect();
        Ok(records)
    }

    fn asn_emails(&self, asn_id: i64) -> StoreResult<Vec<EmailRecord>> {
        self.check()?;
        let emails = self
            .asn_emails
            .iter()
            .filter(|e| e.owner_id == asn_id)
            .cloned()
            .collect();
        Ok(emails)
    }

    fn rir_names(&self) -> StoreResult<HashMap<u32, String>> {
        self.check()?;
        Ok(self.rirs.clone())
    }

    fn prefixes_by_asn(&self, version: IpVersion, asn: u32) -> StoreResult<Vec<PrefixRecord>> {
        self.check()?;
        let mut rows = Self::rows(&self.prefixes, version);
        rows.retain(|p| p.asn == asn);
        Ok(rows)
    }

    fn prefix_by_network(
        &self,
        version: IpVersion,
        ip: &str,
        cidr: u8,
    ) -> StoreResult<Option<PrefixRecord>> {
        self.check()?;
        let rows = Self::rows(&self.prefixes, version);
        Ok(rows.into_iter().find(|p| p.ip == ip && p.cidr == cidr))
    }

    fn prefix_whois_by_prefix(
        &self,
        version: IpVersion,
        prefix_ids: &[i64],
    ) -> StoreResult<HashMap<i64, PrefixWhoisRecord>> {
        self.check()?;
        let mut found = HashMap::new();
        for record in Self::rows(&self.prefix_whois, version) {
            if let Some(prefix_id) = record.bgp_prefix_id.filter(|id| prefix_ids.contains(id)) {
                found.entry(prefix_id).or_insert(record);
            }
        }
        Ok(found)
    }

    fn prefix_whois_emails(
        &self,
        _version: IpVersion,
        _prefix_whois_id: i64,
    ) -> StoreResult<Vec<EmailRecord>> {
        self.check()?;
        Ok(Vec::new())
    }

    fn peer_pairs(&self, version: IpVersion, asn: u32) -> StoreResult<Vec<PeerPairRecord>> {
        self.check()?;
        let mut rows = Self::rows(&self.peers, version);
        rows.retain(|p| p.asn_1 == asn || p.asn_2 == asn);
        Ok(rows)
    }

    fn bgp_entries_by_asn(&self, version: IpVersion, asn: u32) -> StoreResult<Vec<BgpEntryRecord>> {
        self.check()?;
        let mut rows = Self::rows(&self.bgp_entries, version);
        rows.retain(|e| e.asn == asn);
        Ok(rows)
    }

    fn bgp_entries_by_upstream(
        &self,
        version: IpVersion,
        asn: u32,
    ) -> StoreResult<Vec<BgpEntryRecord>> {
        self.check()?;
        let mut rows = Self::rows(&self.bgp_entries, version);
        rows.retain(|e| e.upstream_asn == asn);
        Ok(rows)
    }
}
