//! ASN lens
//!
//! Single entry point for everything known about one ASN: its registry
//! details, peers, originated prefixes, upstreams and downstreams. Each call
//! is a self-contained read pass; nothing is cached between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use bgpview::database::RegistryDatabase;
//! use bgpview::lens::asn::AsnLens;
//!
//! let db = RegistryDatabase::open_in_dir("~/.bgpview")?;
//! let lens = AsnLens::new(&db);
//!
//! let upstreams = lens.get_upstreams(65000)?;
//! for neighbor in &upstreams.ipv4_upstreams {
//!     println!("AS{} via {} paths", neighbor.asn, neighbor.bgp_paths.len());
//! }
//! ```

use crate::database::registry::{RegistryStore, StoreResult};
use crate::lens::peers::{AsnPeers, PeersLens};
use crate::lens::prefix::{AsnPrefixes, PrefixLens};
use crate::lens::registry::{self, AsnDetails};
use crate::lens::transit::{AsnDownstreams, AsnUpstreams, TransitLens};

pub struct AsnLens<'a> {
    store: &'a dyn RegistryStore,
}

impl<'a> AsnLens<'a> {
    pub fn new(store: &'a dyn RegistryStore) -> Self {
        Self { store }
    }

    /// Normalized registry details, `None` for an unknown ASN
    pub fn details(&self, asn: u32) -> StoreResult<Option<AsnDetails>> {
        let Some(record) = self.store.asn(asn)? else {
            return Ok(None);
        };

        let emails = self.store.asn_emails(record.id)?;
        let rir_names = self.store.rir_names()?;
        Ok(Some(registry::normalize_asn(&record, &emails, &rir_names)))
    }

    pub fn get_peers(&self, asn: u32) -> StoreResult<AsnPeers> {
        PeersLens::new(self.store).get_peers(asn)
    }

    pub fn get_prefixes(&self, asn: u32) -> StoreResult<AsnPrefixes> {
        PrefixLens::new(self.store).get_prefixes(asn)
    }

    pub fn get_upstreams(&self, asn: u32) -> StoreResult<AsnUpstreams> {
        TransitLens::new(self.store).get_upstreams(asn)
    }

    pub fn get_downstreams(&self, asn: u32) -> StoreResult<AsnDownstreams> {
        TransitLens::new(self.store).get_downstreams(asn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::registry::{
        AsnRecord, EmailRecord, IpVersion, RegistryDatabase, RegistrySnapshot,
    };

    const SNAPSHOT: &str = r#"{
        "rirs": [{"id": 1, "name": "RIPE"}, {"id": 2, "name": "ARIN"}],
        "asns": [
            {"id": 1, "asn": 65000, "rir_id": 1, "name": "EXAMPLE-AS",
             "description": "Example Network B.V.",
             "description_full": "[\"Example Network B.V.\", \"Amsterdam\"]",
             "country_code": "NL",
             "owner_address": "[\"Example Street 1,, 1000 AA\", \"Amsterdam\"]",
             "raw_whois": "source: RIPE\naut-num: AS65000\nas-name: EXAMPLE-AS"},
            {"id": 2, "asn": 65001, "rir_id": 2, "name": "TRANSIT-AS",
             "description": "Transit Example", "country_code": "US"}
        ],
        "asn_emails": [
            {"asn_id": 1, "email_address": "noc@example.net"},
            {"asn_id": 1, "email_address": "abuse@example.net", "abuse_email": true}
        ],
        "ipv4": {
            "prefixes": [{"id": 1, "ip": "192.0.2.0", "cidr": 24, "asn": 65000}],
            "prefix_whois": [
                {"id": 1, "bgp_prefix_id": 1, "rir_id": 1, "ip": "192.0.2.0", "cidr": 24,
                 "parent_ip": "192.0.0.0", "parent_cidr": 16, "name": "EXAMPLE-NET",
                 "description_full": "[\"\", \"Example customer block\"]", "status": ""}
            ],
            "bgp_entries": [
                {"asn": 65000, "upstream_asn": 65001, "bgp_path": "65000 65001"},
                {"asn": 65000, "upstream_asn": 65001, "bgp_path": "65000 65001"}
            ],
            "peers": [{"asn_1": 65001, "asn_2": 65000}, {"asn_1": 65000, "asn_2": 65000}]
        },
        "ipv6": {
            "bgp_entries": [{"asn": 65002, "upstream_asn": 65000, "bgp_path": "65002 65000"}]
        }
    }"#;

    fn loaded_db() -> RegistryDatabase {
        let db = RegistryDatabase::open_in_memory().unwrap();
        let snapshot: RegistrySnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        db.store_snapshot(&snapshot, "test").unwrap();
        db
    }

    #[test]
    fn test_details() {
        let db = loaded_db();
        let lens = AsnLens::new(&db);

        let details = lens.details(65000).unwrap().unwrap();
        assert_eq!(details.name.as_deref(), Some("EXAMPLE-AS"));
        assert_eq!(details.country_code.as_deref(), Some("NL"));
        assert_eq!(details.rir_name.as_deref(), Some("RIPE"));
        assert_eq!(details.description_full.len(), 2);
        assert_eq!(
            details.owner_address,
            Some(vec![
                "Example Street 1".to_string(),
                "1000 AA".to_string(),
                "Amsterdam".to_string()
            ])
        );
        assert_eq!(
            details.raw_whois.as_deref(),
            Some("aut-num: AS65000\nas-name: EXAMPLE-AS")
        );
        assert_eq!(details.email_contacts.len(), 2);
        assert_eq!(details.abuse_contacts, vec!["abuse@example.net".to_string()]);

        let json = serde_json::to_value(&details).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("rir_id").is_none());

        assert!(lens.details(64999).unwrap().is_none());
    }

    #[test]
    fn test_read_operations() {
        let db = loaded_db();
        let lens = AsnLens::new(&db);

        let peers = lens.get_peers(65000).unwrap();
        assert_eq!(peers.ipv4_peers.len(), 1);
        assert_eq!(peers.ipv4_peers[0].country_code.as_deref(), Some("US"));

        let prefixes = lens.get_prefixes(65000).unwrap();
        let view = &prefixes.ipv4_prefixes[0];
        assert_eq!(view.description.as_deref(), Some("Example customer block"));
        assert_eq!(view.parent.prefix.as_deref(), Some("192.0.0.0/16"));
        assert_eq!(view.parent.allocation_status.as_deref(), Some("unknown"));

        let upstreams = lens.get_upstreams(65000).unwrap();
        assert_eq!(upstreams.ipv4_upstreams.len(), 1);
        assert_eq!(upstreams.ipv4_upstreams[0].bgp_paths.len(), 1);
        assert_eq!(
            upstreams.ipv4_upstreams[0].description.as_deref(),
            Some("Transit Example")
        );

        let downstreams = lens.get_downstreams(65000).unwrap();
        assert!(downstreams.ipv4_downstreams.is_empty());
        assert_eq!(downstreams.ipv6_downstreams[0].asn, 65002);
    }

    #[test]
    fn test_details_rir_dangling_reference() {
        let db = RegistryDatabase::open_in_memory().unwrap();
        let id = db
            .asns()
            .insert(&AsnRecord {
                asn: 65000,
                rir_id: Some(7),
                ..Default::default()
            })
            .unwrap();
        db.asns()
            .insert_email(&EmailRecord {
                id: 0,
                owner_id: id,
                email_address: "noc@example.net".to_string(),
                abuse_email: false,
            })
            .unwrap();

        let details = AsnLens::new(&db).details(65000).unwrap().unwrap();
        assert_eq!(details.rir_name, None);
        assert!(details.abuse_contacts.is_empty());
        assert_eq!(details.owner_address, None);
        assert!(details.description_full.is_empty());

        // Unknown ASNs still produce complete, empty structures
        let prefixes = AsnLens::new(&db).get_prefixes(65000).unwrap();
        assert!(prefixes.ipv4_prefixes.is_empty());
        assert!(db.bgp_entries_by_asn(IpVersion::Ipv6, 65000).unwrap().is_empty());
    }
}
