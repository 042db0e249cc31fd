//! Peers lens
//!
//! Resolves the peering neighbors of an ASN from the per-version peer tables.
//! A neighbor seen on several rows is reported once per row, in store order.

use crate::database::registry::{AsnRecord, IpVersion, PeerPairRecord, RegistryStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A peering neighbor with its registry identity (`None` fields when unknown)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerView {
    pub asn: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub country_code: Option<String>,
}

impl PeerView {
    fn new(asn: u32, record: Option<&AsnRecord>) -> Self {
        Self {
            asn,
            name: record.and_then(|r| r.name.clone()),
            description: record.and_then(|r| r.description.clone()),
            country_code: record.and_then(|r| r.country_code.clone()),
        }
    }
}

/// Peers of one ASN, per IP version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnPeers {
    pub ipv4_peers: Vec<PeerView>,
    pub ipv6_peers: Vec<PeerView>,
}

/// Neighbors of `target` in row order, self-loops and unrelated rows excluded
pub fn peer_neighbors(target: u32, pairs: &[PeerPairRecord]) -> Vec<u32> {
    pairs.iter().filter_map(|p| p.neighbor_of(target)).collect()
}

/// Peer lens over a registry store
pub struct PeersLens<'a> {
    store: &'a dyn RegistryStore,
}

impl<'a> PeersLens<'a> {
    pub fn new(store: &'a dyn RegistryStore) -> Self {
        Self { store }
    }

    /// IPv4 and IPv6 peers of `asn`
    pub fn get_peers(&self, asn: u32) -> StoreResult<AsnPeers> {
        Ok(AsnPeers {
            ipv4_peers: self.peers_for_version(IpVersion::Ipv4, asn)?,
            ipv6_peers: self.peers_for_version(IpVersion::Ipv6, asn)?,
        })
    }

    fn peers_for_version(&self, version: IpVersion, asn: u32) -> StoreResult<Vec<PeerView>> {
        let pairs = self.store.peer_pairs(version, asn)?;
        let neighbors = peer_neighbors(asn, &pairs);
        if neighbors.is_empty() {
            return Ok(Vec::new());
        }

        let records: HashMap<u32, AsnRecord> = self.store.asns_by_number(&neighbors)?;
        debug!(
            "AS{}: {} {} peer rows, {} neighbors, {} known",
            asn,
            pairs.len(),
            version,
            neighbors.len(),
            records.len()
        );

        let peers = neighbors
            .into_iter()
            .map(|neighbor| PeerView::new(neighbor, records.get(&neighbor)))
            .collect();
        Ok(peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::registry::RegistryDatabase;
    use crate::lens::testing::MemoryStore;

    fn pair(asn_1: u32, asn_2: u32) -> PeerPairRecord {
        PeerPairRecord { asn_1, asn_2 }
    }

    #[test]
    fn test_peer_neighbors() {
        let pairs = [
            pair(65000, 65001),
            pair(65002, 65000),
            pair(65000, 65000),
            pair(65000, 65001),
        ];
        assert_eq!(peer_neighbors(65000, &pairs), vec![65001, 65002, 65001]);
        assert!(peer_neighbors(65000, &[pair(65000, 65000)]).is_empty());
    }

    #[test]
    fn test_get_peers() {
        let db = RegistryDatabase::open_in_memory().unwrap();
        db.asns()
            .insert(&AsnRecord {
                asn: 65001,
                name: Some("TRANSIT-AS".to_string()),
                description: Some("Transit Example".to_string()),
                country_code: Some("DE".to_string()),
                ..Default::default()
            })
            .unwrap();

        let v4 = db.routing(IpVersion::Ipv4);
        for (a, b) in [(65000, 65001), (65002, 65000), (65000, 65000)] {
            v4.insert_peer(&pair(a, b)).unwrap();
        }
        db.routing(IpVersion::Ipv6)
            .insert_peer(&pair(65001, 65000))
            .unwrap();

        let peers = PeersLens::new(&db).get_peers(65000).unwrap();
        assert_eq!(peers.ipv4_peers.len(), 2);
        assert_eq!(peers.ipv4_peers[0].asn, 65001);
        assert_eq!(peers.ipv4_peers[0].name.as_deref(), Some("TRANSIT-AS"));
        assert_eq!(peers.ipv4_peers[0].country_code.as_deref(), Some("DE"));

        // Unknown neighbor is still reported
        assert_eq!(peers.ipv4_peers[1].asn, 65002);
        assert_eq!(peers.ipv4_peers[1].name, None);

        assert_eq!(peers.ipv6_peers.len(), 1);
        assert!(peers.ipv4_peers.iter().all(|p| p.asn != 65000));
    }

    fn memory_store(pairs: Vec<PeerPairRecord>) -> MemoryStore {
        let asns = [65001, 65002]
            .into_iter()
            .map(|asn| AsnRecord {
                asn,
                name: Some(format!("AS{}-NAME", asn)),
                ..Default::default()
            })
            .collect();
        MemoryStore {
            asns,
            peers: HashMap::from([(IpVersion::Ipv4, pairs)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_peers_single_batch_lookup() {
        let store = memory_store(vec![
            pair(65000, 65001),
            pair(65002, 65000),
            pair(65000, 65001),
            pair(65003, 65000),
        ]);

        let peers = PeersLens::new(&store).get_peers(65000).unwrap();
        let asns: Vec<u32> = peers.ipv4_peers.iter().map(|p| p.asn).collect();
        assert_eq!(asns, vec![65001, 65002, 65001, 65003]);
        assert_eq!(peers.ipv4_peers[1].name.as_deref(), Some("AS65002-NAME"));
        assert_eq!(peers.ipv4_peers[3].name, None);

        // One lookup for IPv4, none for the empty IPv6 set
        assert_eq!(store.asn_lookups.get(), 1);
    }

    #[test]
    fn test_get_peers_store_failure() {
        let store = MemoryStore {
            unavailable: true,
            ..memory_store(vec![pair(65000, 65001)])
        };

        let err = PeersLens::new(&store).get_peers(65000).unwrap_err();
        assert!(err.is_unavailable());
    }
}
