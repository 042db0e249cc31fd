//! Transit lens
//!
//! Collapses per-path BGP entries into one record per upstream (provider) or
//! downstream (customer) neighbor, carrying every distinct AS path seen between
//! the two.
//!
//! Aggregation is a pure function over entry rows and an ASN record map, so the
//! neighbor records are fetched with a single batch lookup per IP version.

use crate::database::registry::{AsnRecord, BgpEntryRecord, IpVersion, RegistryStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Direction of the transit relationship relative to the target ASN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitDirection {
    /// Providers of the target: entries where it is `asn`
    Upstream,
    /// Customers of the target: entries where it is `upstream_asn`
    Downstream,
}

impl TransitDirection {
    /// The neighbor side of an entry row
    pub fn neighbor(&self, entry: &BgpEntryRecord) -> u32 {
        match self {
            TransitDirection::Upstream => entry.upstream_asn,
            TransitDirection::Downstream => entry.asn,
        }
    }
}

/// A transit neighbor and the distinct AS paths observed through it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitNeighbor {
    pub asn: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub country_code: Option<String>,
    /// In order of first observation
    pub bgp_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnUpstreams {
    pub ipv4_upstreams: Vec<TransitNeighbor>,
    pub ipv6_upstreams: Vec<TransitNeighbor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnDownstreams {
    pub ipv4_downstreams: Vec<TransitNeighbor>,
    pub ipv6_downstreams: Vec<TransitNeighbor>,
}

/// Distinct neighbors of `target` in first-seen order, self rows excluded
pub fn transit_neighbors(
    target: u32,
    direction: TransitDirection,
    entries: &[BgpEntryRecord],
) -> Vec<u32> {
    let mut seen = Vec::new();
    for entry in entries {
        let neighbor = direction.neighbor(entry);
        if neighbor != target && !seen.contains(&neighbor) {
            seen.push(neighbor);
        }
    }
    seen
}

/// Merge entry rows into one record per neighbor
///
/// Neighbors keep the order of their first row; each path string is kept once.
/// Neighbors missing from `records` get `None` identity fields.
pub fn aggregate_transit(
    target: u32,
    direction: TransitDirection,
    entries: &[BgpEntryRecord],
    records: &HashMap<u32, AsnRecord>,
) -> Vec<TransitNeighbor> {
    let mut neighbors: Vec<TransitNeighbor> = Vec::new();
    let mut positions: HashMap<u32, usize> = HashMap::new();

    for entry in entries {
        let asn = direction.neighbor(entry);
        if asn == target {
            continue;
        }

        match positions.get(&asn) {
            Some(&idx) => {
                let paths = &mut neighbors[idx].bgp_paths;
                if !paths.contains(&entry.bgp_path) {
                    paths.push(entry.bgp_path.clone());
                }
            }
            None => {
                let record = records.get(&asn);
                positions.insert(asn, neighbors.len());
                neighbors.push(TransitNeighbor {
                    asn,
                    name: record.and_then(|r| r.name.clone()),
                    description: record.and_then(|r| r.description.clone()),
                    country_code: record.and_then(|r| r.country_code.clone()),
                    bgp_paths: vec![entry.bgp_path.clone()],
                });
            }
        }
    }

    neighbors
}

/// Transit lens over a registry store
pub struct TransitLens<'a> {
    store: &'a dyn RegistryStore,
}

impl<'a> TransitLens<'a> {
    pub fn new(store: &'a dyn RegistryStore) -> Self {
        Self { store }
    }

    /// Providers of `asn` per IP version
    pub fn get_upstreams(&self, asn: u32) -> StoreResult<AsnUpstreams> {
        Ok(AsnUpstreams {
            ipv4_upstreams: self.aggregate(IpVersion::Ipv4, asn, TransitDirection::Upstream)?,
            ipv6_upstreams: self.aggregate(IpVersion::Ipv6, asn, TransitDirection::Upstream)?,
        })
    }

    /// Customers of `asn` per IP version
    pub fn get_downstreams(&self, asn: u32) -> StoreResult<AsnDownstreams> {
        Ok(AsnDownstreams {
            ipv4_downstreams: self.aggregate(IpVersion::Ipv4, asn, TransitDirection::Downstream)?,
            ipv6_downstreams: self.aggregate(IpVersion::Ipv6, asn, TransitDirection::Downstream)?,
        })
    }

    /// Neighbors of `asn` in one direction and IP version
    pub fn aggregate(
        &self,
        version: IpVersion,
        asn: u32,
        direction: TransitDirection,
    ) -> StoreResult<Vec<TransitNeighbor>> {
        let entries = match direction {
            TransitDirection::Upstream => self.store.bgp_entries_by_asn(version, asn)?,
            TransitDirection::Downstream => self.store.bgp_entries_by_upstream(version, asn)?,
        };

        let neighbor_asns = transit_neighbors(asn, direction, &entries);
        if neighbor_asns.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.store.asns_by_number(&neighbor_asns)?;
        debug!(
            "AS{}: {} {:?} {} entries over {} neighbors",
            asn,
            entries.len(),
            direction,
            version,
            neighbor_asns.len()
        );

        Ok(aggregate_transit(asn, direction, &entries, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::registry::RegistryDatabase;
    use crate::lens::testing::MemoryStore;

    fn entry(asn: u32, upstream_asn: u32, path: &str) -> BgpEntryRecord {
        BgpEntryRecord {
            ip: None,
            cidr: None,
            asn,
            upstream_asn,
            bgp_path: path.to_string(),
        }
    }

    fn paths(neighbor: &TransitNeighbor) -> Vec<&str> {
        neighbor.bgp_paths.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_aggregate_upstreams() {
        let entries = vec![
            entry(65000, 65001, "65000 65001"),
            entry(65000, 65001, "65000 65002 65001"),
            entry(65000, 65002, "65000 65002"),
        ];
        let records = HashMap::from([(
            65001,
            AsnRecord {
                asn: 65001,
                name: Some("TRANSIT-AS".to_string()),
                ..Default::default()
            },
        )]);

        let result = aggregate_transit(65000, TransitDirection::Upstream, &entries, &records);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].asn, 65001);
        assert_eq!(result[0].name.as_deref(), Some("TRANSIT-AS"));
        assert_eq!(paths(&result[0]), vec!["65000 65001", "65000 65002 65001"]);
        assert_eq!(result[1].asn, 65002);
        assert_eq!(result[1].name, None);
        assert_eq!(paths(&result[1]), vec!["65000 65002"]);
    }

    #[test]
    fn test_aggregate_dedups_paths() {
        let entries = vec![
            entry(65000, 65001, "P1"),
            entry(65000, 65001, "P1"),
            entry(65000, 65001, "P2"),
        ];
        let result =
            aggregate_transit(65000, TransitDirection::Upstream, &entries, &HashMap::new());
        assert_eq!(result.len(), 1);
        assert_eq!(paths(&result[0]), vec!["P1", "P2"]);
    }

    #[test]
    fn test_aggregate_excludes_self() {
        let entries = vec![
            entry(65000, 65000, "65000"),
            entry(65000, 65001, "65000 65001"),
        ];
        let up = aggregate_transit(65000, TransitDirection::Upstream, &entries, &HashMap::new());
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].asn, 65001);

        let down =
            aggregate_transit(65000, TransitDirection::Downstream, &entries, &HashMap::new());
        assert!(down.is_empty());

        assert_eq!(
            transit_neighbors(65000, TransitDirection::Upstream, &entries),
            vec![65001]
        );
    }

    #[test]
    fn test_aggregate_downstreams_keyed_by_asn() {
        let entries = vec![
            entry(65010, 65000, "65010 65000"),
            entry(65011, 65000, "65011 65000"),
            entry(65010, 65000, "65010 65012 65000"),
        ];
        let result =
            aggregate_transit(65000, TransitDirection::Downstream, &entries, &HashMap::new());
        let asns: Vec<u32> = result.iter().map(|n| n.asn).collect();
        assert_eq!(asns, vec![65010, 65011]);
        assert_eq!(paths(&result[0]), vec!["65010 65000", "65010 65012 65000"]);
    }

    #[test]
    fn test_get_upstreams_end_to_end() {
        let db = RegistryDatabase::open_in_memory().unwrap();
        let v4 = db.routing(IpVersion::Ipv4);
        v4.insert_entry(&entry(65000, 65001, "65000 65001")).unwrap();
        v4.insert_entry(&entry(65000, 65001, "65000 65002 65001")).unwrap();
        v4.insert_entry(&entry(65000, 65002, "65000 65002")).unwrap();
        v4.insert_entry(&entry(65003, 65000, "65003 65000 65001")).unwrap();

        let lens = TransitLens::new(&db);
        let upstreams = lens.get_upstreams(65000).unwrap();

        let json = serde_json::to_value(&upstreams).unwrap();
        assert_eq!(
            json["ipv4_upstreams"],
            serde_json::json!([
                {"asn": 65001, "name": null, "description": null, "country_code": null,
                 "bgp_paths": ["65000 65001", "65000 65002 65001"]},
                {"asn": 65002, "name": null, "description": null, "country_code": null,
                 "bgp_paths": ["65000 65002"]}
            ])
        );
        assert!(upstreams.ipv6_upstreams.is_empty());

        let downstreams = lens.get_downstreams(65000).unwrap();
        assert_eq!(downstreams.ipv4_downstreams.len(), 1);
        assert_eq!(downstreams.ipv4_downstreams[0].asn, 65003);
    }

    #[test]
    fn test_downstream_unknown_asn_keeps_number() {
        let store = MemoryStore {
            bgp_entries: HashMap::from([(
                IpVersion::Ipv6,
                vec![entry(65020, 65000, "65020 65000")],
            )]),
            ..Default::default()
        };

        let downstreams = TransitLens::new(&store).get_downstreams(65000).unwrap();
        assert_eq!(downstreams.ipv6_downstreams[0].asn, 65020);
        assert_eq!(downstreams.ipv6_downstreams[0].name, None);
        assert_eq!(store.asn_lookups.get(), 1);
    }

    #[test]
    fn test_store_failure_yields_no_partial_result() {
        let store = MemoryStore {
            bgp_entries: HashMap::from([(
                IpVersion::Ipv4,
                vec![entry(65000, 65001, "65000 65001")],
            )]),
            unavailable: true,
            ..Default::default()
        };

        let err = TransitLens::new(&store).get_upstreams(65000).unwrap_err();
        assert!(err.is_unavailable());
    }
}
