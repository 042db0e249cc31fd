//! Lens module
//!
//! High-level "lens" abstractions over the registry store. Each lens reads
//! through the [`RegistryStore`](crate::database::RegistryStore) trait and returns
//! plain serializable structures.
//!
//! | Lens | Purpose |
//! |------|---------|
//! | `AsnLens` | Entry point: details, peers, prefixes, upstreams, downstreams of an ASN |
//! | `PrefixLens` | Prefixes of an ASN enriched with WHOIS, parent allocation and RIR |
//! | `PeersLens` | Peering neighbors per IP version |
//! | `TransitLens` | Upstream/downstream neighbors with their distinct AS paths |
//!
//! The `registry` module holds the record normalizer shared by the lenses, and
//! `index` the search index payloads built from normalized records.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bgpview::database::RegistryDatabase;
//! use bgpview::lens::asn::AsnLens;
//!
//! let db = RegistryDatabase::open_in_dir("~/.bgpview")?;
//! let lens = AsnLens::new(&db);
//!
//! let peers = lens.get_peers(65000)?;
//! let prefixes = lens.get_prefixes(65000)?;
//! println!("{}", serde_json::to_string_pretty(&prefixes)?);
//! ```

pub mod asn;
pub mod index;
pub mod peers;
pub mod prefix;
pub mod registry;
pub mod transit;

#[cfg(test)]
pub(crate) mod testing;
