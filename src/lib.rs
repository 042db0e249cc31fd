#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! bgpview - ASN relationship aggregation and registry normalization
//!
//! bgpview derives structured relationships from BGP routing entries and
//! registry (WHOIS) records stored in a local SQLite database:
//!
//! - peering neighbors of an ASN, per IP version
//! - upstream and downstream transit neighbors, each with every distinct AS path
//! - originated prefixes enriched with their WHOIS allocation, parent block and RIR
//! - normalized registry details (address lines, contacts, description, raw WHOIS)
//!
//! # Architecture
//!
//! - **[`database`]**: SQLite storage
//!   - `core`: connection management and schema definitions
//!   - `registry`: row types, repositories, the `RegistryStore` trait, snapshot loading
//!
//! - **[`lens`]**: The aggregation engine, reading only through `RegistryStore`
//!   - `asn`: facade for all per-ASN operations
//!   - `prefix`, `peers`, `transit`: one lens per relationship family
//!   - `registry`: record normalizer
//!   - `index`: search index payloads and analyzer
//!
//! - **[`config`]**: Configuration management
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `loader` (default) | Load registry snapshots from files or URLs | `oneio` |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bgpview::{AsnLens, BgpviewConfig, RegistryDatabase};
//!
//! let config = BgpviewConfig::new(&None)?;
//! let db = RegistryDatabase::open(&config.sqlite_path())?
//!     .with_batch_size(config.batch_lookup_size);
//!
//! if db.asns().is_empty() {
//!     let counts = db.load_from_path("https://example.net/registry-snapshot.json.gz")?;
//!     println!("Loaded {} ASNs", counts.asns);
//! }
//!
//! let lens = AsnLens::new(&db);
//! let upstreams = lens.get_upstreams(65000)?;
//! for upstream in &upstreams.ipv4_upstreams {
//!     println!("AS{} {:?}: {:?}", upstream.asn, upstream.name, upstream.bgp_paths);
//! }
//! ```

pub mod config;
pub mod database;
pub mod lens;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{BgpviewConfig, DEFAULT_DATABASE_FILE};

// =============================================================================
// Database Module - Re-export commonly used types
// =============================================================================

pub use database::{AccessMode, DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION};

pub use database::{
    AsnRecord, BgpEntryRecord, EmailRecord, IpVersion, PeerPairRecord, PrefixRecord,
    PrefixWhoisRecord, RegistryDatabase, RegistrySnapshot, RegistryStore, RirRecord,
    SnapshotCounts, StoreError, StoreResult, StoredLines,
};

// =============================================================================
// Lens Module
// =============================================================================

pub use lens::asn::AsnLens;
pub use lens::peers::{AsnPeers, PeerView, PeersLens};
pub use lens::prefix::{AsnPrefixes, PrefixLens, PrefixParent, PrefixView};
pub use lens::registry::{AsnDetails, PrefixWhoisDetails};
pub use lens::transit::{AsnDownstreams, AsnUpstreams, TransitDirection, TransitLens, TransitNeighbor};
