//! Database module
//!
//! All storage for bgpview lives here, organized into:
//!
//! - **core**: Core database infrastructure (SQLite connections, schema management)
//! - **registry**: The registry store (ASN, prefix, WHOIS, RIR, BGP entry and peer tables)
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper
//! │   └── schema      # SQLite schema definitions and management
//! │
//! └── registry/       # Registry store
//!     ├── records     # One row type per entity
//!     ├── store       # RegistryStore trait and StoreError
//!     ├── asn         # ASN, RIR and ASN email tables
//!     ├── prefix      # Prefix, prefix WHOIS and WHOIS email tables
//!     ├── routing     # BGP entry and peer tables
//!     └── loader      # JSON snapshot import
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use bgpview::database::{RegistryDatabase, RegistryStore, IpVersion};
//!
//! let db = RegistryDatabase::open_in_dir("~/.bgpview")?;
//! if db.asns().is_empty() {
//!     db.load_from_path("https://example.net/registry-snapshot.json.gz")?;
//! }
//!
//! let pairs = db.peer_pairs(IpVersion::Ipv4, 65000)?;
//! ```

pub mod core;
pub mod registry;

pub use core::{AccessMode, DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION};

pub use registry::{
    AsnRecord, BgpEntryRecord, EmailRecord, IpVersion, PeerPairRecord, PrefixRecord,
    PrefixWhoisRecord, RegistryDatabase, RegistrySnapshot, RegistryStore, RirRecord,
    SnapshotCounts, StoreError, StoreResult, StoredLines, VersionedSnapshot,
    DEFAULT_BATCH_LOOKUP_SIZE,
};
