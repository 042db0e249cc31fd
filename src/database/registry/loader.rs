//! Snapshot loading
//!
//! Populates the registry database from a JSON snapshot of all tables. Row ids
//! present in the snapshot are preserved so that emails, WHOIS records and
//! prefixes can reference each other.

use super::records::{
    AsnRecord, BgpEntryRecord, EmailRecord, IpVersion, PeerPairRecord, PrefixRecord,
    PrefixWhoisRecord, RirRecord,
};
use super::{decimal_bounds, AsnRepository, PrefixRepository, RegistryDatabase, RoutingRepository};
use crate::database::core::SchemaDefinitions;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Contents of one IP version's tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionedSnapshot {
    pub prefixes: Vec<PrefixRecord>,
    pub prefix_whois: Vec<PrefixWhoisRecord>,
    pub prefix_whois_emails: Vec<EmailRecord>,
    pub bgp_entries: Vec<BgpEntryRecord>,
    pub peers: Vec<PeerPairRecord>,
}

/// Full registry snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySnapshot {
    pub rirs: Vec<RirRecord>,
    pub asns: Vec<AsnRecord>,
    pub asn_emails: Vec<EmailRecord>,
    pub ipv4: VersionedSnapshot,
    pub ipv6: VersionedSnapshot,
}

impl RegistrySnapshot {
    pub fn version(&self, version: IpVersion) -> &VersionedSnapshot {
        match version {
            IpVersion::Ipv4 => &self.ipv4,
            IpVersion::Ipv6 => &self.ipv6,
        }
    }
}

/// Number of rows stored per table group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotCounts {
    pub rirs: usize,
    pub asns: usize,
    pub emails: usize,
    pub prefixes: usize,
    pub prefix_whois: usize,
    pub bgp_entries: usize,
    pub peers: usize,
    /// Prefixes rejected as invalid networks
    pub skipped_prefixes: usize,
}

impl RegistryDatabase {
    /// Remove all registry rows, keeping the schema and meta table
    pub fn clear(&self) -> Result<()> {
        for table in SchemaDefinitions::table_names() {
            if table == "bgpview_meta" {
                continue;
            }
            self.connection()
                .execute(&format!("DELETE FROM {}", table), [])
                .map_err(|e| anyhow!("Failed to clear {}: {}", table, e))?;
        }
        Ok(())
    }

    /// Replace the database contents with `snapshot`
    ///
    /// All inserts run in one transaction; an error leaves the previous contents intact.
    /// Prefixes that do not parse as networks of their IP version are skipped and
    /// counted; any other insert failure aborts the load.
    pub fn store_snapshot(
        &self,
        snapshot: &RegistrySnapshot,
        source: &str,
    ) -> Result<SnapshotCounts> {
        let tx = self.db.transaction()?;

        self.clear()?;

        let mut counts = SnapshotCounts::default();
        let asns = AsnRepository::new(&tx, 1);

        for rir in &snapshot.rirs {
            asns.insert_rir(rir)?;
            counts.rirs += 1;
        }
        for record in &snapshot.asns {
            asns.insert(record)?;
            counts.asns += 1;
        }
        for email in &snapshot.asn_emails {
            asns.insert_email(email)?;
            counts.emails += 1;
        }

        for version in IpVersion::ALL {
            let data = snapshot.version(version);
            let prefixes = PrefixRepository::new(&tx, version, 1);
            let routing = RoutingRepository::new(&tx, version);

            for record in &data.prefixes {
                if decimal_bounds(version, &record.ip, record.cidr).is_none() {
                    warn!(
                        "Skipping invalid {} prefix {} from {}",
                        version,
                        record.prefix(),
                        source
                    );
                    counts.skipped_prefixes += 1;
                    continue;
                }
                prefixes.insert(record)?;
                counts.prefixes += 1;
            }
            for record in &data.prefix_whois {
                prefixes.insert_whois(record)?;
                counts.prefix_whois += 1;
            }
            for email in &data.prefix_whois_emails {
                prefixes.insert_whois_email(email)?;
                counts.emails += 1;
            }
            for entry in &data.bgp_entries {
                routing.insert_entry(entry)?;
                counts.bgp_entries += 1;
            }
            for pair in &data.peers {
                routing.insert_peer(pair)?;
                counts.peers += 1;
            }
        }

        tx.commit()
            .map_err(|e| anyhow!("Failed to commit transaction: {}", e))?;

        self.set_meta("source", source)?;
        self.set_meta("loaded_at", &chrono::Utc::now().timestamp().to_string())?;

        info!(
            "Registry snapshot loaded from {}: {} ASNs, {} prefixes ({} skipped), {} WHOIS, {} BGP entries, {} peers",
            source,
            counts.asns,
            counts.prefixes,
            counts.skipped_prefixes,
            counts.prefix_whois,
            counts.bgp_entries,
            counts.peers
        );

        Ok(counts)
    }

    /// Load a snapshot from a local path or URL (compressed files are supported)
    #[cfg(feature = "loader")]
    pub fn load_from_path(&self, path: &str) -> Result<SnapshotCounts> {
        info!("Loading registry snapshot from {}...", path);

        let snapshot: RegistrySnapshot = oneio::read_json_struct(path)
            .map_err(|e| anyhow!("Failed to read registry snapshot from {}: {}", path, e))?;

        self.store_snapshot(&snapshot, path)
    }
}
