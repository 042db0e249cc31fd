//! Database schema management
//!
//! Table layout for the registry store. ASN, RIR and email tables are shared;
//! prefix, prefix WHOIS, BGP entry and peer tables exist once per IP version
//! with identical columns.

use anyhow::{anyhow, Result};
use rusqlite::Connection;

/// Current schema version
/// Increment this when making breaking schema changes
pub const SCHEMA_VERSION: u32 = 1;

/// Schema definitions for all tables in the registry database
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// SQL for creating the meta table (tracks schema version and load metadata)
    pub const META_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS bgpview_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );
    "#;

    pub const RIRS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS rirs (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );
    "#;

    pub const ASNS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS asns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rir_id INTEGER,
            asn INTEGER NOT NULL UNIQUE,
            name TEXT,
            description TEXT,
            description_full TEXT,
            country_code TEXT,
            owner_address TEXT,
            raw_whois TEXT
        );
    "#;

    pub const ASN_EMAILS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS asn_emails (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            asn_id INTEGER NOT NULL,
            email_address TEXT NOT NULL,
            abuse_email INTEGER NOT NULL DEFAULT 0
        );
    "#;

    /// Per-version tables, `{v}` is replaced by `ipv4` or `ipv6`.
    ///
    /// Decimal range bounds are stored as text since IPv6 bounds exceed
    /// SQLite's 64-bit integers.
    const PREFIXES_TEMPLATE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS {v}_bgp_prefixes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ip TEXT NOT NULL,
            cidr INTEGER NOT NULL,
            ip_dec_start TEXT NOT NULL,
            ip_dec_end TEXT NOT NULL,
            asn INTEGER NOT NULL,
            roa_status TEXT
        );
    "#;

    const PREFIX_WHOIS_TEMPLATE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS {v}_prefix_whois (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bgp_prefix_id INTEGER,
            rir_id INTEGER,
            ip TEXT NOT NULL,
            cidr INTEGER NOT NULL,
            parent_ip TEXT,
            parent_cidr INTEGER,
            name TEXT,
            description_full TEXT,
            country_code TEXT,
            owner_address TEXT,
            raw_whois TEXT,
            status TEXT
        );
    "#;

    const BGP_ENTRIES_TEMPLATE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS {v}_bgp_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ip TEXT,
            cidr INTEGER,
            asn INTEGER NOT NULL,
            upstream_asn INTEGER NOT NULL,
            bgp_path TEXT NOT NULL
        );
    "#;

    const PEERS_TEMPLATE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS {v}_peers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            asn_1 INTEGER NOT NULL,
            asn_2 INTEGER NOT NULL
        );
    "#;

    /// WHOIS email tables keep their historical names: the IPv4 table has no prefix.
    pub const PREFIX_WHOIS_EMAILS_TABLES: &'static [&'static str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS prefix_whois_emails (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prefix_whois_id INTEGER NOT NULL,
            email_address TEXT NOT NULL,
            abuse_email INTEGER NOT NULL DEFAULT 0
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS ipv6_prefix_whois_emails (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prefix_whois_id INTEGER NOT NULL,
            email_address TEXT NOT NULL,
            abuse_email INTEGER NOT NULL DEFAULT 0
        );
        "#,
    ];

    pub const SHARED_INDEXES: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS idx_asn_emails_asn_id ON asn_emails(asn_id)",
        "CREATE INDEX IF NOT EXISTS idx_prefix_whois_emails_owner ON prefix_whois_emails(prefix_whois_id)",
        "CREATE INDEX IF NOT EXISTS idx_ipv6_prefix_whois_emails_owner ON ipv6_prefix_whois_emails(prefix_whois_id)",
    ];

    const VERSIONED_INDEX_TEMPLATES: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS idx_{v}_bgp_prefixes_asn ON {v}_bgp_prefixes(asn)",
        "CREATE INDEX IF NOT EXISTS idx_{v}_bgp_prefixes_network ON {v}_bgp_prefixes(ip, cidr)",
        "CREATE INDEX IF NOT EXISTS idx_{v}_prefix_whois_prefix ON {v}_prefix_whois(bgp_prefix_id)",
        "CREATE INDEX IF NOT EXISTS idx_{v}_bgp_entries_asn ON {v}_bgp_entries(asn)",
        "CREATE INDEX IF NOT EXISTS idx_{v}_bgp_entries_upstream ON {v}_bgp_entries(upstream_asn)",
        "CREATE INDEX IF NOT EXISTS idx_{v}_peers_asn_1 ON {v}_peers(asn_1)",
        "CREATE INDEX IF NOT EXISTS idx_{v}_peers_asn_2 ON {v}_peers(asn_2)",
    ];

    const VERSIONS: [&'static str; 2] = ["ipv4", "ipv6"];

    /// All per-version CREATE TABLE statements, both versions expanded
    pub fn versioned_tables() -> Vec<String> {
        let templates = [
            Self::PREFIXES_TEMPLATE,
            Self::PREFIX_WHOIS_TEMPLATE,
            Self::BGP_ENTRIES_TEMPLATE,
            Self::PEERS_TEMPLATE,
        ];
        Self::expand(&templates)
    }

    /// All per-version CREATE INDEX statements, both versions expanded
    pub fn versioned_indexes() -> Vec<String> {
        Self::expand(Self::VERSIONED_INDEX_TEMPLATES)
    }

    fn expand(templates: &[&str]) -> Vec<String> {
        Self::VERSIONS
            .iter()
            .flat_map(|v| templates.iter().map(move |t| t.replace("{v}", v)))
            .collect()
    }

    /// Names of every table the schema creates
    pub fn table_names() -> Vec<String> {
        let mut names: Vec<String> = [
            "bgpview_meta",
            "rirs",
            "asns",
            "asn_emails",
            "prefix_whois_emails",
            "ipv6_prefix_whois_emails",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for v in Self::VERSIONS {
            for base in ["bgp_prefixes", "prefix_whois", "bgp_entries", "peers"] {
                names.push(format!("{}_{}", v, base));
            }
        }
        names
    }
}

/// Schema manager for the registry database
///
/// Handles schema initialization, version checking, and resets.
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Initialize the database schema
    ///
    /// Creates all tables and indexes if they don't exist and records the
    /// schema version in the meta table.
    pub fn initialize(&self) -> Result<()> {
        self.conn
            .execute(SchemaDefinitions::META_TABLE, [])
            .map_err(|e| anyhow!("Failed to create meta table: {}", e))?;

        self.set_meta("schema_version", &SCHEMA_VERSION.to_string())?;

        for (name, sql) in [
            ("rirs", SchemaDefinitions::RIRS_TABLE),
            ("asns", SchemaDefinitions::ASNS_TABLE),
            ("asn_emails", SchemaDefinitions::ASN_EMAILS_TABLE),
        ] {
            self.conn
                .execute(sql, [])
                .map_err(|e| anyhow!("Failed to create {} table: {}", name, e))?;
        }

        for sql in SchemaDefinitions::PREFIX_WHOIS_EMAILS_TABLES {
            self.conn
                .execute(sql, [])
                .map_err(|e| anyhow!("Failed to create prefix WHOIS email table: {}", e))?;
        }

        for sql in SchemaDefinitions::versioned_tables() {
            self.conn
                .execute(&sql, [])
                .map_err(|e| anyhow!("Failed to create per-version table: {}", e))?;
        }

        for sql in SchemaDefinitions::SHARED_INDEXES {
            self.conn
                .execute(sql, [])
                .map_err(|e| anyhow!("Failed to create index: {}", e))?;
        }

        for sql in SchemaDefinitions::versioned_indexes() {
            self.conn
                .execute(&sql, [])
                .map_err(|e| anyhow!("Failed to create per-version index: {}", e))?;
        }

        Ok(())
    }

    /// Check the current schema status
    pub fn check_status(&self) -> Result<SchemaStatus> {
        let meta_exists: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='bgpview_meta'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if meta_exists == 0 {
            return Ok(SchemaStatus::NotInitialized);
        }

        let current_version = self.get_schema_version()?;

        if current_version == SCHEMA_VERSION {
            if self.verify_integrity()? {
                Ok(SchemaStatus::Current)
            } else {
                Ok(SchemaStatus::Corrupted)
            }
        } else if current_version < SCHEMA_VERSION {
            Ok(SchemaStatus::NeedsMigration {
                from: current_version,
                to: SCHEMA_VERSION,
            })
        } else {
            Ok(SchemaStatus::Incompatible {
                database_version: current_version,
                required_version: SCHEMA_VERSION,
            })
        }
    }

    /// Get the current schema version from the database
    fn get_schema_version(&self) -> Result<u32> {
        let version: String = self
            .conn
            .query_row(
                "SELECT value FROM bgpview_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap_or_else(|_| "0".to_string());

        version
            .parse()
            .map_err(|e| anyhow!("Invalid schema version: {}", e))
    }

    /// Verify schema integrity by checking required tables exist
    fn verify_integrity(&self) -> Result<bool> {
        for table in SchemaDefinitions::table_names() {
            let exists: i32 = self
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [&table],
                    |row| row.get(0),
                )
                .unwrap_or(0);

            if exists == 0 {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Set a metadata value
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO bgpview_meta (key, value, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))",
                [key, value],
            )
            .map_err(|e| anyhow!("Failed to set meta value: {}", e))?;
        Ok(())
    }

    /// Get a metadata value
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let result: Result<String, _> = self.conn.query_row(
            "SELECT value FROM bgpview_meta WHERE key = ?1",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(anyhow!("Failed to get meta value: {}", e)),
        }
    }

    /// Reset the database by dropping all tables
    pub fn reset(&self) -> Result<()> {
        for table in SchemaDefinitions::table_names().iter().rev() {
            self.conn
                .execute(&format!("DROP TABLE IF EXISTS {}", table), [])
                .map_err(|e| anyhow!("Failed to drop table {}: {}", table, e))?;
        }
        Ok(())
    }
}

/// Status of the database schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Database is not initialized (fresh database)
    NotInitialized,

    /// Schema is current and valid
    Current,

    /// Schema needs migration from an older version
    NeedsMigration { from: u32, to: u32 },

    /// Database is from a newer version (incompatible)
    Incompatible {
        database_version: u32,
        required_version: u32,
    },

    /// Schema is corrupted (missing tables)
    Corrupted,
}
