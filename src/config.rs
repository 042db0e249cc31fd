use crate::database::registry::DEFAULT_BATCH_LOOKUP_SIZE;
use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;

/// Default file name of the registry database inside `data_dir`
pub const DEFAULT_DATABASE_FILE: &str = "bgpview-data.sqlite3";

pub struct BgpviewConfig {
    /// Path to the directory to hold bgpview's data
    pub data_dir: String,

    /// File name of the registry database inside `data_dir`
    pub database_file: String,

    /// Maximum number of ids per batch lookup query (default: 500)
    pub batch_lookup_size: usize,
}

const EMPTY_CONFIG: &str = r#"### bgpview configuration file

### directory for the registry database
# data_dir = "~/.bgpview"

### registry database file name inside data_dir
# database_file = "bgpview-data.sqlite3"

### maximum number of ASNs or prefix ids per batch lookup query
# batch_lookup_size = 500
"#;

impl Default for BgpviewConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            data_dir: format!("{}/.bgpview", home_dir),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            batch_lookup_size: DEFAULT_BATCH_LOOKUP_SIZE,
        }
    }
}

impl BgpviewConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<BgpviewConfig> {
        let mut builder = Config::builder();

        // Add in toml configuration file, by default $HOME/.bgpview/bgpview.toml
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                let bgpview_dir = bgpview_home()?;
                std::fs::create_dir_all(bgpview_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create bgpview directory: {}", e))?;
                let p = format!("{}/bgpview.toml", bgpview_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // Settings from the environment (with a prefix of BGPVIEW), .env files included
        // E.g., `BGPVIEW_DATA_DIR=/srv/bgpview` would set the data directory
        dotenvy::dotenv().ok();
        builder = builder.add_source(config::Environment::with_prefix("BGPVIEW"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let data_dir = match config.get("data_dir") {
            Some(p) => expand_home(p)?,
            None => {
                let dir = bgpview_home()?;
                std::fs::create_dir_all(dir.as_str())
                    .map_err(|e| anyhow!("Unable to create data directory: {}", e))?;
                dir
            }
        };

        let database_file = config
            .get("database_file")
            .filter(|f| !f.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_DATABASE_FILE.to_string());

        let batch_lookup_size = match config.get("batch_lookup_size") {
            Some(s) => s
                .parse::<usize>()
                .map_err(|e| anyhow!("Invalid batch_lookup_size {:?}: {}", s, e))?
                .max(1),
            None => DEFAULT_BATCH_LOOKUP_SIZE,
        };

        Ok(BgpviewConfig {
            data_dir,
            database_file,
            batch_lookup_size,
        })
    }

    /// Get the path to the SQLite database file
    pub fn sqlite_path(&self) -> String {
        let data_dir = self.data_dir.trim_end_matches('/');
        format!("{}/{}", data_dir, self.database_file)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let lines = [
            format!("Data Directory:     {}", self.data_dir),
            format!("SQLite Path:        {}", self.sqlite_path()),
            format!("Batch Lookup Size:  {}", self.batch_lookup_size),
        ];
        lines.join("\n")
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.bgpview/bgpview.toml", home_dir)
    }
}

fn bgpview_home() -> Result<String> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    let home_str = home
        .to_str()
        .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?;
    Ok(format!("{}/.bgpview", home_str))
}

/// Replace a leading `~` with the home directory
fn expand_home(path: &str) -> Result<String> {
    match path.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
            Ok(format!("{}{}", home.to_string_lossy(), rest))
        }
        None => Ok(path.to_string()),
    }
}
