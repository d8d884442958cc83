//! phpIPAM connection settings

use crate::region::{RegionSettings, RegionTable};
use crate::{IpamError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG: &str = "config.json";
/// System-wide fallback
pub const SYSTEM_CONFIG: &str = "/etc/netops/phpipam/config.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// phpIPAM host, optionally with scheme
    pub server: String,
    /// Static API token sent in the `token` header
    pub token: String,
    /// API application ID
    pub appid: String,
    /// Per-region overrides merged over the built-in table
    pub regions: BTreeMap<String, RegionSettings>,
}

/// On-disk layout. Shared config files carry the application ID as
/// `appid`, `app` or both.
#[derive(Deserialize)]
struct ConfigFile {
    server: String,
    token: String,
    #[serde(default)]
    appid: Option<String>,
    #[serde(default)]
    app: Option<String>,
    #[serde(default)]
    regions: BTreeMap<String, RegionSettings>,
}

impl Config {
    /// Load from an explicit path, or the first readable of `./config.json`
    /// and `/etc/netops/phpipam/config.json`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_first(&[path.to_path_buf()]),
            None => Self::load_first(&[PathBuf::from(LOCAL_CONFIG), PathBuf::from(SYSTEM_CONFIG)]),
        }
    }

    fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        for path in candidates {
            match fs::read_to_string(path) {
                Ok(content) => return Self::parse(path, &content),
                Err(e) => debug!("Skipping {}: {}", path.display(), e),
            }
        }
        Err(IpamError::ConfigNotFound)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|_| IpamError::ConfigNotFound)?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let invalid = |reason: String| IpamError::InvalidConfig {
            path: path.display().to_string(),
            reason,
        };

        let file: ConfigFile = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
        let appid = file
            .appid
            .or(file.app)
            .ok_or_else(|| invalid("missing field `appid`".into()))?;

        Ok(Self {
            server: file.server,
            token: file.token,
            appid,
            regions: file.regions,
        })
    }

    /// `https://{server}/api/{appid}`, without trailing slash.
    pub fn base_url(&self) -> String {
        let server = self.server.trim_end_matches('/');
        if server.starts_with("http://") || server.starts_with("https://") {
            format!("{}/api/{}", server, self.appid)
        } else {
            format!("https://{}/api/{}", server, self.appid)
        }
    }

    /// Built-in regions with this config's overrides applied.
    pub fn region_table(&self) -> RegionTable {
        RegionTable::builtin().with_overrides(self.regions.clone())
    }
}
