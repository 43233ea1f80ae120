use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::{debug, error};

use crate::errors::{LoginError, Result};

/// Connection details a desktop client publishes while it runs
///
/// The file holds one line: `name:pid:port:password:protocol`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lockfile {
    pub name: String,
    pub pid: u32,
    pub port: u16,
    pub password: String,
    pub protocol: String,
}

impl Lockfile {
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let malformed = |reason: &str| LoginError::LockfileMalformed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = contents.trim().split(':').collect();
        if parts.len() < 5 {
            return Err(malformed("expected five ':'-separated fields"));
        }

        Ok(Self {
            name: parts[0].to_string(),
            pid: parts[1].parse().map_err(|_| malformed("pid is not a number"))?,
            port: parts[2].parse().map_err(|_| malformed("port is not a number"))?,
            password: parts[3].to_string(),
            protocol: parts[4].to_string(),
        })
    }

    pub async fn read(path: &Path) -> Result<Self> {
        debug!("Reading lockfile {}", path.display());
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            error!("Failed to read lockfile {}: {}", path.display(), e);
            LoginError::LockfileUnavailable {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        Self::parse(path, &contents)
    }

    /// Base URL of the client's local API
    pub fn base_url(&self) -> String {
        format!("{}://127.0.0.1:{}", self.protocol, self.port)
    }
}

/// Default Riot Client lockfile location
pub fn default_riot_lockfile() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.data_local_dir()
            .join("Riot Games")
            .join("Riot Client")
            .join("Config")
            .join("lockfile")
    })
}

/// Default League client lockfile location
pub fn default_league_lockfile() -> PathBuf {
    PathBuf::from(r"C:\Riot Games\League of Legends\lockfile")
}
