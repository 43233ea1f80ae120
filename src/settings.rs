use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use directories::ProjectDirs;
use lc_account::FetchFlags;
use lc_auth::{CaptchaService, LootRoute, ProxyConfig, RsoConfig};
use lc_login::LoginTimings;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Contents of `settings.toml`; account credentials never live here
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub captcha: CaptchaSettings,
    pub proxy: Option<ProxySettings>,
    pub fetch: FetchSettings,
    pub snapshot: SnapshotSettings,
    pub timeouts: TimeoutSettings,
    pub lockfiles: LockfileSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaSettings {
    pub service_id: String,
    pub service_key: String,
    /// Solver program; receives the challenge through its environment
    pub command: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxySettings {
    /// Parse `host:port`
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        let (host, port) = value
            .rsplit_once(':')
            .with_context(|| format!("Proxy '{value}' is not host:port"))?;
        Ok(Self {
            host: host.to_string(),
            port: port
                .parse()
                .with_context(|| format!("Proxy port '{port}' is not a number"))?,
            username: None,
            password: None,
        })
    }
}

impl From<&ProxySettings> for ProxyConfig {
    fn from(proxy: &ProxySettings) -> Self {
        Self {
            host: proxy.host.clone(),
            port: proxy.port,
            username: proxy.username.clone(),
            password: proxy.password.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub rank: bool,
    pub essence: bool,
    pub honor: bool,
    pub skins: bool,
    pub match_history: bool,
    pub party: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            rank: true,
            essence: true,
            honor: true,
            skins: true,
            match_history: true,
            party: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootRouteSetting {
    #[default]
    Puuid,
    AccountId,
    SummonerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub match_history_count: u32,
    pub loot_route: LootRouteSetting,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            match_history_count: 100,
            loot_route: LootRouteSetting::default(),
        }
    }
}

/// Timeouts in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub snapshot: u64,
    pub login: u64,
    pub patch: u64,
    pub session: u64,
    pub in_progress: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            snapshot: 120,
            login: 180,
            patch: 7200,
            session: 60,
            in_progress: 180,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockfileSettings {
    pub riot: Option<PathBuf>,
    pub league: Option<PathBuf>,
    pub persist_login: bool,
}

impl Settings {
    /// `settings.toml` under the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "league-client", "league-client")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    /// Read settings, falling back to defaults when the file does not exist
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if tokio::fs::metadata(path).await.is_err() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        debug!("Loading settings from {}", path.display());
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Point at another `host:port`, keeping any proxy credentials from the file
    pub fn override_proxy(&mut self, value: &str) -> anyhow::Result<()> {
        let mut proxy = ProxySettings::parse(value)?;
        if let Some(existing) = self.proxy.take() {
            proxy.username = existing.username;
            proxy.password = existing.password;
        }
        self.proxy = Some(proxy);
        Ok(())
    }

    pub fn rso_config(&self) -> RsoConfig {
        let mut config = RsoConfig::production();
        config.proxy = self.proxy.as_ref().map(ProxyConfig::from);
        config.match_history_count = self.snapshot.match_history_count;
        config.loot_route = match self.snapshot.loot_route {
            LootRouteSetting::Puuid => LootRoute::Puuid,
            LootRouteSetting::AccountId => LootRoute::AccountId,
            LootRouteSetting::SummonerId => LootRoute::SummonerId,
        };
        config
    }

    pub fn fetch_flags(&self) -> FetchFlags {
        FetchFlags {
            rank: self.fetch.rank,
            essence: self.fetch.essence,
            honor: self.fetch.honor,
            skins: self.fetch.skins,
            match_history: self.fetch.match_history,
            party: self.fetch.party,
        }
    }

    pub fn captcha_service(&self) -> CaptchaService {
        CaptchaService {
            service_id: self.captcha.service_id.clone(),
            service_key: self.captcha.service_key.clone(),
        }
    }

    pub fn login_timings(&self) -> LoginTimings {
        LoginTimings {
            login_timeout: Duration::from_secs(self.timeouts.login),
            patch_timeout: Duration::from_secs(self.timeouts.patch),
            session_timeout: Duration::from_secs(self.timeouts.session),
            in_progress_timeout: Duration::from_secs(self.timeouts.in_progress),
            ..LoginTimings::default()
        }
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();

        let settings = Settings::load(&dir.path().join("settings.toml")).await.unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.fetch_flags(), FetchFlags::all());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(
            &path,
            r#"
[captcha]
service_id = "2captcha"
command = "solve-captcha"

[fetch]
skins = false

[snapshot]
loot_route = "account_id"

[proxy]
host = "10.0.0.2"
port = 8080
"#,
        )
        .await
        .unwrap();

        let settings = Settings::load(&path).await.unwrap();
        let config = settings.rso_config();

        assert_eq!(settings.captcha.command.as_deref(), Some("solve-captcha"));
        assert!(!settings.fetch_flags().skins);
        assert!(settings.fetch_flags().rank);
        assert_eq!(config.loot_route, LootRoute::AccountId);
        assert_eq!(config.match_history_count, 100);
        assert_eq!(config.proxy.unwrap().url(), "http://10.0.0.2:8080");
        assert_eq!(settings.login_timings().patch_timeout, Duration::from_secs(7200));
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(&path, "[fetch]\nrank = \"yes\"").await.unwrap();

        assert!(Settings::load(&path).await.is_err());
    }

    #[test]
    fn test_parse_proxy() {
        let proxy = ProxySettings::parse("proxy.local:3128").unwrap();
        assert_eq!(proxy.host, "proxy.local");
        assert_eq!(proxy.port, 3128);

        assert!(ProxySettings::parse("proxy.local").is_err());
    }

    #[tokio::test]
    async fn test_proxy_override_keeps_file_credentials() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(
            &path,
            "[proxy]\nhost = \"10.0.0.2\"\nport = 8080\nusername = \"user\"\npassword = \"pass\"\n",
        )
        .await
        .unwrap();
        let mut settings = Settings::load(&path).await.unwrap();

        settings.override_proxy("proxy.local:3128").unwrap();

        assert_eq!(
            settings.proxy,
            Some(ProxySettings {
                host: "proxy.local".to_string(),
                port: 3128,
                username: Some("user".to_string()),
                password: Some("pass".to_string()),
            })
        );
    }

    #[test]
    fn test_proxy_override_without_file_proxy() {
        let mut settings = Settings::default();

        settings.override_proxy("proxy.local:3128").unwrap();

        let proxy = settings.proxy.unwrap();
        assert_eq!((proxy.host.as_str(), proxy.port), ("proxy.local", 3128));
        assert_eq!(proxy.username, None);
    }
}
