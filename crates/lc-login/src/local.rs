use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::api::{LeagueSessionApi, LoginSession, RiotClientApi};
use crate::errors::{LoginError, Result};
use crate::lockfile::Lockfile;

const LOCAL_USER: &str = "riot";
const LEAGUE_PRODUCT: &str = "league_of_legends";

/// Basic-auth HTTP client for a desktop client's local API
#[derive(Debug, Clone)]
pub struct LocalClient {
    base: Url,
    password: String,
    http: Client,
}

impl LocalClient {
    pub fn new(base_url: &str, password: impl Into<String>) -> Result<Self> {
        // The local API serves a self-signed certificate on 127.0.0.1
        let http = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base: Url::parse(base_url)?,
            password: password.into(),
            http,
        })
    }

    pub fn from_lockfile(lockfile: &Lockfile) -> Result<Self> {
        Self::new(&lockfile.base_url(), lockfile.password.clone())
    }

    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let url = self.base.join(path)?;
        debug!("{} {}", method, path);

        let mut request = self
            .http
            .request(method, url)
            .basic_auth(LOCAL_USER, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request::<Value>(Method::GET, path, None).await
    }

    /// Send and decode, failing on non-success statuses
    pub async fn json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.request(method, path, body).await?;
        let response = ensure_success(path, response).await?;
        decode(path, response).await
    }
}

pub(crate) async fn ensure_success(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LoginError::Http {
        path: path.to_string(),
        status,
        body_snippet: body.chars().take(200).collect(),
    })
}

pub(crate) async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| lc_core::ParseError::new(format!("{path} response"), e).into())
}

/// Riot Client local API
#[derive(Debug, Clone)]
pub struct RiotClient {
    local: LocalClient,
}

impl RiotClient {
    pub fn new(local: LocalClient) -> Self {
        Self { local }
    }

    pub fn connect(lockfile: &Lockfile) -> Result<Self> {
        Ok(Self::new(LocalClient::from_lockfile(lockfile)?))
    }

    pub fn local(&self) -> &LocalClient {
        &self.local
    }
}

#[async_trait::async_trait]
impl RiotClientApi for RiotClient {
    async fn product_context_phase(&self) -> Result<String> {
        let path = "/rnet-lifecycle/v1/product-context-phase";
        let response = self.local.get(path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(String::new());
        }
        let response = ensure_success(path, response).await?;
        decode(path, response).await
    }

    async fn launch_league(&self) -> Result<()> {
        let path = "/product-launcher/v1/products/league_of_legends/patchlines/live";
        let response = self.local.request::<Value>(Method::POST, path, None).await?;
        ensure_success(path, response).await?;
        Ok(())
    }

    async fn is_league_running(&self) -> Result<bool> {
        let sessions: HashMap<String, Value> = self
            .local
            .json::<_, Value>(Method::GET, "/product-session/v1/external-sessions", None)
            .await?;
        Ok(sessions
            .values()
            .any(|session| session.get("productId").and_then(Value::as_str) == Some(LEAGUE_PRODUCT)))
    }

    async fn accept_eula(&self) -> Result<()> {
        let path = "/eula/v1/agreement/acceptance";
        let response = self.local.request::<Value>(Method::PUT, path, None).await?;
        ensure_success(path, response).await?;
        Ok(())
    }
}

/// League client local API, connected once its lockfile appears
///
/// The lockfile is re-read on every call so a restarted client, which
/// publishes a new port and password, is picked up.
#[derive(Debug)]
pub struct LeagueClient {
    source: Connection,
}

#[derive(Debug)]
enum Connection {
    Fixed(LocalClient),
    Lockfile {
        path: PathBuf,
        cached: Mutex<Option<(Lockfile, LocalClient)>>,
    },
}

impl LeagueClient {
    pub fn new(lockfile: impl Into<PathBuf>) -> Self {
        Self {
            source: Connection::Lockfile {
                path: lockfile.into(),
                cached: Mutex::new(None),
            },
        }
    }

    /// Client bound to an already known connection
    pub fn connected(local: LocalClient) -> Self {
        Self {
            source: Connection::Fixed(local),
        }
    }

    async fn local(&self) -> Result<LocalClient> {
        let (path, cached) = match &self.source {
            Connection::Fixed(local) => return Ok(local.clone()),
            Connection::Lockfile { path, cached } => (path, cached),
        };

        let lockfile = Lockfile::read(path).await?;
        let mut cached = cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, local)) = cached.as_ref().filter(|(known, _)| *known == lockfile) {
            return Ok(local.clone());
        }

        debug!("Connecting to League on port {}", lockfile.port);
        let local = LocalClient::from_lockfile(&lockfile)?;
        *cached = Some((lockfile, local.clone()));
        Ok(local)
    }
}

#[async_trait::async_trait]
impl LeagueSessionApi for LeagueClient {
    async fn login_session(&self) -> Result<Option<LoginSession>> {
        let path = "/lol-login/v1/session";
        let response = self.local().await?.get(path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(path, response).await?;
        Ok(Some(decode(path, response).await?))
    }

    async fn platform_username(&self) -> Result<Option<String>> {
        let credentials: Value = self
            .local()
            .await?
            .json::<_, Value>(Method::GET, "/lol-login/v1/login-platform-credentials", None)
            .await?;
        Ok(credentials
            .get("username")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}
