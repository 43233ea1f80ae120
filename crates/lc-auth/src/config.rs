use std::time::Duration;

use lc_core::RegionDirectory;
use url::Url;

/// Sign-on authority endpoints
pub mod endpoints {
    pub const AUTH: &str = "https://auth.riotgames.com";
    pub const AUTHENTICATE: &str = "https://authenticate.riotgames.com";
    pub const ENTITLEMENTS: &str = "https://entitlements.auth.riotgames.com";
}

/// Desktop user agent presented on every request
pub const USER_AGENT: &str = "RiotClient/99.0.0.1234567 rso-auth (Windows;10;;Professional, x64)";

/// Site URL reported to the captcha service
pub const CAPTCHA_SITE_URL: &str = "https://authenticate.riotgames.com/api/v1/login";

/// Client version sent when registering a party
pub const GAME_CLIENT_VERSION: &str =
    "14.13.5989749+branch.releases-14-13.code.public.content.release.anticheat.vanguard";

/// Authorization request parameters for one client scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthParams {
    pub client_id: String,
    pub scope: String,
    pub nonce: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub acr_values: String,
    pub claims: String,
}

impl AuthParams {
    /// Riot client scope (account-level claims)
    pub fn riot_client() -> Self {
        Self::with_client("riot-client", "openid link ban lol_region account")
    }

    /// League client scope, required for the ledge token chain
    pub fn league_client() -> Self {
        Self::with_client("lol", "openid link ban lol_region lol summoner offline_access")
    }

    fn with_client(client_id: &str, scope: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            scope: scope.to_string(),
            nonce: "SYXugqaAL5z7U7iioaTW5Q".to_string(),
            redirect_uri: "http://localhost/redirect".to_string(),
            response_type: "token id_token".to_string(),
            code_challenge: String::new(),
            code_challenge_method: String::new(),
            acr_values: String::new(),
            claims: String::new(),
        }
    }

    /// Query pairs for the authorization request
    pub fn query(&self) -> [(&'static str, &str); 9] {
        [
            ("acr_values", self.acr_values.as_str()),
            ("claims", self.claims.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_challenge", self.code_challenge.as_str()),
            ("code_challenge_method", self.code_challenge_method.as_str()),
            ("nonce", self.nonce.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", self.response_type.as_str()),
            ("scope", self.scope.as_str()),
        ]
    }
}

/// Base URLs of the sign-on authority
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub auth: Url,
    pub authenticate: Url,
    pub entitlements: Url,
}

impl Endpoints {
    /// Point every authority endpoint at one base URL (tests, proxies)
    pub fn single(base: &Url) -> Self {
        Self {
            auth: base.clone(),
            authenticate: base.clone(),
            entitlements: base.clone(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth: Url::parse(endpoints::AUTH).expect("valid auth URL"),
            authenticate: Url::parse(endpoints::AUTHENTICATE).expect("valid authenticate URL"),
            entitlements: Url::parse(endpoints::ENTITLEMENTS).expect("valid entitlements URL"),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// HTTP proxy threaded through every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// `http://host:port`, without credentials
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Which player identifier the loot endpoint is addressed by
///
/// Deployments have served loot both by puuid and by a numeric id in the
/// path; the numeric id has been seen as either the account id or the
/// summoner id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LootRoute {
    /// `/loot/v2/player/{puuid}/loot/definitions`
    #[default]
    Puuid,
    /// `/loot/v1/playerlootdefinitions/location/{location}/playerId/{account_id}`
    AccountId,
    /// `/loot/v1/playerlootdefinitions/location/{location}/playerId/{summoner_id}`
    SummonerId,
}

/// Configuration shared by every RSO component
///
/// Built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct RsoConfig {
    /// Sign-on authority base URLs
    pub endpoints: Endpoints,

    /// Regional routing tables
    pub regions: RegionDirectory,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// User agent for every request
    pub user_agent: String,

    /// Optional proxy
    pub proxy: Option<ProxyConfig>,

    /// Refuse plain HTTP
    pub https_only: bool,

    /// Restrict TLS to the pinned cipher suites and curve
    pub pinned_tls: bool,

    /// Games requested from match history
    pub match_history_count: u32,

    /// Version string sent on party registration
    pub game_client_version: String,

    /// Player identifier used by the loot endpoint
    pub loot_route: LootRoute,
}

impl RsoConfig {
    /// Production configuration against the public authority
    pub fn production() -> Self {
        Self {
            endpoints: Endpoints::default(),
            regions: RegionDirectory::builtin(),
            http_timeouts: HttpTimeouts::default(),
            user_agent: USER_AGENT.to_string(),
            proxy: None,
            https_only: true,
            pinned_tls: true,
            match_history_count: 100,
            game_client_version: GAME_CLIENT_VERSION.to_string(),
            loot_route: LootRoute::default(),
        }
    }

    /// Configuration against local stub servers: plain HTTP, default TLS
    pub fn local(endpoints: Endpoints, regions: RegionDirectory) -> Self {
        Self {
            endpoints,
            regions,
            https_only: false,
            pinned_tls: false,
            ..Self::production()
        }
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

impl Default for RsoConfig {
    fn default() -> Self {
        Self::production()
    }
}
