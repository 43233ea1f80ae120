use std::fmt;

use lc_core::{ParseError, RegionNotSupported};
use thiserror::Error;

use crate::captcha::CaptchaError;

/// RSO pipeline error types
#[derive(Error, Debug)]
pub enum RsoError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error(transparent)]
    RegionNotSupported(#[from] RegionNotSupported),

    #[error("{endpoint} returned HTTP {status}: {body_snippet}")]
    UpstreamBadResponse {
        endpoint: Endpoint,
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("Account is restricted: {0}")]
    Restricted(#[from] AccountRestricted),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Captcha could not be solved: {0}")]
    Captcha(#[from] CaptchaError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("{0} token is required but was not provided")]
    MissingToken(Endpoint),

    #[error("Root token expired - start a new authorization run")]
    TokenExpired,

    #[error("Deadline exceeded while {0}")]
    DeadlineExceeded(&'static str),
}

impl RsoError {
    /// Build an upstream error from a failed response, keeping a body snippet
    pub fn upstream(endpoint: Endpoint, status: reqwest::StatusCode, body: &str) -> Self {
        Self::UpstreamBadResponse {
            endpoint,
            status,
            body_snippet: body.chars().take(200).collect(),
        }
    }
}

/// Outcomes of the credential handshake that callers must handle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Wrong username or password")]
    WrongPassword,

    #[error("Multifactor authentication is required")]
    MultifactorRequired,

    #[error("Rate limited by the sign-on authority")]
    RateLimited,

    #[error("Invalid session: {0}")]
    InvalidSession(String),
}

/// Restrictions read from userinfo claims before any ledge work
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountRestricted {
    #[error("Account is permanently banned")]
    Banned,

    #[error("Account has a chat restriction")]
    ChatRestricted,

    #[error("Account has a time ban")]
    TimeBanned,

    #[error("Account has game restrictions: {0:?}")]
    Generic(Vec<String>),

    #[error("Account has third-party login providers: {0:?}")]
    ThirdPartyLogin(Vec<String>),
}

/// Remote endpoint a request was made to, used to tag upstream failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Authorization,
    LoginStart,
    LoginComplete,
    LoginToken,
    Userinfo,
    Entitlements,
    LoginQueue,
    LedgeSession,
    Summoner,
    RankedOverview,
    Inventory,
    InventoryV2,
    Loot,
    Honor,
    MatchHistory,
    PartyRegistration,
    PartyRestrictions,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authorization => "authorization",
            Self::LoginStart => "login-start",
            Self::LoginComplete => "login-complete",
            Self::LoginToken => "login-token",
            Self::Userinfo => "userinfo",
            Self::Entitlements => "entitlements",
            Self::LoginQueue => "login-queue",
            Self::LedgeSession => "ledge-session",
            Self::Summoner => "summoner",
            Self::RankedOverview => "ranked-overview",
            Self::Inventory => "inventory",
            Self::InventoryV2 => "inventory-v2",
            Self::Loot => "loot",
            Self::Honor => "honor",
            Self::MatchHistory => "match-history",
            Self::PartyRegistration => "party-registration",
            Self::PartyRestrictions => "party-restrictions",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, RsoError>;
