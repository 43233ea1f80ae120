use std::path::PathBuf;

use lc_auth::{AuthFailure, CaptchaError};
use lc_core::ParseError;
use thiserror::Error;

/// Desktop-client login error types
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Lockfile {path} is not available")]
    LockfileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lockfile {path} is malformed: {reason}")]
    LockfileMalformed { path: PathBuf, reason: String },

    #[error("Client phase is Unknown")]
    UnknownPhase,

    #[error("Account region is missing")]
    RegionMissing,

    #[error("Account is banned")]
    Banned,

    #[error("Account requires consent")]
    ConsentRequired,

    #[error("Account is age restricted")]
    AgeRestricted,

    #[error("Account country is missing")]
    CountryRegionMissing,

    #[error("Account requires a name change")]
    NameChangeRequired,

    #[error("Account requires a VNG account")]
    VngAccountRequired,

    #[error("Login token was refused: {0}")]
    LoginToken(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error("Captcha could not be solved: {0}")]
    Captcha(#[from] CaptchaError),

    #[error("Client did not report a captcha challenge")]
    MissingChallenge,

    #[error("Timed out while {0}")]
    Timeout(&'static str),

    #[error("Patching did not finish in time")]
    PatchTimeout,

    #[error("League session failed: {0}")]
    SessionFailed(String),

    #[error("Account has not finished the new player flow")]
    NewPlayer,

    #[error("Logged in as '{actual}' instead of '{expected}'")]
    WrongAccount { expected: String, actual: String },

    #[error("Local API {path} returned HTTP {status}: {body_snippet}")]
    Http {
        path: String,
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl LoginError {
    /// Failures expected while a client is still starting up
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LockfileUnavailable { .. } | Self::LockfileMalformed { .. } => true,
            Self::Network(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoginError>;
