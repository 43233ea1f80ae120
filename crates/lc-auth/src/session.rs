use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::errors::Result;

/// Username and password for one run; never persisted or logged
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token set returned by the sign-on authority
///
/// Never refreshed in place: once expired, run a new authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootToken {
    pub ssid: String,
    pub clid: Option<String>,
    pub access_token: String,
    pub id_token: String,
    pub token_type: String,
    pub scope: String,
    pub iss: String,
    pub session_state: String,
    pub expires_in: u64,
    pub issued_at: DateTime<Utc>,
}

impl RootToken {
    /// Saturates at the latest representable time for oversized lifetimes
    pub fn expires_at(&self) -> DateTime<Utc> {
        let lifetime = i64::try_from(self.expires_in)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        self.issued_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at()
    }

    /// `Authorization` header value for calls made with the access token
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Routing claims carried by the access token
    pub fn access_claims(&self) -> Result<AccessClaims> {
        AccessClaims::from_token(&self.access_token)
    }
}

/// Token issued by one derivation stage, with the type that stage returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceToken {
    pub token_type: String,
    pub token: String,
}

impl ServiceToken {
    pub fn new(token_type: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token_type: token_type.into(),
            token: token.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new("Bearer", token)
    }

    /// `Authorization` header value
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

/// Identity and routing claims from the access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub puuid: String,
    pub region: String,
    pub account_id: u64,
}

#[derive(Deserialize)]
struct RawAccessClaims {
    sub: String,
    dat: RawAccessData,
}

#[derive(Deserialize)]
struct RawAccessData {
    r: String,
    u: u64,
}

impl AccessClaims {
    pub fn from_token(access_token: &str) -> Result<Self> {
        let raw: RawAccessClaims = lc_core::decode_claims_as(access_token)?;
        Ok(Self {
            puuid: raw.sub,
            region: raw.dat.r,
            account_id: raw.dat.u,
        })
    }
}
