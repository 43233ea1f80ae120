//! Seams between the login flow and the local client APIs

use serde::Deserialize;

use crate::errors::Result;

/// The Riot Client side of the login flow
#[async_trait::async_trait]
pub trait RiotClientApi: Send + Sync {
    /// Raw product-context phase; an unset phase is reported as `""`
    async fn product_context_phase(&self) -> Result<String>;

    async fn launch_league(&self) -> Result<()>;

    async fn is_league_running(&self) -> Result<bool>;

    async fn accept_eula(&self) -> Result<()>;
}

/// Outcome of one credential attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    /// Accepted, but the client is not logged in yet
    Pending,
}

/// Logs the Riot Client in; invoked once per login-phase poll
#[async_trait::async_trait]
pub trait CredentialAuthorizer: Send + Sync {
    async fn authorize(&self) -> Result<Authorization>;
}

/// The League client side of the login flow
#[async_trait::async_trait]
pub trait LeagueSessionApi: Send + Sync {
    /// Current login session, `None` while the client has none
    async fn login_session(&self) -> Result<Option<LoginSession>>;

    async fn platform_username(&self) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub state: String,
    #[serde(default)]
    pub is_new_player: bool,
    #[serde(default)]
    pub error: Option<SessionErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionErrorInfo {
    pub message_id: String,
}
