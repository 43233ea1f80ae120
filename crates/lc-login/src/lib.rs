//! Desktop-client login for League of Legends
//!
//! Drives an already running Riot Client through its login phases, has it
//! launch League, then waits for the League login session and checks that the
//! expected account is the one logged in.
//!
//! Both clients are reached through their local HTTPS APIs, whose port and
//! password are read from the lockfile each client writes on start.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lc_auth::{CaptchaService, Credentials, StaticCaptchaSolver};
//! use lc_login::{
//!     LeagueClient, LocalClient, Lockfile, LoginPhaseController, LoginTimings, RcuAuthorizer,
//!     RiotClient,
//! };
//!
//! # async fn run() -> lc_login::Result<()> {
//! let lockfile = Lockfile::read(&lc_login::default_riot_lockfile().unwrap()).await?;
//! let riot = RiotClient::connect(&lockfile)?;
//! let authorizer = RcuAuthorizer::new(
//!     LocalClient::from_lockfile(&lockfile)?,
//!     Credentials::new("player", "password"),
//!     Arc::new(StaticCaptchaSolver::new("proof")),
//!     CaptchaService::default(),
//! );
//! let controller = LoginPhaseController::new(riot, authorizer, LoginTimings::default());
//! let league = LeagueClient::new(lc_login::default_league_lockfile());
//!
//! lc_login::log_in(&controller, &league, "player", LoginTimings::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod authorizer;
pub mod config;
pub mod errors;
pub mod local;
pub mod lockfile;
pub mod phase;
pub mod session;

pub use api::{Authorization, CredentialAuthorizer, LeagueSessionApi, LoginSession, RiotClientApi};
pub use authorizer::RcuAuthorizer;
pub use config::{AuthorizerOptions, LoginTimings};
pub use errors::{LoginError, Result};
pub use local::{LeagueClient, LocalClient, RiotClient};
pub use lockfile::{Lockfile, default_league_lockfile, default_riot_lockfile};
pub use phase::{LoginPhase, LoginPhaseController};
pub use session::SessionWatcher;

/// Log in through the Riot Client, then wait for League to log in as `username`
pub async fn log_in<R, A, L>(
    controller: &LoginPhaseController<R, A>,
    league: &L,
    username: &str,
    timings: LoginTimings,
) -> Result<()>
where
    R: RiotClientApi,
    A: CredentialAuthorizer,
    L: LeagueSessionApi,
{
    controller.run().await?;

    let watcher = SessionWatcher::new(controller.riot(), league, timings);
    watcher.wait_for_session().await?;
    watcher.check_username(username).await
}
