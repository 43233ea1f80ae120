//! Riot Sign-On handshake and service-token derivation
//!
//! This crate drives the sign-on authority through a credential handshake
//! and then derives the chain of service tokens League endpoints accept.
//!
//! # Authentication Flow
//!
//! 1. Authorization request, login initiation (captcha challenge issued)
//! 2. Captcha solved through a [`CaptchaGateway`]
//! 3. Credentials submitted, login token accepted
//! 4. Authorization re-issued; the redirect fragment carries the root token
//!
//! # Derivation Chain
//!
//! ```text
//! root ─┬─ userinfo ──────┐
//!       └─ entitlements ──┴─ login queue ─ ledge ─┬─ summoner
//!                                                 ├─ ranked overview
//!                                                 └─ inventory
//! ```
//!
//! # Example
//!
//! ```no_run
//! use lc_auth::{AuthParams, AuthSession, CaptchaService, Credentials, RsoConfig,
//!     StaticCaptchaSolver, TokenChain};
//!
//! # async fn example() -> lc_auth::Result<()> {
//! let config = RsoConfig::production();
//! let session = AuthSession::new(config.clone())?;
//! let root = session
//!     .authorize(
//!         &Credentials::new("user", "pass"),
//!         &AuthParams::league_client(),
//!         &StaticCaptchaSolver::new("proof"),
//!         &CaptchaService::default(),
//!     )
//!     .await?;
//!
//! let chain = TokenChain::new(config)?;
//! let userinfo = chain.userinfo(&root).await?;
//! userinfo.claims.check_restrictions()?;
//! # Ok(())
//! # }
//! ```
//!
//! Credentials and tokens are never persisted or logged.

pub mod auth;
pub mod captcha;
pub mod chain;
pub mod config;
pub mod errors;
pub mod models;
pub mod session;
pub mod transport;
pub mod userinfo;

// Re-export main types
pub use auth::AuthSession;
pub use captcha::{CaptchaChallenge, CaptchaError, CaptchaGateway, CaptchaRequest, CaptchaService, StaticCaptchaSolver};
pub use chain::{InventoryApi, InventoryOwner, TokenChain};
pub use config::{AuthParams, Endpoints, HttpTimeouts, LootRoute, ProxyConfig, RsoConfig};
pub use errors::{AccountRestricted, AuthFailure, Endpoint, Result, RsoError};
pub use models::{Inventory, InventoryType, LoginOutcome, QueueStats, RankedStats, classify_login};
pub use session::{AccessClaims, Credentials, RootToken, ServiceToken};
pub use userinfo::{Userinfo, UserinfoClaims};
