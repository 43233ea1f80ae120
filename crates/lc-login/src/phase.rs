//! Riot Client login-phase state machine

use lc_core::{Deadline, Step, poll_until};
use tracing::{debug, info, instrument, warn};

use crate::api::{Authorization, CredentialAuthorizer, RiotClientApi};
use crate::config::LoginTimings;
use crate::errors::{LoginError, Result};

/// Product-context phases the controller knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginPhase {
    Login,
    WaitForLaunch,
    Success,
    Eula,
    ConsentRequired,
    PatchStatus,
    RegionMissing,
    Banned,
    AccountAliasChange,
    VngAccountRequired,
    Unknown,
}

/// Raw phase strings reported by the client, per phase
const PHASES: &[(LoginPhase, &[&str])] = &[
    (
        LoginPhase::Login,
        &["WaitingForAuthentication", "WaitingForEula", "Done", "Disabled", "Login", ""],
    ),
    (LoginPhase::WaitForLaunch, &["WaitForLaunch"]),
    (LoginPhase::Success, &["WaitForSessionExit"]),
    (LoginPhase::Eula, &["Eula"]),
    (LoginPhase::ConsentRequired, &["AgeRestriction"]),
    (LoginPhase::AccountAliasChange, &["AccountAlias"]),
    (LoginPhase::RegionMissing, &["HomeBaseCountry"]),
    (LoginPhase::PatchStatus, &["PatchStatus", "WaitingForPatchStatus"]),
    (LoginPhase::VngAccountRequired, &["VngAccountRequired"]),
    (LoginPhase::Unknown, &["Unknown"]),
    // Bans surface through the league session instead
    (LoginPhase::Banned, &[]),
];

impl LoginPhase {
    /// `None` for phases not in the table
    pub fn from_raw(raw: &str) -> Option<Self> {
        PHASES
            .iter()
            .find(|(_, names)| names.contains(&raw))
            .map(|(phase, _)| *phase)
    }

    /// Error for phases that end the login
    pub fn failure(self) -> Option<LoginError> {
        match self {
            Self::Unknown => Some(LoginError::UnknownPhase),
            Self::RegionMissing => Some(LoginError::RegionMissing),
            Self::Banned => Some(LoginError::Banned),
            Self::ConsentRequired => Some(LoginError::ConsentRequired),
            Self::AccountAliasChange => Some(LoginError::NameChangeRequired),
            Self::VngAccountRequired => Some(LoginError::VngAccountRequired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Done,
    Patched,
}

/// Drives a running Riot Client until League has been launched
pub struct LoginPhaseController<R, A> {
    riot: R,
    authorizer: A,
    timings: LoginTimings,
}

impl<R: RiotClientApi, A: CredentialAuthorizer> LoginPhaseController<R, A> {
    pub fn new(riot: R, authorizer: A, timings: LoginTimings) -> Self {
        Self {
            riot,
            authorizer,
            timings,
        }
    }

    pub fn riot(&self) -> &R {
        &self.riot
    }

    pub fn authorizer(&self) -> &A {
        &self.authorizer
    }

    /// Poll the client phase until League is running
    ///
    /// The first finished patch wait restarts the login deadline once; later
    /// patches run against the deadline already in force.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<()> {
        info!("Logging in");
        let mut deadline = Deadline::after(self.timings.login_timeout);
        let mut extended = false;
        loop {
            let outcome = poll_until(self.timings.poll_interval, deadline, || self.poll()).await;

            match outcome.into_result(|| LoginError::Timeout("waiting for the client to log in"))? {
                Progress::Done => return Ok(()),
                Progress::Patched => {
                    info!("Riot client patched");
                    if !extended {
                        deadline = Deadline::after(self.timings.login_timeout);
                        extended = true;
                    }
                    tokio::time::sleep(self.timings.poll_interval).await;
                }
            }
        }
    }

    async fn poll(&self) -> Result<Step<Progress>> {
        match self.step().await {
            Err(e) if e.is_transient() => {
                debug!("Riot client not reachable yet: {}", e);
                Ok(Step::Pending)
            }
            other => other,
        }
    }

    async fn step(&self) -> Result<Step<Progress>> {
        let raw = self.riot.product_context_phase().await?;
        let Some(phase) = LoginPhase::from_raw(&raw) else {
            debug!("Unrecognized phase {:?}", raw);
            return Ok(Step::Pending);
        };
        info!("Riot client phase: {}", raw);

        if let Some(err) = phase.failure() {
            return Err(err);
        }

        match phase {
            LoginPhase::Success => {
                if self.riot.is_league_running().await? {
                    return Ok(Step::Ready(Progress::Done));
                }
                self.launch().await?;
            }
            LoginPhase::WaitForLaunch => self.launch().await?,
            LoginPhase::Login => match self.authorizer.authorize().await? {
                Authorization::Authorized => {
                    if self.riot.is_league_running().await? {
                        return Ok(Step::Ready(Progress::Done));
                    }
                    self.launch().await?;
                }
                Authorization::Pending => debug!("Authorized but not logged in yet"),
            },
            LoginPhase::Eula => {
                info!("Accepting EULA");
                self.riot.accept_eula().await?;
            }
            LoginPhase::PatchStatus => {
                self.wait_until_patched().await?;
                return Ok(Step::Ready(Progress::Patched));
            }
            other => warn!("Phase {:?} has no handler", other),
        }
        Ok(Step::Pending)
    }

    async fn launch(&self) -> Result<()> {
        if self.riot.is_league_running().await? {
            debug!("League is already running");
            return Ok(());
        }
        info!("Launching League");
        self.riot.launch_league().await
    }

    async fn wait_until_patched(&self) -> Result<()> {
        let deadline = Deadline::after(self.timings.patch_timeout);
        let outcome = poll_until(self.timings.patch_interval, deadline, || async move {
            match self.riot.product_context_phase().await {
                Ok(raw) if LoginPhase::from_raw(&raw) == Some(LoginPhase::PatchStatus) => {
                    info!("Patching riot client");
                    Ok(Step::Pending)
                }
                Ok(_) => Ok(Step::Ready(())),
                Err(e) if e.is_transient() || matches!(e, LoginError::Network(_)) => Ok(Step::Pending),
                Err(e) => Err(e),
            }
        })
        .await;
        outcome.into_result(|| LoginError::PatchTimeout)
    }
}
