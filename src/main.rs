mod captcha;
mod cli;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lc_account::{AccountAggregator, FetchFlags};
use lc_auth::{AuthSession, CaptchaGateway, Credentials};
use lc_core::Deadline;
use lc_login::{
    AuthorizerOptions, LeagueClient, LocalClient, Lockfile, LoginPhaseController, RcuAuthorizer,
    RiotClient,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::captcha::CommandCaptchaGateway;
use crate::cli::{Cli, Command, Field};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli).await?;

    match cli.command {
        Command::Snapshot { credentials, skip } => {
            snapshot(&settings, credentials.into(), flags(&settings, &skip)).await
        }
        Command::CheckPassword { credentials } => check_password(&settings, credentials.into()).await,
        Command::Login {
            credentials,
            riot_lockfile,
            league_lockfile,
        } => login(&settings, credentials.into(), riot_lockfile, league_lockfile).await,
    }
}

async fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let path = match &cli.settings {
        Some(path) => path.clone(),
        None => Settings::default_path().context("Failed to determine the config directory")?,
    };
    let mut settings = Settings::load(&path).await?;

    if let Some(command) = &cli.captcha_command {
        settings.captcha.command = Some(command.clone());
    }
    if let Some(proxy) = &cli.proxy {
        settings.override_proxy(proxy)?;
    }
    Ok(settings)
}

fn flags(settings: &Settings, skip: &[Field]) -> FetchFlags {
    let mut flags = settings.fetch_flags();
    for field in skip {
        match field {
            Field::Rank => flags.rank = false,
            Field::Essence => flags.essence = false,
            Field::Honor => flags.honor = false,
            Field::Skins => flags.skins = false,
            Field::MatchHistory => flags.match_history = false,
            Field::Party => flags.party = false,
        }
    }
    flags
}

fn captcha_gateway(settings: &Settings) -> anyhow::Result<Arc<dyn CaptchaGateway>> {
    let command = settings
        .captcha
        .command
        .as_ref()
        .context("No captcha solver configured; set captcha.command or --captcha-command")?;
    Ok(Arc::new(CommandCaptchaGateway::new(
        command.clone(),
        settings.captcha.args.clone(),
    )))
}

async fn snapshot(settings: &Settings, credentials: Credentials, flags: FetchFlags) -> anyhow::Result<()> {
    let gateway = captcha_gateway(settings)?;
    let aggregator = AccountAggregator::new(settings.rso_config())?;
    let deadline = Deadline::after(settings.snapshot_timeout());

    let snapshot = aggregator
        .fetch_snapshot(
            &credentials,
            gateway.as_ref(),
            &settings.captcha_service(),
            flags,
            deadline,
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn check_password(settings: &Settings, credentials: Credentials) -> anyhow::Result<()> {
    let gateway = captcha_gateway(settings)?;
    let session = AuthSession::new(settings.rso_config())?;

    let valid = session
        .check_password(&credentials, gateway.as_ref(), &settings.captcha_service())
        .await?;

    println!("{}", json!({ "valid": valid }));
    Ok(())
}

async fn login(
    settings: &Settings,
    credentials: Credentials,
    riot_lockfile: Option<PathBuf>,
    league_lockfile: Option<PathBuf>,
) -> anyhow::Result<()> {
    let riot_lockfile = riot_lockfile
        .or_else(|| settings.lockfiles.riot.clone())
        .or_else(lc_login::default_riot_lockfile)
        .context("Failed to locate the Riot Client lockfile")?;
    let league_lockfile = league_lockfile
        .or_else(|| settings.lockfiles.league.clone())
        .unwrap_or_else(lc_login::default_league_lockfile);

    let lockfile = Lockfile::read(&riot_lockfile).await?;
    let riot = RiotClient::connect(&lockfile)?;
    let username = credentials.username.clone();

    let mut authorizer = RcuAuthorizer::new(
        LocalClient::from_lockfile(&lockfile)?,
        credentials,
        captcha_gateway(settings)?,
        settings.captcha_service(),
    )
    .with_options(AuthorizerOptions {
        persist_login: settings.lockfiles.persist_login,
        ..AuthorizerOptions::default()
    });
    if let Some(proxy) = &settings.proxy {
        authorizer = authorizer.with_proxy(proxy.into());
    }

    let timings = settings.login_timings();
    let controller = LoginPhaseController::new(riot, authorizer, timings);
    let league = LeagueClient::new(league_lockfile);

    lc_login::log_in(&controller, &league, &username, timings).await?;
    info!("League client is logged in");
    println!("{}", json!({ "logged_in": true }));
    Ok(())
}
