use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lc_auth::Credentials;

#[derive(Debug, Parser)]
#[command(name = "league-client", version, about = "League of Legends account tooling")]
pub struct Cli {
    /// Settings file, defaults to settings.toml in the platform config directory
    #[arg(long, global = true, env = "LEAGUE_CLIENT_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Captcha solver program, overrides the settings file
    #[arg(long, global = true)]
    pub captcha_command: Option<String>,

    /// HTTP proxy as host:port, overrides the settings file
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a JSON snapshot of the account
    Snapshot {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Fields to leave out of the snapshot
        #[arg(long, value_enum, value_delimiter = ',')]
        skip: Vec<Field>,
    },

    /// Check whether the password is accepted
    CheckPassword {
        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Log a running Riot Client in and wait for League
    Login {
        #[command(flatten)]
        credentials: CredentialArgs,

        #[arg(long)]
        riot_lockfile: Option<PathBuf>,

        #[arg(long)]
        league_lockfile: Option<PathBuf>,
    },
}

/// Account credentials, normally supplied through the environment
#[derive(Args)]
pub struct CredentialArgs {
    #[arg(long, env = "LEAGUE_USERNAME")]
    pub username: String,

    #[arg(long, env = "LEAGUE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<CredentialArgs> for Credentials {
    fn from(args: CredentialArgs) -> Self {
        Credentials::new(args.username, args.password)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Field {
    Rank,
    Essence,
    Honor,
    Skins,
    MatchHistory,
    Party,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_snapshot_skip_list() {
        let cli = Cli::try_parse_from([
            "league-client",
            "snapshot",
            "--username",
            "player",
            "--password",
            "pw",
            "--skip",
            "rank,match-history",
        ])
        .unwrap();

        match cli.command {
            Command::Snapshot { skip, .. } => assert_eq!(skip, vec![Field::Rank, Field::MatchHistory]),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
