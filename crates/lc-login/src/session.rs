use lc_core::{Deadline, Step, poll_until};
use tracing::{debug, info, instrument};

use crate::api::{LeagueSessionApi, LoginSession, RiotClientApi};
use crate::config::LoginTimings;
use crate::errors::{LoginError, Result};

const SUCCEEDED: &str = "SUCCEEDED";
const IN_PROGRESS: &str = "IN_PROGRESS";
const ERROR: &str = "ERROR";
const ACCOUNT_BANNED: &str = "ACCOUNT_BANNED";

/// Watches the League client once the Riot Client has launched it
pub struct SessionWatcher<'a, R: ?Sized, L: ?Sized> {
    riot: &'a R,
    league: &'a L,
    timings: LoginTimings,
}

impl<'a, R, L> SessionWatcher<'a, R, L>
where
    R: RiotClientApi + ?Sized,
    L: LeagueSessionApi + ?Sized,
{
    pub fn new(riot: &'a R, league: &'a L, timings: LoginTimings) -> Self {
        Self {
            riot,
            league,
            timings,
        }
    }

    /// Wait for the League login session to succeed, relaunching League if it is gone
    #[instrument(skip(self))]
    pub async fn wait_for_session(&self) -> Result<()> {
        info!("Waiting for session");
        let deadline = Deadline::after(self.timings.session_timeout);
        let outcome = poll_until(self.timings.session_interval, deadline, || async move {
            match self.check_session().await {
                Err(e) if e.is_transient() => {
                    debug!("League client not reachable yet: {}", e);
                    Ok(Step::Pending)
                }
                other => other,
            }
        })
        .await;
        outcome.into_result(|| LoginError::Timeout("waiting for the league session"))
    }

    async fn check_session(&self) -> Result<Step<()>> {
        if !self.riot.is_league_running().await? {
            info!("League is not running, launching");
            self.riot.launch_league().await?;
            return Ok(Step::Pending);
        }

        let Some(session) = self.league.login_session().await? else {
            return Ok(Step::Pending);
        };
        info!("Session state: {}", session.state);

        if session.state == SUCCEEDED {
            return Ok(Step::Ready(()));
        }
        if session.state == IN_PROGRESS {
            self.wait_in_progress().await?;
        }
        if session.is_new_player {
            return Err(LoginError::NewPlayer);
        }
        if session.state == ERROR {
            return Err(session_error(&session));
        }
        Ok(Step::Pending)
    }

    async fn wait_in_progress(&self) -> Result<()> {
        let deadline = Deadline::after(self.timings.in_progress_timeout);
        let outcome = poll_until(self.timings.session_interval, deadline, || async move {
            Ok(match self.league.login_session().await? {
                Some(session) if session.state == IN_PROGRESS => Step::Pending,
                _ => Step::Ready(()),
            })
        })
        .await;
        outcome.into_result(|| LoginError::Timeout("waiting for the session to leave IN_PROGRESS"))
    }

    /// Fail with `WrongAccount` unless `expected` is the logged-in user
    #[instrument(skip(self))]
    pub async fn check_username(&self, expected: &str) -> Result<()> {
        info!("Checking username");
        let deadline = Deadline::after(self.timings.username_timeout);
        let outcome = poll_until(self.timings.username_interval, deadline, || async move {
            let username = match self.league.platform_username().await {
                Ok(username) => username.unwrap_or_default(),
                Err(e) if e.is_transient() => return Ok(Step::Pending),
                Err(e) => return Err(e),
            };
            if username.is_empty() {
                return Ok(Step::Pending);
            }
            if username.eq_ignore_ascii_case(expected) {
                Ok(Step::Ready(()))
            } else {
                Err(LoginError::WrongAccount {
                    expected: expected.to_string(),
                    actual: username,
                })
            }
        })
        .await;
        outcome.into_result(|| LoginError::Timeout("checking the logged-in username"))
    }
}

fn session_error(session: &LoginSession) -> LoginError {
    match session.error.as_ref().map(|e| e.message_id.as_str()) {
        Some(ACCOUNT_BANNED) => LoginError::Banned,
        Some(message_id) => LoginError::SessionFailed(message_id.to_string()),
        None => LoginError::SessionFailed("session error without message".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::{LeagueClient, LocalClient};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubRiot {
        running: AtomicBool,
        launches: AtomicU32,
    }

    impl StubRiot {
        fn new(running: bool) -> Self {
            Self {
                running: AtomicBool::new(running),
                launches: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl RiotClientApi for StubRiot {
        async fn product_context_phase(&self) -> Result<String> {
            Ok("WaitForSessionExit".into())
        }

        async fn launch_league(&self) -> Result<()> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn is_league_running(&self) -> Result<bool> {
            Ok(self.running.load(Ordering::SeqCst))
        }

        async fn accept_eula(&self) -> Result<()> {
            Ok(())
        }
    }

    fn league(server: &MockServer) -> LeagueClient {
        LeagueClient::connected(LocalClient::new(&server.uri(), "pw").unwrap())
    }

    async fn mount_session(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/lol-login/v1/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_session_in_progress_then_succeeded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lol-login/v1/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "IN_PROGRESS"})))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        mount_session(&server, json!({"state": "SUCCEEDED", "isNewPlayer": false})).await;

        let riot = StubRiot::new(false);
        let league = league(&server);
        let watcher = SessionWatcher::new(&riot, &league, LoginTimings::default());

        watcher.wait_for_session().await.unwrap();

        assert_eq!(riot.launches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_found_after_league_restarts_on_new_port() {
        let server = MockServer::start().await;
        mount_session(&server, json!({"state": "SUCCEEDED"})).await;

        let dir = tempfile::TempDir::new().unwrap();
        let lockfile = dir.path().join("lockfile");
        tokio::fs::write(&lockfile, "LeagueClient:1:1:old:http").await.unwrap();

        let rewrite = {
            let lockfile = lockfile.clone();
            let port = server.address().port();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                tokio::fs::write(&lockfile, format!("LeagueClient:2:{port}:new:http"))
                    .await
                    .unwrap();
            })
        };

        let riot = StubRiot::new(false);
        let league = LeagueClient::new(lockfile);
        let watcher = SessionWatcher::new(&riot, &league, LoginTimings::default());

        watcher.wait_for_session().await.unwrap();
        rewrite.await.unwrap();

        assert_eq!(riot.launches.load(Ordering::SeqCst), 1);
        assert!(!server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_banned_session() {
        let server = MockServer::start().await;
        mount_session(
            &server,
            json!({"state": "ERROR", "error": {"messageId": "ACCOUNT_BANNED"}}),
        )
        .await;

        let riot = StubRiot::new(true);
        let league = league(&server);
        let watcher = SessionWatcher::new(&riot, &league, LoginTimings::default());

        assert!(matches!(watcher.wait_for_session().await, Err(LoginError::Banned)));
    }

    #[tokio::test]
    async fn test_other_session_error() {
        let server = MockServer::start().await;
        mount_session(
            &server,
            json!({"state": "ERROR", "error": {"messageId": "FAILED_TO_COMMUNICATE_WITH_LOGIN_QUEUE"}}),
        )
        .await;

        let riot = StubRiot::new(true);
        let league = league(&server);
        let watcher = SessionWatcher::new(&riot, &league, LoginTimings::default());

        let err = watcher.wait_for_session().await.unwrap_err();

        assert!(matches!(err, LoginError::SessionFailed(ref id) if id == "FAILED_TO_COMMUNICATE_WITH_LOGIN_QUEUE"));
    }

    #[tokio::test]
    async fn test_new_player() {
        let server = MockServer::start().await;
        mount_session(&server, json!({"state": "ERROR", "isNewPlayer": true})).await;

        let riot = StubRiot::new(true);
        let league = league(&server);
        let watcher = SessionWatcher::new(&riot, &league, LoginTimings::default());

        assert!(matches!(watcher.wait_for_session().await, Err(LoginError::NewPlayer)));
    }

    #[tokio::test]
    async fn test_username_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lol-login/v1/login-platform-credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "someone"})))
            .mount(&server)
            .await;

        let riot = StubRiot::new(true);
        let league = league(&server);
        let watcher = SessionWatcher::new(&riot, &league, LoginTimings::default());

        let err = watcher.check_username("Player").await.unwrap_err();
        assert!(matches!(err, LoginError::WrongAccount { .. }));
    }

    #[tokio::test]
    async fn test_username_matches_case_insensitively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lol-login/v1/login-platform-credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "player"})))
            .mount(&server)
            .await;

        let riot = StubRiot::new(true);
        let league = league(&server);
        let watcher = SessionWatcher::new(&riot, &league, LoginTimings::default());

        watcher.check_username("Player").await.unwrap();
    }
}
