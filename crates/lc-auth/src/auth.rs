use std::sync::Arc;

use chrono::Utc;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::captcha::{CaptchaChallenge, CaptchaGateway, CaptchaRequest, CaptchaService};
use crate::config::{AuthParams, CAPTCHA_SITE_URL, RsoConfig};
use crate::errors::{AuthFailure, Endpoint, Result, RsoError};
use crate::models::{
    AuthorizationResponse, LoginCompleteRequest, LoginOutcome, LoginResponse, LoginStartRequest,
    LoginTokenRequest, classify_login, parse_redirect_fragment,
};
use crate::session::{Credentials, RootToken};
use crate::transport::{build_client, ensure_success, read_json};

/// One authorization session against the sign-on authority
///
/// Owns its cookie jar; `ssid`/`clid` picked up during a handshake stay in
/// the jar so later [`AuthSession::reauthorize`] calls can mint tokens for
/// other clients without credentials.
#[derive(Debug, Clone)]
pub struct AuthSession {
    config: RsoConfig,
    http: Client,
    jar: Arc<Jar>,
}

impl AuthSession {
    /// Create a session with an empty cookie jar
    pub fn new(config: RsoConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = build_client(&config, Some(jar.clone()))?;
        Ok(Self { config, http, jar })
    }

    /// Create a session seeded with cookies from an earlier handshake
    pub fn with_cookies(config: RsoConfig, ssid: &str, clid: Option<&str>) -> Result<Self> {
        let session = Self::new(config)?;
        let url = session.authorization_url()?;
        session.jar.add_cookie_str(&format!("ssid={ssid}; Path=/"), &url);
        if let Some(clid) = clid {
            session.jar.add_cookie_str(&format!("clid={clid}; Path=/"), &url);
        }
        Ok(session)
    }

    pub fn config(&self) -> &RsoConfig {
        &self.config
    }

    /// Run the full credential handshake and return the root token
    #[instrument(skip(self, credentials, captcha, service), fields(client_id = %params.client_id))]
    pub async fn authorize(
        &self,
        credentials: &Credentials,
        params: &AuthParams,
        captcha: &dyn CaptchaGateway,
        service: &CaptchaService,
    ) -> Result<RootToken> {
        self.request_authorization(params).await?;
        let challenge = self.start_login(params).await?;
        let login_token = self
            .submit_credentials(credentials, challenge, captcha, service)
            .await?;
        self.accept_login_token(&login_token).await?;

        let response = self.request_authorization(params).await?;
        let token = self.root_token_from(response)?;
        info!("Authorization completed");
        Ok(token)
    }

    /// Mint a root token for `params` from the session cookies alone
    #[instrument(skip(self), fields(client_id = %params.client_id))]
    pub async fn reauthorize(&self, params: &AuthParams) -> Result<RootToken> {
        let response = self.request_authorization(params).await?;
        self.root_token_from(response)
    }

    /// Whether the authority accepts the credentials
    ///
    /// Only a wrong password yields `false`; an account that stops at
    /// multifactor has a valid password. Other failures are returned.
    #[instrument(skip_all)]
    pub async fn check_password(
        &self,
        credentials: &Credentials,
        captcha: &dyn CaptchaGateway,
        service: &CaptchaService,
    ) -> Result<bool> {
        let params = AuthParams::riot_client();
        match self.authorize(credentials, &params, captcha, service).await {
            Ok(_) => Ok(true),
            Err(RsoError::Auth(AuthFailure::WrongPassword)) => Ok(false),
            Err(RsoError::Auth(AuthFailure::MultifactorRequired)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    fn authorization_url(&self) -> Result<Url> {
        Ok(self.config.endpoints.auth.join("api/v1/authorization")?)
    }

    async fn request_authorization(&self, params: &AuthParams) -> Result<AuthorizationResponse> {
        debug!("Requesting authorization");
        let response = self
            .http
            .post(self.authorization_url()?)
            .query(&params.query())
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let response = ensure_success(Endpoint::Authorization, response).await?;
        read_json(Endpoint::Authorization, response).await
    }

    async fn start_login(&self, params: &AuthParams) -> Result<CaptchaChallenge> {
        debug!("Starting login");
        let url = self.config.endpoints.authenticate.join("api/v1/login")?;
        let response = self
            .http
            .post(url)
            .json(&LoginStartRequest::new(&params.client_id))
            .send()
            .await?;
        let response = ensure_success(Endpoint::LoginStart, response).await?;
        let body: LoginResponse = read_json(Endpoint::LoginStart, response).await?;

        body.challenge().ok_or_else(|| {
            AuthFailure::InvalidSession("login start did not issue a captcha challenge".to_string())
                .into()
        })
    }

    async fn submit_credentials(
        &self,
        credentials: &Credentials,
        mut challenge: CaptchaChallenge,
        captcha: &dyn CaptchaGateway,
        service: &CaptchaService,
    ) -> Result<String> {
        let url = self.config.endpoints.authenticate.join("api/v1/login")?;
        let mut resolved = false;

        loop {
            let proof = self.solve(captcha, service, &challenge).await?;
            let request = LoginCompleteRequest::new(
                &credentials.username,
                credentials.password.as_str(),
                &proof,
            );

            debug!("Submitting credentials");
            let response = self.http.put(url.clone()).json(&request).send().await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                return Err(AuthFailure::RateLimited.into());
            }
            let response = ensure_success(Endpoint::LoginComplete, response).await?;
            let body: LoginResponse = read_json(Endpoint::LoginComplete, response).await?;

            match classify_login(&body) {
                LoginOutcome::Success { login_token } => return Ok(login_token),
                LoginOutcome::RetryCaptcha(next) if !resolved => {
                    warn!("Captcha proof was not accepted, solving a new challenge");
                    resolved = true;
                    challenge = next;
                }
                LoginOutcome::RetryCaptcha(_) => {
                    return Err(AuthFailure::InvalidSession(
                        "captcha_not_allowed after a second proof".to_string(),
                    )
                    .into());
                }
                LoginOutcome::Failed(failure) => return Err(failure.into()),
            }
        }
    }

    async fn solve(
        &self,
        captcha: &dyn CaptchaGateway,
        service: &CaptchaService,
        challenge: &CaptchaChallenge,
    ) -> Result<String> {
        let request = CaptchaRequest {
            service_id: &service.service_id,
            service_key: &service.service_key,
            site_key: &challenge.site_key,
            site_url: CAPTCHA_SITE_URL,
            user_agent: &self.config.user_agent,
            challenge_payload: &challenge.payload,
            proxy: self.config.proxy.as_ref(),
        };
        debug!("Solving captcha with {}", service.service_id);
        Ok(captcha.solve(&request).await?)
    }

    async fn accept_login_token(&self, login_token: &str) -> Result<()> {
        debug!("Accepting login token");
        let url = self.config.endpoints.auth.join("api/v1/login-token")?;
        let response = self
            .http
            .post(url)
            .json(&LoginTokenRequest::new(login_token))
            .send()
            .await?;
        ensure_success(Endpoint::LoginToken, response).await?;
        Ok(())
    }

    fn root_token_from(&self, response: AuthorizationResponse) -> Result<RootToken> {
        let redirect = response.response.ok_or_else(|| {
            AuthFailure::InvalidSession(format!(
                "authorization answered {:?} without a redirect",
                response.kind.as_deref().unwrap_or("nothing")
            ))
        })?;
        let tokens = parse_redirect_fragment(&redirect.parameters.uri)?;

        let (ssid, clid) = self.session_cookies()?;
        let ssid = ssid.ok_or_else(|| {
            AuthFailure::InvalidSession("authorization did not set an ssid cookie".to_string())
        })?;

        Ok(RootToken {
            ssid,
            clid,
            access_token: tokens.access_token,
            id_token: tokens.id_token,
            token_type: tokens.token_type,
            scope: tokens.scope,
            iss: tokens.iss,
            session_state: tokens.session_state,
            expires_in: tokens.expires_in,
            issued_at: Utc::now(),
        })
    }

    fn session_cookies(&self) -> Result<(Option<String>, Option<String>)> {
        let mut ssid = None;
        let mut clid = None;

        let Some(header) = self.jar.cookies(&self.authorization_url()?) else {
            return Ok((ssid, clid));
        };
        for pair in header.to_str().unwrap_or_default().split(';') {
            match pair.trim().split_once('=') {
                Some(("ssid", value)) => ssid = Some(value.to_string()),
                Some(("clid", value)) => clid = Some(value.to_string()),
                _ => {}
            }
        }
        Ok((ssid, clid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::{CaptchaError, StaticCaptchaSolver};
    use crate::config::Endpoints;
    use lc_core::RegionDirectory;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REDIRECT: &str = "http://localhost/redirect?access_token=from-query#access_token=at.payload.sig&scope=openid%20link%20ban&iss=https%3A%2F%2Fauth.riotgames.com&id_token=id.payload.sig&token_type=Bearer&session_state=state-1&expires_in=3600";

    fn session(server: &MockServer) -> AuthSession {
        let base = Url::parse(&server.uri()).unwrap();
        let config = RsoConfig::local(Endpoints::single(&base), RegionDirectory::builtin());
        AuthSession::new(config).unwrap()
    }

    fn redirect_body() -> serde_json::Value {
        json!({"type": "response", "response": {"parameters": {"uri": REDIRECT}}})
    }

    async fn mount_login_start(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "auth",
                "captcha": {"hcaptcha": {"key": "site-key", "data": "rqdata"}}
            })))
            .mount(server)
            .await;
    }

    async fn mount_authorization(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/authorization"))
            .and(query_param("client_id", "riot-client"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "ssid=ssid-value; Path=/")
                    .set_body_json(redirect_body()),
            )
            .mount(server)
            .await;
    }

    fn creds() -> Credentials {
        Credentials::new("player", "hunter2")
    }

    #[tokio::test]
    async fn test_authorize_maps_fragment_exactly() {
        let server = MockServer::start().await;
        mount_authorization(&server).await;
        mount_login_start(&server).await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/login"))
            .and(body_partial_json(json!({
                "type": "auth",
                "riot_identity": {"captcha": "hcaptcha ok-token", "username": "player", "password": "hunter2"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "success",
                "success": {"login_token": "login-token-1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/v1/login-token"))
            .and(body_partial_json(json!({"login_token": "login-token-1", "authentication_type": "RiotAuth"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let token = session(&server)
            .authorize(
                &creds(),
                &AuthParams::riot_client(),
                &StaticCaptchaSolver::new("ok-token"),
                &CaptchaService::default(),
            )
            .await
            .unwrap();

        assert_eq!(token.ssid, "ssid-value");
        assert_eq!(token.access_token, "at.payload.sig");
        assert_eq!(token.id_token, "id.payload.sig");
        assert_eq!(token.scope, "openid link ban");
        assert_eq!(token.iss, "https://auth.riotgames.com");
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.session_state, "state-1");
        assert_eq!(token.expires_in, 3600);
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_multifactor_never_accepts_login_token() {
        let server = MockServer::start().await;
        mount_authorization(&server).await;
        mount_login_start(&server).await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "multifactor",
                "multifactor": {"method": "email"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/v1/login-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let err = session(&server)
            .authorize(
                &creds(),
                &AuthParams::riot_client(),
                &StaticCaptchaSolver::new("ok-token"),
                &CaptchaService::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RsoError::Auth(AuthFailure::MultifactorRequired)));
    }

    #[tokio::test]
    async fn test_check_password_reports_wrong_password() {
        let server = MockServer::start().await;
        mount_authorization(&server).await;
        mount_login_start(&server).await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"type": "auth", "error": "auth_failure"})),
            )
            .mount(&server)
            .await;

        let ok = session(&server)
            .check_password(
                &creds(),
                &StaticCaptchaSolver::new("ok-token"),
                &CaptchaService::default(),
            )
            .await
            .unwrap();

        assert!(!ok);
    }

    #[tokio::test]
    async fn test_captcha_not_allowed_is_solved_once_more() {
        let server = MockServer::start().await;
        mount_login_start(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/v1/authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "auth"})))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "auth",
                "error": "captcha_not_allowed",
                "captcha": {"hcaptcha": {"key": "site-key", "data": "fresh"}}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let err = session(&server)
            .authorize(
                &creds(),
                &AuthParams::riot_client(),
                &StaticCaptchaSolver::new("ok-token"),
                &CaptchaService::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RsoError::Auth(AuthFailure::InvalidSession(_))));
    }

    #[tokio::test]
    async fn test_captcha_failure_aborts() {
        struct BrokeSolver;

        #[async_trait::async_trait]
        impl CaptchaGateway for BrokeSolver {
            async fn solve(&self, _request: &CaptchaRequest<'_>) -> std::result::Result<String, CaptchaError> {
                Err(CaptchaError::ZeroBalance)
            }
        }

        let server = MockServer::start().await;
        mount_authorization(&server).await;
        mount_login_start(&server).await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = session(&server)
            .authorize(
                &creds(),
                &AuthParams::riot_client(),
                &BrokeSolver,
                &CaptchaService::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RsoError::Captcha(CaptchaError::ZeroBalance)));
    }

    #[tokio::test]
    async fn test_reauthorize_uses_seeded_cookies() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/authorization"))
            .and(query_param("client_id", "lol"))
            .and(header_regex("cookie", "ssid=seeded"))
            .respond_with(ResponseTemplate::new(200).set_body_json(redirect_body()))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let config = RsoConfig::local(Endpoints::single(&base), RegionDirectory::builtin());
        let session = AuthSession::with_cookies(config, "seeded", Some("ec1")).unwrap();

        let token = session.reauthorize(&AuthParams::league_client()).await.unwrap();

        assert_eq!(token.ssid, "seeded");
        assert_eq!(token.clid.as_deref(), Some("ec1"));
        assert_eq!(token.access_token, "at.payload.sig");
    }

    #[tokio::test]
    async fn test_missing_response_key_is_invalid_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "auth"})))
            .mount(&server)
            .await;

        let err = session(&server)
            .reauthorize(&AuthParams::league_client())
            .await
            .unwrap_err();

        assert!(matches!(err, RsoError::Auth(AuthFailure::InvalidSession(_))));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_tagged() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/authorization"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = session(&server)
            .reauthorize(&AuthParams::league_client())
            .await
            .unwrap_err();

        match err {
            RsoError::UpstreamBadResponse { endpoint, status, body_snippet } => {
                assert_eq!(endpoint, Endpoint::Authorization);
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body_snippet, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
