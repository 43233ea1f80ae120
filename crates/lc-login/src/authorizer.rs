use std::sync::Arc;

use lc_auth::models::LoginResponse;
use lc_auth::{
    AuthFailure, CaptchaChallenge, CaptchaGateway, CaptchaRequest, CaptchaService, Credentials,
    LoginOutcome, ProxyConfig, classify_login,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::api::{Authorization, CredentialAuthorizer};
use crate::config::AuthorizerOptions;
use crate::errors::{LoginError, Result};
use crate::local::LocalClient;

const CONSENT_REQUIRED: &str = "authorization_error: consent_required: ";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest {
    language: &'static str,
    product_id: &'static str,
    state: &'static str,
}

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    username: &'a str,
    password: &'a str,
    remember: bool,
    captcha: String,
    language: &'static str,
}

#[derive(Debug, Serialize)]
struct LoginTokenBody<'a> {
    authentication_type: &'static str,
    login_token: &'a str,
    persist_login: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationsRequest {
    client_id: &'static str,
    trust_levels: [&'static str; 1],
}

#[derive(Debug, Default, Deserialize)]
struct AuthorizationsResponse {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Logs the Riot Client in through its local authenticator API
pub struct RcuAuthorizer {
    local: LocalClient,
    credentials: Credentials,
    captcha: Arc<dyn CaptchaGateway>,
    service: CaptchaService,
    proxy: Option<ProxyConfig>,
    options: AuthorizerOptions,
}

impl RcuAuthorizer {
    pub fn new(
        local: LocalClient,
        credentials: Credentials,
        captcha: Arc<dyn CaptchaGateway>,
        service: CaptchaService,
    ) -> Self {
        Self {
            local,
            credentials,
            captcha,
            service,
            proxy: None,
            options: AuthorizerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AuthorizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    async fn is_authorized(&self) -> Result<bool> {
        let response = self.local.get("/rso-auth/v1/authorization").await?;
        Ok(response.status().is_success())
    }

    /// Unreadable answers count as "not restricted"
    async fn is_age_restricted(&self) -> bool {
        self.local
            .json::<Value, Value>(
                Method::GET,
                "/age-restriction/v1/age-restriction/products/league_of_legends",
                None,
            )
            .await
            .ok()
            .and_then(|body| body.get("restricted").and_then(Value::as_bool))
            .unwrap_or(false)
    }

    async fn is_country_missing(&self) -> bool {
        self.local
            .json::<Value, Value>(Method::GET, "/riot-client-auth/v1/userinfo", None)
            .await
            .ok()
            .and_then(|body| body.get("country").and_then(Value::as_str).map(|c| c == "nan"))
            .unwrap_or(false)
    }

    async fn start_authentication(&self) -> Result<CaptchaChallenge> {
        let path = "/rso-authenticator/v1/authentication";
        let response = self.local.request::<Value>(Method::DELETE, path, None).await?;
        debug!("Cleared previous authentication ({})", response.status());

        let start = StartRequest {
            language: "en_GB",
            product_id: "riot-client",
            state: "auth",
        };
        let response: LoginResponse = self
            .local
            .json(
                Method::POST,
                "/rso-authenticator/v1/authentication/riot-identity/start",
                Some(&start),
            )
            .await?;
        response.challenge().ok_or(LoginError::MissingChallenge)
    }

    async fn solve(&self, challenge: &CaptchaChallenge) -> Result<String> {
        info!("Solving captcha with {}", self.service.service_id);
        let request = CaptchaRequest {
            service_id: &self.service.service_id,
            service_key: &self.service.service_key,
            site_key: &challenge.site_key,
            site_url: &self.options.site_url,
            user_agent: &self.options.user_agent,
            challenge_payload: &challenge.payload,
            proxy: self.proxy.as_ref(),
        };
        Ok(self.captcha.solve(&request).await?)
    }

    async fn complete_authentication(&self, proof: &str) -> Result<LoginResponse> {
        let body = CompleteRequest {
            username: &self.credentials.username,
            password: self.credentials.password.as_str(),
            remember: self.options.persist_login,
            captcha: format!("hcaptcha {proof}"),
            language: "en_GB",
        };
        self.local
            .json(
                Method::POST,
                "/rso-authenticator/v1/authentication/riot-identity/complete",
                Some(&body),
            )
            .await
    }

    async fn login_token(&self) -> Result<String> {
        let challenge = self.start_authentication().await?;
        let proof = self.solve(&challenge).await?;
        let mut outcome = classify_login(&self.complete_authentication(&proof).await?);

        if let LoginOutcome::RetryCaptcha(challenge) = outcome {
            info!("Captcha not allowed, solving again");
            let proof = self.solve(&challenge).await?;
            outcome = classify_login(&self.complete_authentication(&proof).await?);
        }

        match outcome {
            LoginOutcome::Success { login_token } => Ok(login_token),
            LoginOutcome::RetryCaptcha(_) => Err(LoginError::LoginToken("captcha_not_allowed".into())),
            LoginOutcome::Failed(AuthFailure::InvalidSession(error)) => Err(LoginError::LoginToken(error)),
            LoginOutcome::Failed(failure) => Err(failure.into()),
        }
    }

    async fn accept_login_token(&self, login_token: &str) -> Result<()> {
        let body = LoginTokenBody {
            authentication_type: "RiotAuth",
            login_token,
            persist_login: self.options.persist_login,
        };
        let response: Value = self
            .local
            .json(Method::PUT, "/rso-auth/v1/session/login-token", Some(&body))
            .await?;
        match response.get("type").and_then(Value::as_str) {
            Some("authenticated") => Ok(()),
            other => {
                warn!("Login token was not accepted: {:?}", other);
                Err(AuthFailure::InvalidSession("login token was not accepted".into()).into())
            }
        }
    }

    async fn request_authorizations(&self) -> Result<Authorization> {
        let path = "/rso-auth/v2/authorizations";
        let body = AuthorizationsRequest {
            client_id: "riot-client",
            trust_levels: ["always_trusted"],
        };
        let response = self.local.request(Method::POST, path, Some(&body)).await?;
        // Error statuses still carry a classifiable body
        let text = response.text().await?;
        let response: AuthorizationsResponse = serde_json::from_str(&text).unwrap_or_default();
        classify_authorizations(&response)
    }
}

fn classify_authorizations(response: &AuthorizationsResponse) -> Result<Authorization> {
    match response.kind.as_deref() {
        Some("authorized") => return Ok(Authorization::Authorized),
        Some("needs_authentication") => return Ok(Authorization::Pending),
        _ => {}
    }
    if response.message.as_deref() == Some(CONSENT_REQUIRED) {
        return Err(LoginError::ConsentRequired);
    }
    match response.error.as_deref() {
        Some("auth_failure") => Err(AuthFailure::WrongPassword.into()),
        Some("rate_limited") => Err(AuthFailure::RateLimited.into()),
        _ => Ok(Authorization::Pending),
    }
}

#[async_trait::async_trait]
impl CredentialAuthorizer for RcuAuthorizer {
    #[instrument(skip(self))]
    async fn authorize(&self) -> Result<Authorization> {
        if self.is_authorized().await? {
            if self.is_age_restricted().await {
                return Err(LoginError::AgeRestricted);
            }
            if self.is_country_missing().await {
                return Err(LoginError::CountryRegionMissing);
            }
            debug!("Riot client is already authorized");
            return Ok(Authorization::Authorized);
        }

        let login_token = self.login_token().await?;
        self.accept_login_token(&login_token).await?;
        self.request_authorizations().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_auth::StaticCaptchaSolver;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authorizer(server: &MockServer) -> RcuAuthorizer {
        RcuAuthorizer::new(
            LocalClient::new(&server.uri(), "pw").unwrap(),
            Credentials::new("player", "hunter2"),
            Arc::new(StaticCaptchaSolver::new("ok-token")),
            CaptchaService::default(),
        )
    }

    async fn mount_login(server: &MockServer, authorizations: Value) {
        Mock::given(method("GET"))
            .and(path("/rso-auth/v1/authorization"))
            .respond_with(ResponseTemplate::new(404))
            .mount(server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rso-authenticator/v1/authentication"))
            .respond_with(ResponseTemplate::new(204))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rso-authenticator/v1/authentication/riot-identity/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "captcha": {"hcaptcha": {"key": "site", "data": "rq"}}
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rso-authenticator/v1/authentication/riot-identity/complete"))
            .and(body_partial_json(json!({
                "username": "player",
                "captcha": "hcaptcha ok-token",
                "language": "en_GB"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "success",
                "success": {"login_token": "lt"}
            })))
            .mount(server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/rso-auth/v1/session/login-token"))
            .and(body_partial_json(json!({"login_token": "lt", "authentication_type": "RiotAuth"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"type": "authenticated"})))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rso-auth/v2/authorizations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(authorizations))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_full_local_login_is_authorized() {
        let server = MockServer::start().await;
        mount_login(&server, json!({"type": "authorized"})).await;

        let outcome = authorizer(&server).authorize().await.unwrap();

        assert_eq!(outcome, Authorization::Authorized);
    }

    #[tokio::test]
    async fn test_needs_authentication_is_pending() {
        let server = MockServer::start().await;
        mount_login(&server, json!({"type": "needs_authentication"})).await;

        let outcome = authorizer(&server).authorize().await.unwrap();

        assert_eq!(outcome, Authorization::Pending);
    }

    #[tokio::test]
    async fn test_consent_required() {
        let server = MockServer::start().await;
        mount_login(&server, json!({"message": CONSENT_REQUIRED})).await;

        let err = authorizer(&server).authorize().await.unwrap_err();

        assert!(matches!(err, LoginError::ConsentRequired));
    }

    #[tokio::test]
    async fn test_already_authorized_but_age_restricted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rso-auth/v1/authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/age-restriction/v1/age-restriction/products/league_of_legends"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"restricted": true})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rso-authenticator/v1/authentication/riot-identity/start"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = authorizer(&server).authorize().await.unwrap_err();

        assert!(matches!(err, LoginError::AgeRestricted));
    }

    #[test]
    fn test_authorization_errors_map_to_auth_failures() {
        let response = AuthorizationsResponse {
            error: Some("rate_limited".into()),
            ..Default::default()
        };
        assert!(matches!(
            classify_authorizations(&response),
            Err(LoginError::Auth(AuthFailure::RateLimited))
        ));

        let response = AuthorizationsResponse::default();
        assert_eq!(classify_authorizations(&response).unwrap(), Authorization::Pending);
    }
}
