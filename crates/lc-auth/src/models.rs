//! Wire shapes of the authority and platform endpoints
//!
//! Every derived token is read by exactly one function here, so a renamed
//! upstream field only touches that function.

use std::collections::HashMap;

use lc_core::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::captcha::CaptchaChallenge;
use crate::errors::{AccountRestricted, AuthFailure, Endpoint, Result};
use crate::session::ServiceToken;

/// Authorization request/response (`/api/v1/authorization`)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(default)]
    pub response: Option<AuthorizationRedirect>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationRedirect {
    pub parameters: RedirectParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectParameters {
    pub uri: String,
}

/// Login initiation request (`POST /api/v1/login`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStartRequest {
    pub client_id: String,
    pub language: String,
    pub platform: String,
    pub remember: bool,
    #[serde(rename = "riot_identity")]
    pub riot_identity: RiotIdentityStart,
    pub sdk_version: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiotIdentityStart {
    pub language: String,
    pub state: String,
}

impl LoginStartRequest {
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            language: String::new(),
            platform: "windows".to_string(),
            remember: false,
            riot_identity: RiotIdentityStart {
                language: "en_GB".to_string(),
                state: "auth".to_string(),
            },
            sdk_version: "24.8.0.4145".to_string(),
            kind: "auth".to_string(),
        }
    }
}

/// Credential submission (`PUT /api/v1/login`)
#[derive(Debug, Clone, Serialize)]
pub struct LoginCompleteRequest<'a> {
    pub riot_identity: RiotIdentityCredentials<'a>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiotIdentityCredentials<'a> {
    pub captcha: String,
    pub language: &'static str,
    pub password: &'a str,
    pub remember: bool,
    pub username: &'a str,
}

impl<'a> LoginCompleteRequest<'a> {
    pub fn new(username: &'a str, password: &'a str, captcha_proof: &str) -> Self {
        Self {
            riot_identity: RiotIdentityCredentials {
                captcha: format!("hcaptcha {captcha_proof}"),
                language: "en_GB",
                password,
                remember: false,
                username,
            },
            kind: "auth",
        }
    }
}

/// Response of both login calls
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub success: Option<LoginSuccess>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub captcha: Option<CaptchaEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginSuccess {
    pub login_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaEnvelope {
    #[serde(default)]
    pub hcaptcha: Option<HCaptcha>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HCaptcha {
    pub key: String,
    pub data: String,
}

impl LoginResponse {
    /// Captcha challenge carried by the response, if any
    pub fn challenge(&self) -> Option<CaptchaChallenge> {
        let hcaptcha = self.captcha.as_ref()?.hcaptcha.as_ref()?;
        Some(CaptchaChallenge {
            site_key: hcaptcha.key.clone(),
            payload: hcaptcha.data.clone(),
        })
    }
}

/// Classified credential-submission outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success { login_token: String },
    /// The proof was refused and a fresh challenge was issued
    RetryCaptcha(CaptchaChallenge),
    Failed(AuthFailure),
}

/// Map a credential-submission response to its outcome
pub fn classify_login(response: &LoginResponse) -> LoginOutcome {
    if let Some(success) = &response.success {
        if !success.login_token.is_empty() {
            return LoginOutcome::Success {
                login_token: success.login_token.clone(),
            };
        }
    }

    if response.kind.as_deref() == Some("multifactor") {
        return LoginOutcome::Failed(AuthFailure::MultifactorRequired);
    }

    match response.error.as_deref() {
        Some("auth_failure") => LoginOutcome::Failed(AuthFailure::WrongPassword),
        Some("rate_limited") => LoginOutcome::Failed(AuthFailure::RateLimited),
        Some(error) if error.contains("captcha_not_allowed") => match response.challenge() {
            Some(challenge) => LoginOutcome::RetryCaptcha(challenge),
            None => LoginOutcome::Failed(AuthFailure::InvalidSession(error.to_string())),
        },
        Some(error) => LoginOutcome::Failed(AuthFailure::InvalidSession(error.to_string())),
        None => LoginOutcome::Failed(AuthFailure::InvalidSession(format!(
            "unexpected login response type {:?}",
            response.kind
        ))),
    }
}

/// Login token acceptance (`/api/v1/login-token`)
#[derive(Debug, Clone, Serialize)]
pub struct LoginTokenRequest<'a> {
    pub authentication_type: &'static str,
    pub code_verifier: &'static str,
    pub login_token: &'a str,
    pub persist_login: bool,
}

impl<'a> LoginTokenRequest<'a> {
    pub fn new(login_token: &'a str) -> Self {
        Self {
            authentication_type: "RiotAuth",
            code_verifier: "",
            login_token,
            persist_login: false,
        }
    }
}

/// Token fields carried in the redirect fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTokens {
    pub access_token: String,
    pub id_token: String,
    pub scope: String,
    pub iss: String,
    pub token_type: String,
    pub session_state: String,
    pub expires_in: u64,
}

/// Read the token set from the redirect URI's fragment; the query is ignored
pub fn parse_redirect_fragment(uri: &str) -> Result<FragmentTokens> {
    let url = Url::parse(uri).map_err(|e| ParseError::new("redirect uri", e))?;
    let fragment = url
        .fragment()
        .ok_or_else(|| ParseError::missing("redirect uri", "fragment"))?;
    let pairs: HashMap<String, String> = url::form_urlencoded::parse(fragment.as_bytes())
        .into_owned()
        .collect();

    let field = |name: &str| {
        pairs
            .get(name)
            .cloned()
            .ok_or_else(|| ParseError::missing("redirect fragment", name))
    };

    let expires_in = field("expires_in")?;
    Ok(FragmentTokens {
        access_token: field("access_token")?,
        id_token: field("id_token")?,
        scope: field("scope")?,
        iss: field("iss")?,
        token_type: field("token_type")?,
        session_state: field("session_state")?,
        expires_in: expires_in
            .parse()
            .map_err(|e| ParseError::new("redirect fragment expires_in", e))?,
    })
}

/// Entitlements request (`/api/token/v1`)
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementsRequest {
    pub urn: &'static str,
}

impl Default for EntitlementsRequest {
    fn default() -> Self {
        Self {
            urn: "urn:entitlement:%",
        }
    }
}

#[derive(Deserialize)]
struct EntitlementsResponse {
    entitlements_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

pub fn entitlements_token(body: &str) -> Result<ServiceToken> {
    let response: EntitlementsResponse = decode(Endpoint::Entitlements, body)?;
    Ok(stamped(response.token_type, response.entitlements_token))
}

/// Login queue request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginQueueRequest<'a> {
    pub client_name: &'static str,
    pub entitlements: &'a str,
    pub userinfo: &'a str,
}

#[derive(Deserialize)]
struct LoginQueueResponse {
    token: String,
    #[serde(default)]
    token_type: Option<String>,
}

pub fn login_queue_token(body: &str) -> Result<ServiceToken> {
    let response: LoginQueueResponse = decode(Endpoint::LoginQueue, body)?;
    Ok(stamped(response.token_type, response.token))
}

#[derive(Deserialize)]
struct LoginQueueClaims {
    #[serde(default)]
    federated_identity_providers: Option<Vec<Value>>,
}

/// Accounts signed in through a third-party provider cannot open a ledge session
pub fn check_federated_identity(login_queue: &ServiceToken) -> Result<()> {
    let claims: LoginQueueClaims = lc_core::decode_claims_as(&login_queue.token)?;
    let providers = claims.federated_identity_providers.unwrap_or_default();
    if providers.is_empty() {
        return Ok(());
    }

    let names = providers
        .iter()
        .map(|provider| match provider.as_str() {
            Some(name) => name.to_string(),
            None => provider.to_string(),
        })
        .collect();
    Err(AccountRestricted::ThirdPartyLogin(names).into())
}

/// Ledge session request (`/session-external/v1/session/create`)
#[derive(Debug, Clone, Serialize)]
pub struct LedgeSessionRequest<'a> {
    pub claims: LedgeClaims,
    pub product: &'static str,
    pub puuid: &'a str,
    pub region: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgeClaims {
    pub cname: &'static str,
}

/// The session endpoint answers with a bare JSON string
pub fn ledge_token(body: &str) -> Result<ServiceToken> {
    let token: String = decode(Endpoint::LedgeSession, body)?;
    Ok(ServiceToken::bearer(token))
}

/// The summoner endpoint answers with a bare JSON string
pub fn summoner_token(body: &str) -> Result<ServiceToken> {
    let token: String = decode(Endpoint::Summoner, body)?;
    Ok(ServiceToken::bearer(token))
}

/// Signed ranked stats: the ranked-overview token plus per-queue stats
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStats {
    pub overview_token: ServiceToken,
    pub queues: Vec<QueueStats>,
}

impl RankedStats {
    /// Stats for one queue type, if the account has an entry for it
    pub fn queue(&self, queue_type: &str) -> Option<&QueueStats> {
        self.queues.iter().find(|q| q.queue_type == queue_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub queue_type: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

#[derive(Deserialize)]
struct RankedStatsResponse {
    jwt: String,
    #[serde(default)]
    queues: Vec<QueueStats>,
}

pub fn ranked_stats(body: &str) -> Result<RankedStats> {
    let response: RankedStatsResponse = decode(Endpoint::RankedOverview, body)?;
    Ok(RankedStats {
        overview_token: ServiceToken::bearer(response.jwt),
        queues: response.queues,
    })
}

/// Inventory types accepted by the inventory service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryType {
    Champion,
    ChampionSkin,
    SkinBorder,
    SkinAugment,
    QueueEntry,
    EventPass,
}

impl InventoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Champion => "CHAMPION",
            Self::ChampionSkin => "CHAMPION_SKIN",
            Self::SkinBorder => "SKIN_BORDER",
            Self::SkinAugment => "SKIN_AUGMENT",
            Self::QueueEntry => "QUEUE_ENTRY",
            Self::EventPass => "EVENT_PASS",
        }
    }
}

/// Signed inventory: the inventory token plus the items it covers
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub token: ServiceToken,
    pub items: HashMap<String, Value>,
}

impl Inventory {
    /// Numeric item ids of one inventory type
    pub fn item_ids(&self, kind: InventoryType) -> Vec<i64> {
        self.items
            .get(kind.as_str())
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct InventoryResponse {
    data: InventoryData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryData {
    items_jwt: String,
    #[serde(default)]
    items: HashMap<String, Value>,
}

pub fn inventory(endpoint: Endpoint, body: &str) -> Result<Inventory> {
    let response: InventoryResponse = decode(endpoint, body)?;
    Ok(Inventory {
        token: ServiceToken::bearer(response.data.items_jwt),
        items: response.data.items,
    })
}

fn stamped(token_type: Option<String>, token: String) -> ServiceToken {
    ServiceToken::new(token_type.unwrap_or_else(|| "Bearer".to_string()), token)
}

fn decode<T: serde::de::DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| ParseError::new(format!("{endpoint} response"), e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIRECT: &str = "http://localhost/redirect?ignored=1&access_token=wrong#access_token=at.x.y&scope=openid%20link&iss=https%3A%2F%2Fauth.riotgames.com&id_token=id.x.y&token_type=Bearer&session_state=ss&expires_in=3600";

    #[test]
    fn test_fragment_wins_over_query() {
        let tokens = parse_redirect_fragment(REDIRECT).unwrap();

        assert_eq!(tokens.access_token, "at.x.y");
        assert_eq!(tokens.scope, "openid link");
        assert_eq!(tokens.iss, "https://auth.riotgames.com");
        assert_eq!(tokens.id_token, "id.x.y");
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.session_state, "ss");
        assert_eq!(tokens.expires_in, 3600);
    }

    #[test]
    fn test_query_only_redirect_is_rejected() {
        let err = parse_redirect_fragment("http://localhost/redirect?access_token=a").unwrap_err();
        assert!(matches!(err, crate::errors::RsoError::Parse(_)));
    }

    #[test]
    fn test_classify_login_outcomes() {
        let parse = |body: &str| -> LoginResponse { serde_json::from_str(body).unwrap() };

        assert_eq!(
            classify_login(&parse(r#"{"type":"success","success":{"login_token":"lt"}}"#)),
            LoginOutcome::Success {
                login_token: "lt".to_string()
            }
        );
        assert_eq!(
            classify_login(&parse(r#"{"type":"multifactor","multifactor":{"method":"email"}}"#)),
            LoginOutcome::Failed(AuthFailure::MultifactorRequired)
        );
        assert_eq!(
            classify_login(&parse(r#"{"type":"auth","error":"auth_failure"}"#)),
            LoginOutcome::Failed(AuthFailure::WrongPassword)
        );
        assert_eq!(
            classify_login(&parse(r#"{"type":"auth","error":"rate_limited"}"#)),
            LoginOutcome::Failed(AuthFailure::RateLimited)
        );
        assert_eq!(
            classify_login(&parse(
                r#"{"type":"auth","error":"captcha_not_allowed","captcha":{"hcaptcha":{"key":"k","data":"d"}}}"#
            )),
            LoginOutcome::RetryCaptcha(CaptchaChallenge {
                site_key: "k".to_string(),
                payload: "d".to_string()
            })
        );
        assert!(matches!(
            classify_login(&parse(r#"{"type":"auth"}"#)),
            LoginOutcome::Failed(AuthFailure::InvalidSession(_))
        ));
    }

    #[test]
    fn test_stage_token_type_is_preserved() {
        let token = entitlements_token(r#"{"entitlements_token":"et","token_type":"Entitlements"}"#).unwrap();
        assert_eq!(token, ServiceToken::new("Entitlements", "et"));

        let token = login_queue_token(r#"{"token":"lq","type":"LOGIN"}"#).unwrap();
        assert_eq!(token, ServiceToken::bearer("lq"));
    }

    #[test]
    fn test_federated_identity_providers() {
        let plain = lc_core::encode_unsigned(&serde_json::json!({"sub": "p"}));
        assert!(check_federated_identity(&ServiceToken::bearer(plain)).is_ok());

        let empty = lc_core::encode_unsigned(&serde_json::json!({"federated_identity_providers": null}));
        assert!(check_federated_identity(&ServiceToken::bearer(empty)).is_ok());

        let linked = lc_core::encode_unsigned(&serde_json::json!({"federated_identity_providers": ["xbox"]}));
        assert!(matches!(
            check_federated_identity(&ServiceToken::bearer(linked)),
            Err(crate::errors::RsoError::Restricted(AccountRestricted::ThirdPartyLogin(providers)))
                if providers == vec!["xbox".to_string()]
        ));

        assert!(check_federated_identity(&ServiceToken::bearer("not-a-jwt")).is_err());
    }

    #[test]
    fn test_bare_string_tokens() {
        assert_eq!(ledge_token(r#""ledge.jwt""#).unwrap(), ServiceToken::bearer("ledge.jwt"));
        assert!(summoner_token(r#"{"token":"x"}"#).is_err());
    }

    #[test]
    fn test_ranked_queue_lookup_by_type() {
        let stats = ranked_stats(
            r#"{"jwt":"ro","queues":[
                {"queueType":"RANKED_FLEX_SR","tier":"GOLD","rank":"I","wins":3,"losses":1},
                {"queueType":"RANKED_SOLO_5x5","tier":"SILVER","rank":"II","wins":10,"losses":8}
            ]}"#,
        )
        .unwrap();

        assert_eq!(stats.overview_token.token, "ro");
        let solo = stats.queue("RANKED_SOLO_5x5").unwrap();
        assert_eq!(solo.tier.as_deref(), Some("SILVER"));
        assert_eq!(solo.wins, 10);
        assert!(stats.queue("RANKED_TFT").is_none());
    }

    #[test]
    fn test_inventory_item_ids() {
        let inv = inventory(
            Endpoint::Inventory,
            r#"{"data":{"itemsJwt":"inv","items":{"CHAMPION_SKIN":[1001,1002],"CHAMPION":[]}}}"#,
        )
        .unwrap();

        assert_eq!(inv.token.token, "inv");
        assert_eq!(inv.item_ids(InventoryType::ChampionSkin), vec![1001, 1002]);
        assert!(inv.item_ids(InventoryType::QueueEntry).is_empty());
    }
}
