use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, instrument};
use url::Url;

use crate::config::RsoConfig;
use crate::errors::{Endpoint, Result, RsoError};
use crate::models::{
    self, EntitlementsRequest, Inventory, InventoryType, LedgeClaims, LedgeSessionRequest,
    LoginQueueRequest, RankedStats,
};
use crate::session::{RootToken, ServiceToken};
use crate::transport::{build_client, ensure_success};
use crate::userinfo::Userinfo;

/// Inventory service flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryApi {
    /// `/v1/inventories/simple`
    Simple,
    /// `/v2/inventoriesWithLoyalty`
    WithLoyalty,
}

impl InventoryApi {
    fn path(&self) -> &'static str {
        match self {
            Self::Simple => "lolinventoryservice-ledge/v1/inventories/simple",
            Self::WithLoyalty => "lolinventoryservice-ledge/v2/inventoriesWithLoyalty",
        }
    }

    fn endpoint(&self) -> Endpoint {
        match self {
            Self::Simple => Endpoint::Inventory,
            Self::WithLoyalty => Endpoint::InventoryV2,
        }
    }
}

/// Player an inventory is requested for
#[derive(Debug, Clone, Copy)]
pub struct InventoryOwner<'a> {
    pub puuid: &'a str,
    pub account_id: u64,
    pub region: &'a str,
}

/// Derives service tokens from the root token, one stage at a time
///
/// Stateless apart from the pooled HTTP client, so one chain can serve many
/// concurrent derivations. Every regional stage resolves its region before
/// touching the network.
#[derive(Debug, Clone)]
pub struct TokenChain {
    config: RsoConfig,
    http: Client,
}

impl TokenChain {
    pub fn new(config: RsoConfig) -> Result<Self> {
        let http = build_client(&config, None)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &RsoConfig {
        &self.config
    }

    /// Shared stateless client, for calls made with derived tokens
    pub fn http(&self) -> &Client {
        &self.http
    }

    #[instrument(skip_all)]
    pub async fn userinfo(&self, root: &RootToken) -> Result<Userinfo> {
        debug!("Fetching userinfo");
        let url = self.config.endpoints.auth.join("userinfo")?;
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, root.authorization())
            .send()
            .await?;
        let response = ensure_success(Endpoint::Userinfo, response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        Userinfo::from_body(content_type.as_deref(), body)
    }

    #[instrument(skip_all)]
    pub async fn entitlements(&self, root: &RootToken) -> Result<ServiceToken> {
        debug!("Fetching entitlements token");
        let url = self.config.endpoints.entitlements.join("api/token/v1")?;
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, root.authorization())
            .json(&EntitlementsRequest::default())
            .send()
            .await?;
        let body = self.body(Endpoint::Entitlements, response).await?;
        models::entitlements_token(&body)
    }

    #[instrument(skip(self, root, userinfo, entitlements))]
    pub async fn login_queue(
        &self,
        root: &RootToken,
        userinfo: &Userinfo,
        entitlements: &ServiceToken,
        region: &str,
    ) -> Result<ServiceToken> {
        let record = self.config.regions.resolve(region)?;
        let url = regional(
            &record.player_platform_edge_url,
            &format!("login-queue/v2/login/products/lol/regions/{}", record.code),
        )?;

        debug!("Fetching login queue token");
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, root.authorization())
            .json(&LoginQueueRequest {
                client_name: "lcu",
                entitlements: &entitlements.token,
                userinfo: &userinfo.raw,
            })
            .send()
            .await?;
        let body = self.body(Endpoint::LoginQueue, response).await?;
        let token = models::login_queue_token(&body)?;
        models::check_federated_identity(&token)?;
        Ok(token)
    }

    /// Ledge session token; fails before any request without a login-queue token
    #[instrument(skip(self, login_queue))]
    pub async fn ledge(
        &self,
        login_queue: Option<&ServiceToken>,
        puuid: &str,
        region: &str,
    ) -> Result<ServiceToken> {
        let login_queue = login_queue.ok_or(RsoError::MissingToken(Endpoint::LoginQueue))?;
        let record = self.config.regions.resolve(region)?;
        let url = regional(
            &record.player_platform_edge_url,
            "session-external/v1/session/create",
        )?;

        debug!("Creating ledge session");
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, login_queue.authorization())
            .json(&LedgeSessionRequest {
                claims: LedgeClaims { cname: "lcu" },
                product: "lol",
                puuid,
                region: record.code_lower(),
            })
            .send()
            .await?;
        let body = self.body(Endpoint::LedgeSession, response).await?;
        models::ledge_token(&body)
    }

    #[instrument(skip(self, ledge))]
    pub async fn summoner(&self, ledge: &ServiceToken, puuid: &str, region: &str) -> Result<ServiceToken> {
        let record = self.config.regions.resolve(region)?;
        let url = regional(
            &record.league_edge_url,
            &format!(
                "summoner-ledge/v1/regions/{}/summoners/puuid/{puuid}/jwt",
                record.code_lower()
            ),
        )?;

        debug!("Fetching summoner token");
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, ledge.authorization())
            .send()
            .await?;
        let body = self.body(Endpoint::Summoner, response).await?;
        models::summoner_token(&body)
    }

    /// Signed ranked stats; the embedded jwt is the ranked-overview token
    #[instrument(skip(self, ledge))]
    pub async fn ranked_stats(&self, ledge: &ServiceToken, region: &str) -> Result<RankedStats> {
        let record = self.config.regions.resolve(region)?;
        let url = regional(&record.league_edge_url, "leagues-ledge/v2/signedRankedStats")?;

        debug!("Fetching ranked stats");
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, ledge.authorization())
            .send()
            .await?;
        let body = self.body(Endpoint::RankedOverview, response).await?;
        models::ranked_stats(&body)
    }

    #[instrument(skip(self, ledge, owner), fields(region = owner.region))]
    pub async fn inventory(
        &self,
        ledge: &ServiceToken,
        owner: InventoryOwner<'_>,
        kinds: &[InventoryType],
        api: InventoryApi,
    ) -> Result<Inventory> {
        let record = self.config.regions.resolve(owner.region)?;
        let mut url = regional(&record.league_edge_url, api.path())?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("puuid", owner.puuid)
                .append_pair("accountId", &owner.account_id.to_string())
                .append_pair("location", &record.discovery_location);
            for kind in kinds {
                query.append_pair("inventoryTypes", kind.as_str());
            }
            query.append_pair("signed", "true");
        }

        debug!("Fetching {} inventory for {} types", api.endpoint(), kinds.len());
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, ledge.authorization())
            .send()
            .await?;
        let body = self.body(api.endpoint(), response).await?;
        models::inventory(api.endpoint(), &body)
    }

    async fn body(&self, endpoint: Endpoint, response: reqwest::Response) -> Result<String> {
        let response = ensure_success(endpoint, response).await?;
        Ok(response.text().await?)
    }
}

/// Join a path onto a regional base URL
pub fn regional(base: &str, path: &str) -> Result<Url> {
    Ok(Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))?)
}
