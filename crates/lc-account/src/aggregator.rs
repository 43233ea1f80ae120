use std::future::Future;

use lc_auth::chain::regional;
use lc_auth::transport::{ensure_success, read_json};
use lc_auth::{
    AuthParams, AuthSession, CaptchaGateway, CaptchaService, Credentials, Endpoint, Inventory,
    InventoryApi, InventoryOwner, InventoryType, LootRoute, RankedStats, Result, RootToken,
    RsoConfig, RsoError, ServiceToken, TokenChain, Userinfo,
};
use lc_core::{Deadline, ParseError, RegionRecord};
use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::skins;
use crate::snapshot::{AccountSnapshot, FetchFlags, PartyEligibility, Profile, RankSummary};
use crate::wire::{
    self, HonorProfile, LootItem, LootResponse, MatchHistory, PartyPlayer, PartyRegistration,
    PartyRestrictions, PlayerTokens, RegistrationTokens,
};

/// Who a run is for, resolved once up front
struct Player<'a> {
    root: &'a RootToken,
    puuid: &'a str,
    account_id: u64,
    summoner_id: Option<u64>,
    record: &'a RegionRecord,
}

impl Player<'_> {
    fn inventory_owner(&self) -> InventoryOwner<'_> {
        InventoryOwner {
            puuid: self.puuid,
            account_id: self.account_id,
            region: &self.record.code,
        }
    }
}

/// First fan-out: every slot is filled independently
struct WaveOne {
    loot: Option<Vec<LootItem>>,
    ranked: Option<RankedStats>,
    honor_level: Option<u32>,
    skin_inventory: Option<Inventory>,
    party_inventory: Option<Inventory>,
    queue_inventory: Option<Inventory>,
}

/// Builds account snapshots from a root token
///
/// Mandatory stages (userinfo, entitlements, login queue, ledge) abort the
/// run; optional fields that fail are logged and reported as `None`.
#[derive(Debug, Clone)]
pub struct AccountAggregator {
    chain: TokenChain,
}

impl AccountAggregator {
    pub fn new(config: RsoConfig) -> Result<Self> {
        Ok(Self {
            chain: TokenChain::new(config)?,
        })
    }

    pub fn chain(&self) -> &TokenChain {
        &self.chain
    }

    /// Authorize with the league client scope, then build the snapshot
    #[instrument(skip_all)]
    pub async fn fetch_snapshot(
        &self,
        credentials: &Credentials,
        captcha: &dyn CaptchaGateway,
        service: &CaptchaService,
        flags: FetchFlags,
        deadline: Deadline,
    ) -> Result<AccountSnapshot> {
        let session = AuthSession::new(self.chain.config().clone())?;
        let params = AuthParams::league_client();
        let root = within(
            deadline,
            "authorizing",
            session.authorize(credentials, &params, captcha, service),
        )
        .await?;
        self.run(&root, flags, deadline).await
    }

    /// Build one snapshot from an already issued root token
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        root: &RootToken,
        flags: FetchFlags,
        deadline: Deadline,
    ) -> Result<AccountSnapshot> {
        if root.is_expired() {
            return Err(RsoError::TokenExpired);
        }
        let claims = root.access_claims()?;
        let record = self.chain.config().regions.resolve(&claims.region)?;

        let (userinfo, entitlements) = within(deadline, "deriving account tokens", async {
            tokio::try_join!(self.chain.userinfo(root), self.chain.entitlements(root))
        })
        .await?;
        userinfo.claims.check_restrictions()?;
        debug!("No account restrictions");

        let profile = Profile::from(&userinfo.claims);
        let player = Player {
            root,
            puuid: &claims.puuid,
            account_id: claims.account_id,
            summoner_id: profile.summoner_id,
            record,
        };

        let ledge_work = async {
            let login_queue = self
                .chain
                .login_queue(root, &userinfo, &entitlements, &record.code)
                .await?;
            let ledge = self
                .chain
                .ledge(Some(&login_queue), player.puuid, &record.code)
                .await?;
            let summoner = optional(
                flags.party,
                "summoner token",
                self.chain.summoner(&ledge, player.puuid, &record.code),
            )
            .await;

            let wave = self.wave_one(&ledge, &player, flags).await;
            let party = if flags.party {
                self.wave_two(&ledge, &player, &userinfo, &entitlements, summoner.as_ref(), &wave)
                    .await?
            } else {
                None
            };
            Ok::<_, RsoError>((wave, party))
        };
        let match_branch = optional(
            flags.match_history,
            "match history",
            self.match_history(&player),
        );

        let ((wave, party), matches) = within(deadline, "building the account snapshot", async {
            let (ledge_result, matches) = tokio::join!(ledge_work, match_branch);
            Ok::<_, RsoError>((ledge_result?, matches))
        })
        .await?;

        let skins = match (&wave.skin_inventory, &wave.loot) {
            (Some(inventory), Some(loot)) if flags.skins => Some(skins::reconcile(
                &inventory.item_ids(InventoryType::ChampionSkin),
                loot,
            )),
            _ => None,
        };

        info!("Account snapshot assembled");
        Ok(AccountSnapshot {
            puuid: claims.puuid.clone(),
            region: record.code.clone(),
            account_id: claims.account_id,
            rank: wave
                .ranked
                .as_ref()
                .filter(|_| flags.rank)
                .map(RankSummary::from_stats),
            essence: wave
                .loot
                .as_deref()
                .filter(|_| flags.essence)
                .map(wire::essence),
            honor_level: wave.honor_level,
            skins,
            match_summary: matches.map(|m| m.summary(&claims.puuid, profile.summoner_id)),
            party,
            profile,
        })
    }

    async fn wave_one(&self, ledge: &ServiceToken, player: &Player<'_>, flags: FetchFlags) -> WaveOne {
        let owner = player.inventory_owner();
        let (loot, ranked, honor_level, skin_inventory, party_inventory, queue_inventory) = tokio::join!(
            optional(flags.needs_loot(), "loot", self.loot(ledge, player)),
            optional(
                flags.needs_ranked(),
                "ranked stats",
                self.chain.ranked_stats(ledge, &player.record.code)
            ),
            optional(flags.honor, "honor", self.honor_level(ledge, player)),
            optional(
                flags.skins,
                "skin inventory",
                self.chain.inventory(
                    ledge,
                    owner,
                    &[InventoryType::ChampionSkin],
                    InventoryApi::Simple
                )
            ),
            optional(
                flags.party,
                "party inventory",
                self.chain.inventory(
                    ledge,
                    owner,
                    &[
                        InventoryType::Champion,
                        InventoryType::ChampionSkin,
                        InventoryType::SkinBorder,
                        InventoryType::SkinAugment,
                    ],
                    InventoryApi::Simple
                )
            ),
            optional(
                flags.party,
                "queue inventory",
                self.chain.inventory(
                    ledge,
                    owner,
                    &[InventoryType::QueueEntry],
                    InventoryApi::WithLoyalty
                )
            ),
        );

        WaveOne {
            loot,
            ranked,
            honor_level,
            skin_inventory,
            party_inventory,
            queue_inventory,
        }
    }

    /// Party registration and restrictions; `None` when a Wave-1 token is missing
    async fn wave_two(
        &self,
        ledge: &ServiceToken,
        player: &Player<'_>,
        userinfo: &Userinfo,
        entitlements: &ServiceToken,
        summoner: Option<&ServiceToken>,
        wave: &WaveOne,
    ) -> Result<Option<PartyEligibility>> {
        let (Some(summoner), Some(ranked), Some(party_inventory), Some(queue_inventory)) = (
            summoner,
            wave.ranked.as_ref(),
            wave.party_inventory.as_ref(),
            wave.queue_inventory.as_ref(),
        ) else {
            warn!("Skipping party eligibility, a required token is missing");
            return Ok(None);
        };

        let config = self.chain.config();
        let record = player.record;
        let registration = PartyRegistration {
            account_id: player.account_id,
            created_at: 0,
            current_party: None,
            eligibility_hash: 0,
            parties: None,
            platform_id: &record.code,
            puuid: player.puuid,
            registration: RegistrationTokens {
                experiments: serde_json::Map::new(),
                game_client_version: &config.game_client_version,
                inventory_token: None,
                inventory_tokens: vec![queue_inventory.token.token.as_str()],
                player_tokens: PlayerTokens {
                    entitlements_token: &entitlements.token,
                    id_token: &player.root.id_token,
                    summoner_token: &summoner.token,
                    user_info_token: &userinfo.raw,
                },
                ranked_overview_token: &ranked.overview_token.token,
                simple_inventory_token: &party_inventory.token.token,
                summoner_token: None,
            },
            server_utc_millis: 0,
            summoner_id: player.account_id,
            tft_games_played: 0,
            tft_games_won: 0,
            version: 0,
        };

        debug!("Registering party player");
        let url = regional(
            &record.league_edge_url,
            &format!("parties-ledge/v1/players/{}", player.puuid),
        )?;
        let response = self
            .chain
            .http()
            .put(url)
            .header(AUTHORIZATION, ledge.authorization())
            .json(&registration)
            .send()
            .await?;
        let response = ensure_success(Endpoint::PartyRegistration, response).await?;
        let party: PartyPlayer = read_json(Endpoint::PartyRegistration, response).await?;
        let party_id = party
            .current_party
            .ok_or_else(|| ParseError::missing("party registration", "currentParty"))?
            .party_id;

        let url = regional(
            &record.league_edge_url,
            &format!("parties-ledge/v1/parties/{party_id}/restrictions"),
        )?;
        let restrictions: PartyRestrictions = self
            .get_json(Endpoint::PartyRestrictions, url, ledge.authorization())
            .await?;

        Ok(Some(PartyEligibility {
            restrictions: restrictions.party_restrictions,
            available_queue_ids: restrictions.available_queue_ids,
        }))
    }

    async fn loot(&self, ledge: &ServiceToken, player: &Player<'_>) -> Result<Vec<LootItem>> {
        let record = player.record;
        let path = match self.chain.config().loot_route {
            LootRoute::Puuid => format!("loot/v2/player/{}/loot/definitions", player.puuid),
            LootRoute::AccountId => format!(
                "loot/v1/playerlootdefinitions/location/{}/playerId/{}",
                record.discovery_location, player.account_id
            ),
            LootRoute::SummonerId => {
                let summoner_id = player
                    .summoner_id
                    .ok_or_else(|| ParseError::missing("userinfo", "lol_account.summoner_id"))?;
                format!(
                    "loot/v1/playerlootdefinitions/location/{}/playerId/{summoner_id}",
                    record.discovery_location
                )
            }
        };

        let url = regional(&record.league_edge_url, &path)?;
        let loot: LootResponse = self.get_json(Endpoint::Loot, url, ledge.authorization()).await?;
        Ok(loot.player_loot)
    }

    async fn honor_level(&self, ledge: &ServiceToken, player: &Player<'_>) -> Result<u32> {
        let url = regional(
            &player.record.league_edge_url,
            "honor-edge/v2/retrieveProfileInfo/",
        )?;
        let honor: HonorProfile = self.get_json(Endpoint::Honor, url, ledge.authorization()).await?;
        Ok(honor.honor_level)
    }

    /// Recent games, read with the root access token
    async fn match_history(&self, player: &Player<'_>) -> Result<MatchHistory> {
        let mut url = regional(
            &player.record.player_platform_edge_url,
            &format!(
                "match-history-query/v1/products/lol/player/{}/SUMMARY",
                player.puuid
            ),
        )?;
        url.query_pairs_mut()
            .append_pair("startIndex", "0")
            .append_pair("count", &self.chain.config().match_history_count.to_string());

        self.get_json(Endpoint::MatchHistory, url, player.root.authorization())
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: Url,
        authorization: String,
    ) -> Result<T> {
        let response = self
            .chain
            .http()
            .get(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;
        let response = ensure_success(endpoint, response).await?;
        read_json(endpoint, response).await
    }
}

/// Fetch an optional field: disabled or failed both yield `None`
async fn optional<T>(
    enabled: bool,
    field: &'static str,
    fetch: impl Future<Output = Result<T>>,
) -> Option<T> {
    if !enabled {
        return None;
    }
    match fetch.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Could not fetch {}: {}", field, e);
            None
        }
    }
}

async fn within<T>(
    deadline: Deadline,
    what: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout_at(deadline.instant(), fut)
        .await
        .map_err(|_| RsoError::DeadlineExceeded(what))?
}
