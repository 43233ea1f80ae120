//! Wire shapes of the league-edge services the aggregator reads
//!
//! Field lookups live here as small pure functions so the aggregator only
//! deals with typed values.

use serde::{Deserialize, Serialize};

use crate::snapshot::{Essence, MatchSummary};

pub const BLUE_ESSENCE: &str = "CURRENCY_champion";
pub const ORANGE_ESSENCE: &str = "CURRENCY_cosmetic";
pub const MYTHIC_ESSENCE: &str = "CURRENCY_mythic";

const FLASH_SPELL_ID: i64 = 4;
const QUICKPLAY_QUEUE_ID: i64 = 490;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootItem {
    pub loot_name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LootResponse {
    #[serde(default)]
    pub player_loot: Vec<LootItem>,
}

/// Count of one loot entry, zero when the account has none
pub fn loot_count(loot: &[LootItem], loot_name: &str) -> u64 {
    loot.iter()
        .find(|item| item.loot_name == loot_name)
        .map(|item| item.count)
        .unwrap_or(0)
}

pub fn essence(loot: &[LootItem]) -> Essence {
    Essence {
        blue: loot_count(loot, BLUE_ESSENCE),
        orange: loot_count(loot, ORANGE_ESSENCE),
        mythic: loot_count(loot, MYTHIC_ESSENCE),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HonorProfile {
    pub honor_level: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchHistory {
    #[serde(default)]
    pub games: Vec<MatchGame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchGame {
    pub json: MatchDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    #[serde(default)]
    pub queue_id: i64,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub puuid: String,
    #[serde(default)]
    pub summoner_id: Option<u64>,
    #[serde(default)]
    pub spell1_id: Option<i64>,
    #[serde(default)]
    pub spell2_id: Option<i64>,
    #[serde(default)]
    pub win: bool,
}

impl MatchHistory {
    /// Slot holding Flash for the player in the most recent game
    pub fn flash_key(&self, summoner_id: u64) -> Option<char> {
        let latest = self.games.first()?;
        let player = latest
            .json
            .participants
            .iter()
            .find(|p| p.summoner_id == Some(summoner_id))?;

        if player.spell1_id == Some(FLASH_SPELL_ID) {
            Some('D')
        } else if player.spell2_id == Some(FLASH_SPELL_ID) {
            Some('F')
        } else {
            None
        }
    }

    /// Wins and losses in quickplay games
    pub fn quickplay_record(&self, puuid: &str) -> (u32, u32) {
        self.games
            .iter()
            .filter(|game| game.json.queue_id == QUICKPLAY_QUEUE_ID)
            .flat_map(|game| game.json.participants.iter())
            .filter(|p| p.puuid == puuid)
            .fold((0, 0), |(wins, losses), p| {
                if p.win { (wins + 1, losses) } else { (wins, losses + 1) }
            })
    }

    pub fn summary(&self, puuid: &str, summoner_id: Option<u64>) -> MatchSummary {
        let (quickplay_wins, quickplay_losses) = self.quickplay_record(puuid);
        MatchSummary {
            flash_key: summoner_id.and_then(|id| self.flash_key(id)),
            quickplay_wins,
            quickplay_losses,
        }
    }
}

/// Party registration (`PUT /parties-ledge/v1/players/{puuid}`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRegistration<'a> {
    pub account_id: u64,
    pub created_at: u64,
    pub current_party: Option<()>,
    pub eligibility_hash: u64,
    pub parties: Option<()>,
    pub platform_id: &'a str,
    pub puuid: &'a str,
    pub registration: RegistrationTokens<'a>,
    pub server_utc_millis: u64,
    pub summoner_id: u64,
    pub tft_games_played: u32,
    pub tft_games_won: u32,
    pub version: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationTokens<'a> {
    pub experiments: serde_json::Map<String, serde_json::Value>,
    pub game_client_version: &'a str,
    pub inventory_token: Option<&'a str>,
    pub inventory_tokens: Vec<&'a str>,
    pub player_tokens: PlayerTokens<'a>,
    pub ranked_overview_token: &'a str,
    pub simple_inventory_token: &'a str,
    pub summoner_token: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTokens<'a> {
    pub entitlements_token: &'a str,
    pub id_token: &'a str,
    pub summoner_token: &'a str,
    pub user_info_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PartyPlayer {
    pub current_party: Option<CurrentParty>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CurrentParty {
    pub party_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRestriction {
    pub reason: String,
    #[serde(default)]
    pub queue_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PartyRestrictions {
    #[serde(default)]
    pub party_restrictions: Vec<PartyRestriction>,
    #[serde(default)]
    pub available_queue_ids: Vec<i64>,
}
