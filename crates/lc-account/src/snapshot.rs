use lc_auth::{QueueStats, RankedStats, UserinfoClaims};
use serde::Serialize;

use crate::wire::PartyRestriction;

/// Which optional snapshot fields to fetch
///
/// A disabled field is reported as `null`, exactly like a failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchFlags {
    pub rank: bool,
    pub essence: bool,
    pub honor: bool,
    pub skins: bool,
    pub match_history: bool,
    pub party: bool,
}

impl FetchFlags {
    pub fn all() -> Self {
        Self {
            rank: true,
            essence: true,
            honor: true,
            skins: true,
            match_history: true,
            party: true,
        }
    }

    pub fn none() -> Self {
        Self {
            rank: false,
            essence: false,
            honor: false,
            skins: false,
            match_history: false,
            party: false,
        }
    }

    /// Loot feeds both essence counts and skin shards
    pub(crate) fn needs_loot(&self) -> bool {
        self.essence || self.skins
    }

    /// The ranked-overview token is part of party registration
    pub(crate) fn needs_ranked(&self) -> bool {
        self.rank || self.party
    }
}

impl Default for FetchFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Composite account view assembled by one aggregator run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub puuid: String,
    pub region: String,
    pub account_id: u64,
    pub profile: Profile,
    pub rank: Option<RankSummary>,
    pub essence: Option<Essence>,
    pub honor_level: Option<u32>,
    pub skins: Option<SkinSummary>,
    pub match_summary: Option<MatchSummary>,
    pub party: Option<PartyEligibility>,
}

/// Profile fields read from userinfo
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub country: Option<String>,
    /// Platform code from the region tag (`LAN` reported as `LA1`)
    pub region: Option<String>,
    pub summoner_id: Option<u64>,
    pub summoner_name: Option<String>,
    pub level: Option<u32>,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
}

impl From<&UserinfoClaims> for Profile {
    fn from(claims: &UserinfoClaims) -> Self {
        let lol = claims.lol_account.as_ref();
        let acct = claims.acct.as_ref();
        Self {
            country: claims.country.clone(),
            region: claims.platform_code(),
            summoner_id: lol.map(|l| l.summoner_id),
            summoner_name: lol.map(|l| l.summoner_name.clone()),
            level: lol.map(|l| l.summoner_level),
            game_name: acct.map(|a| a.game_name.clone()),
            tag_line: acct.map(|a| a.tag_line.clone()),
            email_verified: claims.email_verified,
            phone_verified: claims.phone_number_verified,
        }
    }
}

pub const SOLO_QUEUE: &str = "RANKED_SOLO_5x5";

/// Solo queue standing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankSummary {
    pub tier: String,
    pub division: Option<String>,
    pub wins: u32,
    pub losses: u32,
}

impl RankSummary {
    pub fn unranked() -> Self {
        Self {
            tier: "UNRANKED".to_string(),
            division: None,
            wins: 0,
            losses: 0,
        }
    }

    /// Summary of the solo queue; accounts without a placement are unranked
    pub fn from_stats(stats: &RankedStats) -> Self {
        match stats.queue(SOLO_QUEUE) {
            Some(QueueStats {
                tier: Some(tier),
                rank,
                wins,
                losses,
                ..
            }) if !tier.is_empty() && tier != "NONE" => Self {
                tier: tier.clone(),
                division: rank.clone().filter(|r| !r.is_empty() && r != "NA"),
                wins: *wins,
                losses: *losses,
            },
            Some(queue) => Self {
                wins: queue.wins,
                losses: queue.losses,
                ..Self::unranked()
            },
            None => Self::unranked(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Essence {
    pub blue: u64,
    pub orange: u64,
    pub mythic: u64,
}

/// Owned skins reconciled against loot shards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkinSummary {
    pub owned: Vec<i64>,
    pub rental_shards: Vec<i64>,
    pub permanent_shards: Vec<i64>,
    /// Shards (either kind) for skins the account does not own
    pub unowned_shards: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// `D` or `F`, whichever slot holds Flash in the latest game
    pub flash_key: Option<char>,
    pub quickplay_wins: u32,
    pub quickplay_losses: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartyEligibility {
    pub restrictions: Vec<PartyRestriction>,
    pub available_queue_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_auth::ServiceToken;

    fn stats(queues: Vec<QueueStats>) -> RankedStats {
        RankedStats {
            overview_token: ServiceToken::bearer("ro"),
            queues,
        }
    }

    fn queue(queue_type: &str, tier: Option<&str>, rank: Option<&str>) -> QueueStats {
        QueueStats {
            queue_type: queue_type.to_string(),
            tier: tier.map(str::to_string),
            rank: rank.map(str::to_string),
            wins: 12,
            losses: 9,
        }
    }

    #[test]
    fn test_rank_summary_reads_solo_queue_only() {
        let summary = RankSummary::from_stats(&stats(vec![
            queue("RANKED_FLEX_SR", Some("PLATINUM"), Some("I")),
            queue(SOLO_QUEUE, Some("GOLD"), Some("IV")),
        ]));

        assert_eq!(summary.tier, "GOLD");
        assert_eq!(summary.division.as_deref(), Some("IV"));
        assert_eq!(summary.wins, 12);
    }

    #[test]
    fn test_rank_summary_defaults_to_unranked() {
        assert_eq!(RankSummary::from_stats(&stats(vec![])), RankSummary::unranked());

        let summary = RankSummary::from_stats(&stats(vec![queue(SOLO_QUEUE, Some(""), Some("NA"))]));
        assert_eq!(summary.tier, "UNRANKED");
        assert_eq!(summary.division, None);
        assert_eq!(summary.losses, 9);
    }

    #[test]
    fn test_flags() {
        let mut flags = FetchFlags::none();
        assert!(!flags.needs_loot());

        flags.party = true;
        assert!(flags.needs_ranked());
        assert!(!flags.rank);
    }
}
