use std::collections::BTreeSet;

use tracing::debug;

use crate::snapshot::SkinSummary;
use crate::wire::LootItem;

const SKIN_SHARD: &str = "CHAMPION_SKIN_";
const RENTAL_SHARD: &str = "CHAMPION_SKIN_RENTAL_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardKind {
    Rental,
    Permanent,
}

/// Classify a loot name as a skin shard and extract the skin id
///
/// `CHAMPION_SKIN_RENTAL_<id>` is a rental shard, `CHAMPION_SKIN_<id>` a
/// permanent one; a `<prefix>_` in front of the id is dropped.
pub fn parse_shard(loot_name: &str) -> Option<(ShardKind, i64)> {
    let (kind, rest) = if let Some(rest) = loot_name.strip_prefix(RENTAL_SHARD) {
        (ShardKind::Rental, rest)
    } else if let Some(rest) = loot_name.strip_prefix(SKIN_SHARD) {
        (ShardKind::Permanent, rest)
    } else {
        return None;
    };

    let id = rest.rsplit('_').next()?;
    match id.parse() {
        Ok(id) => Some((kind, id)),
        Err(_) => {
            debug!("Ignoring skin loot with unexpected name {}", loot_name);
            None
        }
    }
}

/// Reconcile owned skin ids against the skin shards in loot
pub fn reconcile(owned: &[i64], loot: &[LootItem]) -> SkinSummary {
    let owned_set: BTreeSet<i64> = owned.iter().copied().collect();
    let mut rental = BTreeSet::new();
    let mut permanent = BTreeSet::new();

    for item in loot {
        match parse_shard(&item.loot_name) {
            Some((ShardKind::Rental, id)) => {
                rental.insert(id);
            }
            Some((ShardKind::Permanent, id)) => {
                permanent.insert(id);
            }
            None => {}
        }
    }

    let unowned = rental
        .union(&permanent)
        .filter(|id| !owned_set.contains(id))
        .copied()
        .collect();

    SkinSummary {
        owned: owned.to_vec(),
        rental_shards: rental.into_iter().collect(),
        permanent_shards: permanent.into_iter().collect(),
        unowned_shards: unowned,
    }
}
