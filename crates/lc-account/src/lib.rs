//! Account snapshot aggregation over League ledge services
//!
//! Once a ledge token exists, [`AccountAggregator`] fans out to the
//! independent services (loot, ranked, honor, inventories) while match
//! history runs alongside, then registers a party player to read queue
//! eligibility. Optional fields that fail degrade to `None`.

pub mod aggregator;
pub mod skins;
pub mod snapshot;
pub mod wire;

pub use aggregator::AccountAggregator;
pub use snapshot::{
    AccountSnapshot, Essence, FetchFlags, MatchSummary, PartyEligibility, Profile, RankSummary,
    SkinSummary,
};
pub use wire::PartyRestriction;
