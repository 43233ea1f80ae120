//! Shared building blocks for the league-client crates
//!
//! - [`region`]: the region directory routing every regional request
//! - [`claims`]: unsigned token claim decoding
//! - [`poll`]: the fixed-interval polling primitive used by every wait loop

pub mod claims;
pub mod errors;
pub mod poll;
pub mod region;

pub use claims::{Claims, decode_claims, decode_claims_as, encode_unsigned};
pub use errors::{ParseError, RegionNotSupported};
pub use poll::{Deadline, PollOutcome, Step, poll_until};
pub use region::{RegionDirectory, RegionRecord, platform_code_for_tag};
