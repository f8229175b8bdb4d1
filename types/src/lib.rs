pub mod address;
pub mod errors;
pub mod tourney;

pub use address::{is_valid_transaction_hash, is_valid_wallet_address};
pub use errors::TourneyError;
pub use tourney::{rank, JoinRequest, Member, Tourney, TourneyStatus};

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
