/// How long a tourney runs once created.
pub const TOURNEY_LENGTH_SECS: u64 = 300;

/// How long we wait for the funding transaction to appear on the ledger
/// before giving up on a tourney as not payed.
pub const PAY_TIMEOUT_SECS: u64 = 600;

/// Fixed poll interval of the payment confirmation loop.
pub const CONFIRM_INTERVAL_SECS: u64 = 10;

/// Scheduler sleep when no paid tourney is running.
pub const SCHEDULER_IDLE_SECS: u64 = 10;

/// Prize split for the podium: rank index and percent of the verified prize.
pub const PAYOUT_PERCENTS: [(usize, u32); 3] = [(0, 40), (1, 25), (2, 15)];

/// Placeholder trophy range assigned at join time, inclusive on both ends.
/// Stands in for the external score feed until it reports real counts.
pub const TROPHY_SEED_MIN: i32 = -60;
pub const TROPHY_SEED_MAX: i32 = 100;
