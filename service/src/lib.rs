pub mod api;
pub mod config;
pub mod confirm;
pub mod distribute;
pub mod scheduler;
pub mod store;
pub mod tourneys;

#[cfg(test)]
pub(crate) mod mocks;

pub use api::{router, ApiError, AppState};
pub use config::ServiceConfig;
pub use confirm::ConfirmationLoop;
pub use distribute::{distribute, DistributionOutcome};
pub use scheduler::SchedulerLoop;
pub use store::{MemoryStore, RedisStore, StoreError, TourneyStore};
pub use tourneys::{ServiceError, TourneyService};
