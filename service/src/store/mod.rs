mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use thiserror::Error;

use podium_types::{Tourney, TourneyStatus};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("stored document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("tourney for transaction {0} is already created")]
    DuplicateTransaction(String),
}

/// Durable collection of tourney records.
///
/// Writes come in two flavors. `insert` creates a fresh record, assigns its
/// id, and enforces funding-transaction uniqueness. `save_if_status` is a
/// conditional overwrite: it commits only when the stored record still holds
/// the status the caller read, so two concurrent writers cannot silently
/// clobber each other's transition. Every successful write refreshes
/// `last_modified`.
#[async_trait]
pub trait TourneyStore: Send + Sync {
    async fn insert(&self, tourney: &mut Tourney) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Tourney>, StoreError>;

    async fn list(&self) -> Result<Vec<Tourney>, StoreError>;

    async fn list_by_status(&self, status: TourneyStatus) -> Result<Vec<Tourney>, StoreError>;

    async fn transaction_exists(&self, transaction_id: &str) -> Result<bool, StoreError>;

    /// Overwrite the stored record if its status still equals `expected`.
    /// Returns false without writing when another writer got there first.
    async fn save_if_status(
        &self,
        tourney: &mut Tourney,
        expected: TourneyStatus,
    ) -> Result<bool, StoreError>;
}
