use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use podium_types::{now_ms, Tourney, TourneyStatus};

use super::{StoreError, TourneyStore};

/// In-memory store for tests and local development. Same semantics as the
/// Redis store, including the conditional write.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Tourney>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TourneyStore for MemoryStore {
    async fn insert(&self, tourney: &mut Tourney) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .values()
            .any(|t| t.transaction_id == tourney.transaction_id)
        {
            return Err(StoreError::DuplicateTransaction(
                tourney.transaction_id.clone(),
            ));
        }
        tourney.id = Uuid::new_v4().to_string();
        tourney.last_modified = now_ms();
        inner.insert(tourney.id.clone(), tourney.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Tourney>, StoreError> {
        Ok(self.inner.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Tourney>, StoreError> {
        let inner = self.inner.read().await;
        let mut all: Vec<Tourney> = inner.values().cloned().collect();
        all.sort_by_key(|t| t.start_at);
        Ok(all)
    }

    async fn list_by_status(&self, status: TourneyStatus) -> Result<Vec<Tourney>, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<Tourney> = inner
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|t| t.start_at);
        Ok(matching)
    }

    async fn transaction_exists(&self, transaction_id: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.values().any(|t| t.transaction_id == transaction_id))
    }

    async fn save_if_status(
        &self,
        tourney: &mut Tourney,
        expected: TourneyStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.get(&tourney.id) {
            Some(stored) if stored.status == expected => {
                tourney.last_modified = now_ms();
                inner.insert(tourney.id.clone(), tourney.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
