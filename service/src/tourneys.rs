use rand::Rng;
use thiserror::Error;
use tracing::info;

use podium_types::tourney::{TROPHY_SEED_MAX, TROPHY_SEED_MIN};
use podium_types::{now_ms, JoinRequest, Tourney, TourneyError};

use crate::store::{StoreError, TourneyStore};

/// Attempts before a lost conditional write is reported as a conflict.
const SAVE_ATTEMPTS: u32 = 3;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] TourneyError),
    #[error("tourney {0} does not exist")]
    NotFound(String),
    #[error("user {user_id} is not a member of tourney {tourney_id}")]
    UnknownMember { tourney_id: String, user_id: String },
    #[error("tourney {0} was modified concurrently, giving up")]
    Conflict(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateTransaction(tx) => {
                ServiceError::Domain(TourneyError::DuplicateTransaction(tx))
            }
            other => ServiceError::Store(other),
        }
    }
}

/// Entity operations behind the HTTP surface. Mutations load the record,
/// apply the change, and commit with a conditional write; a lost write is
/// retried from a fresh read a few times before giving up.
#[derive(Clone)]
pub struct TourneyService<S> {
    store: S,
}

impl<S: TourneyStore> TourneyService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create(
        &self,
        name: String,
        description: Option<String>,
        prize_claim: f64,
        transaction_id: String,
        user_id: String,
    ) -> Result<Tourney, ServiceError> {
        if self.store.transaction_exists(&transaction_id).await? {
            return Err(TourneyError::DuplicateTransaction(transaction_id).into());
        }
        let mut tourney = Tourney::open(
            name,
            description,
            prize_claim,
            transaction_id,
            user_id,
            now_ms(),
        )?;
        self.store.insert(&mut tourney).await?;
        info!(
            tourney_id = %tourney.id,
            name = %tourney.name,
            transaction_id = %tourney.transaction_id,
            "tourney created"
        );
        Ok(tourney)
    }

    pub async fn get(&self, id: &str) -> Result<Tourney, ServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// All tourneys split into joinable and previous.
    pub async fn list_split(&self) -> Result<(Vec<Tourney>, Vec<Tourney>), ServiceError> {
        let all = self.store.list().await?;
        Ok(all.into_iter().partition(|t| t.status.is_joinable()))
    }

    pub async fn join(&self, id: &str, request: JoinRequest) -> Result<Tourney, ServiceError> {
        // Trophy seed until the external score feed reports a real count.
        let trophies = rand::thread_rng().gen_range(TROPHY_SEED_MIN..=TROPHY_SEED_MAX);
        let tourney = self
            .mutate(id, |tourney| {
                tourney.join(request.clone(), now_ms(), trophies)?;
                Ok(())
            })
            .await?;
        info!(tourney_id = %id, user_id = %request.user_id, "member joined");
        Ok(tourney)
    }

    /// Score override from the external feed.
    pub async fn set_trophies(
        &self,
        id: &str,
        user_id: &str,
        trophies: i32,
    ) -> Result<Tourney, ServiceError> {
        self.mutate(id, |tourney| {
            if !tourney.set_trophies(user_id, trophies) {
                return Err(ServiceError::UnknownMember {
                    tourney_id: id.to_string(),
                    user_id: user_id.to_string(),
                });
            }
            Ok(())
        })
        .await
    }

    /// Read-modify-write with a conditional commit keyed on the status seen
    /// at read time. The conditional write keeps a concurrent transition by
    /// the confirmation loop from being clobbered.
    async fn mutate<F>(&self, id: &str, mut apply: F) -> Result<Tourney, ServiceError>
    where
        F: FnMut(&mut Tourney) -> Result<(), ServiceError>,
    {
        for _ in 0..SAVE_ATTEMPTS {
            let mut tourney = self.get(id).await?;
            let read_status = tourney.status;
            apply(&mut tourney)?;
            if self.store.save_if_status(&mut tourney, read_status).await? {
                return Ok(tourney);
            }
        }
        Err(ServiceError::Conflict(id.to_string()))
    }
}
