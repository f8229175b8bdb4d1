use std::time::Duration;

use tracing::{info, warn};

use podium_ledger::LedgerGateway;
use podium_types::{now_ms, Tourney, TourneyStatus};

use crate::config::ServiceConfig;
use crate::distribute::distribute;
use crate::store::{StoreError, TourneyStore};

/// Lifecycle scheduler loop.
///
/// Watches running tourneys, distributes the prize when one reaches its end
/// time, and sleeps until the nearest remaining deadline instead of polling
/// blindly. With nothing running it falls back to a fixed idle interval.
pub struct SchedulerLoop<S, G> {
    store: S,
    gateway: G,
    asset_code: String,
    idle: Duration,
}

impl<S: TourneyStore, G: LedgerGateway> SchedulerLoop<S, G> {
    pub fn new(store: S, gateway: G, config: &ServiceConfig) -> Self {
        Self {
            store,
            gateway,
            asset_code: config.asset.code.clone(),
            idle: config.scheduler_idle,
        }
    }

    pub async fn run(self) {
        loop {
            let sleep_for = match self.sweep().await {
                Ok(Some(deadline)) => Duration::from_millis(deadline.saturating_sub(now_ms())),
                Ok(None) => self.idle,
                Err(err) => {
                    warn!("scheduler sweep failed: {err}");
                    self.idle
                }
            };
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// One pass over running tourneys. Ends the expired ones and returns the
    /// nearest end time among those still going.
    pub async fn sweep(&self) -> Result<Option<u64>, StoreError> {
        let now = now_ms();
        let mut next_deadline: Option<u64> = None;
        for mut tourney in self.store.list_by_status(TourneyStatus::Payed).await? {
            if now >= tourney.end_at {
                self.end(&mut tourney).await?;
            } else {
                next_deadline = Some(next_deadline.map_or(tourney.end_at, |d| d.min(tourney.end_at)));
            }
        }
        Ok(next_deadline)
    }

    async fn end(&self, tourney: &mut Tourney) -> Result<(), StoreError> {
        let outcome = distribute(&self.gateway, tourney, &self.asset_code).await;
        tourney.prize_sent = Some(outcome.total_sent);
        tourney.prize_sending_log = Some(outcome.log);
        tourney.ended = Some(now_ms());
        tourney.status = TourneyStatus::Ended;
        let committed = self
            .store
            .save_if_status(tourney, TourneyStatus::Payed)
            .await?;
        if committed {
            info!(
                tourney_id = %tourney.id,
                name = %tourney.name,
                prize = tourney.prize,
                sent = outcome.total_sent,
                "tourney ended"
            );
        } else {
            warn!(
                tourney_id = %tourney.id,
                "record moved during distribution, audit log not persisted"
            );
        }
        Ok(())
    }
}
