use std::time::Duration;

use tracing::{debug, info, warn};

use podium_ledger::{Asset, LedgerGateway};
use podium_types::{now_ms, Tourney, TourneyStatus};

use crate::config::ServiceConfig;
use crate::store::{StoreError, TourneyStore};

/// Payment confirmation loop.
///
/// Polls tourneys still waiting for their funding transaction and moves each
/// one forward: to `Payed` once the ledger shows a qualifying amount, to
/// `NotPayedError` when the transaction never appears within the timeout, or
/// to `PaymentError` when it appears but carries no money. A gateway failure
/// leaves the tourney pending for the next cycle; nothing here kills the
/// loop.
pub struct ConfirmationLoop<S, G> {
    store: S,
    gateway: G,
    asset: Asset,
    receiving_public_key: String,
    pay_timeout: Duration,
    interval: Duration,
}

impl<S: TourneyStore, G: LedgerGateway> ConfirmationLoop<S, G> {
    pub fn new(store: S, gateway: G, config: &ServiceConfig) -> Self {
        Self {
            store,
            gateway,
            asset: config.asset.clone(),
            receiving_public_key: config.receiving_public_key.clone(),
            pay_timeout: config.pay_timeout,
            interval: config.confirm_interval,
        }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.sweep().await {
                warn!("payment confirmation sweep failed: {err}");
            }
        }
    }

    /// One pass over all tourneys awaiting payment.
    pub async fn sweep(&self) -> Result<(), StoreError> {
        let pending = self
            .store
            .list_by_status(TourneyStatus::NotPayedYet)
            .await?;
        for mut tourney in pending {
            self.confirm(&mut tourney).await?;
        }
        Ok(())
    }

    async fn confirm(&self, tourney: &mut Tourney) -> Result<(), StoreError> {
        let record = match self.gateway.fetch_transaction(&tourney.transaction_id).await {
            Ok(record) => record,
            Err(err) => {
                // Transient or not, a lookup failure only costs this cycle.
                warn!(
                    tourney_id = %tourney.id,
                    transaction_id = %tourney.transaction_id,
                    retryable = err.is_retryable(),
                    "funding transaction lookup failed: {err}"
                );
                return Ok(());
            }
        };

        let now = now_ms();
        let Some(record) = record else {
            if now.saturating_sub(tourney.start_at) < self.pay_timeout.as_millis() as u64 {
                info!(
                    tourney_id = %tourney.id,
                    "transaction {} is not on the ledger yet",
                    tourney.transaction_id
                );
            } else {
                let message = format!(
                    "Transaction {} never appeared on the ledger, stopping tourney as not payed",
                    tourney.transaction_id
                );
                self.fail(tourney, message, TourneyStatus::NotPayedError)
                    .await?;
            }
            return Ok(());
        };

        let amount = record.received_amount(&self.asset, &self.receiving_public_key);
        if amount == 0.0 {
            let message = format!(
                "Received a transaction without money ({} ops)",
                record.operations.len()
            );
            self.fail(tourney, message, TourneyStatus::PaymentError)
                .await?;
            return Ok(());
        }

        info!(
            tourney_id = %tourney.id,
            name = %tourney.name,
            "tourney started with prize {amount} (claimed {})",
            tourney.prize
        );
        // The verified on-chain amount is authoritative over the claim.
        tourney.prize = amount;
        tourney.payed = Some(now);
        tourney.status = TourneyStatus::Payed;
        self.commit(tourney).await
    }

    async fn fail(
        &self,
        tourney: &mut Tourney,
        message: String,
        status: TourneyStatus,
    ) -> Result<(), StoreError> {
        warn!(tourney_id = %tourney.id, "{message}");
        tourney.status = status;
        tourney.ended = Some(now_ms());
        tourney.error_message = Some(message);
        self.commit(tourney).await
    }

    async fn commit(&self, tourney: &mut Tourney) -> Result<(), StoreError> {
        let committed = self
            .store
            .save_if_status(tourney, TourneyStatus::NotPayedYet)
            .await?;
        if !committed {
            debug!(tourney_id = %tourney.id, "record moved under us, skipping");
        }
        Ok(())
    }
}
