use tracing::{error, info};

use podium_ledger::LedgerGateway;
use podium_types::tourney::PAYOUT_PERCENTS;
use podium_types::{rank, Tourney};

/// What a distribution run produced: the sum of amounts actually sent and
/// the per-slot audit trail that gets persisted on the tourney.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionOutcome {
    pub total_sent: f64,
    pub log: String,
}

/// Pay the podium. Each of the three rank slots is attempted independently:
/// an empty slot or a failed send is recorded in the audit log and does not
/// block the other payouts. Nothing is retried or rolled back; the audit log
/// is the permanent record of what happened.
pub async fn distribute<G: LedgerGateway>(
    gateway: &G,
    tourney: &Tourney,
    asset_code: &str,
) -> DistributionOutcome {
    let ranked = rank(&tourney.members);
    let mut total_sent = 0.0;
    let mut log = Vec::new();

    for (slot, percent) in PAYOUT_PERCENTS {
        let place = slot + 1;
        let Some(member) = ranked.get(slot) else {
            let line = format!(
                "Member #{place} does not exist, don't send {percent}% of prize {} {asset_code}",
                tourney.prize
            );
            error!(tourney_id = %tourney.id, "{line}");
            log.push(line);
            continue;
        };

        let amount = tourney.prize * f64::from(percent) / 100.0;
        let memo = format!("Your prize for #{place} place");
        match gateway
            .send_payment(&member.wallet_public_key, amount, &memo)
            .await
        {
            Ok(_) => {
                total_sent += amount;
                let line = format!(
                    "Prize for #{place} place {amount} {asset_code} ({percent}%) was sent to {} (wallet {})",
                    member.user_id, member.wallet_public_key
                );
                info!(tourney_id = %tourney.id, "{line}");
                log.push(line);
            }
            Err(err) => {
                let line = format!(
                    "Can't send prize to user_id={} (wallet {}): {err}",
                    member.user_id, member.wallet_public_key
                );
                error!(tourney_id = %tourney.id, "{line}");
                log.push(line);
            }
        }
    }

    DistributionOutcome {
        total_sent,
        log: log.join("\n"),
    }
}
