mod constants;
mod view;


pub use constants::*;
pub use view::{MemberView, TourneyView};

use serde::{Deserialize, Serialize};

use crate::address::{is_valid_transaction_hash, is_valid_wallet_address};
use crate::errors::TourneyError;

/// Lifecycle of a tourney.
///
/// Transitions are monotonic: `NotPayedYet` moves to `Payed` once the funding
/// transaction is verified on the ledger, or to one of the two error states;
/// `Payed` moves to `Ended` when the contest window elapses. The three
/// non-joinable states are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourneyStatus {
    NotPayedYet,
    Payed,
    Ended,
    NotPayedError,
    PaymentError,
}

impl TourneyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourneyStatus::NotPayedYet => "not_payed_yet",
            TourneyStatus::Payed => "payed",
            TourneyStatus::Ended => "ended",
            TourneyStatus::NotPayedError => "not_payed_error",
            TourneyStatus::PaymentError => "payment_error",
        }
    }

    pub fn is_joinable(&self) -> bool {
        matches!(self, TourneyStatus::NotPayedYet | TourneyStatus::Payed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_joinable()
    }
}

/// An enrolled participant, embedded in its tourney record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub alias_id: String,
    pub name: String,
    pub tag: String,
    pub wallet_public_key: String,
    pub joined_at: u64,
    pub current_trophies: i32,
}

/// Caller-supplied fields of a join request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub user_id: String,
    pub alias_id: String,
    pub name: String,
    pub tag: String,
    pub wallet_public_key: String,
}

/// One contest instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tourney {
    /// Store-assigned id; empty until the record is first persisted.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// The creator's claimed prize until payment confirmation overwrites it
    /// with the verified on-chain amount.
    pub prize: f64,
    pub transaction_id: String,
    pub user_id: String,
    pub members: Vec<Member>,
    pub status: TourneyStatus,
    pub start_at: u64,
    pub end_at: u64,
    pub payed: Option<u64>,
    pub ended: Option<u64>,
    pub prize_sent: Option<f64>,
    pub prize_sending_log: Option<String>,
    pub error_message: Option<String>,
    /// Refreshed by the store on every write.
    pub last_modified: u64,
}

impl Tourney {
    /// Build a new tourney record. The funding transaction must be a
    /// well-formed hash; whether it is unique across tourneys is checked
    /// against the store at persist time.
    pub fn open(
        name: String,
        description: Option<String>,
        prize_claim: f64,
        transaction_id: String,
        user_id: String,
        now_ms: u64,
    ) -> Result<Self, TourneyError> {
        if !is_valid_transaction_hash(&transaction_id) {
            return Err(TourneyError::TransactionHash(transaction_id));
        }
        Ok(Self {
            id: String::new(),
            name,
            description,
            prize: prize_claim,
            transaction_id,
            user_id,
            members: Vec::new(),
            status: TourneyStatus::NotPayedYet,
            start_at: now_ms,
            end_at: now_ms + TOURNEY_LENGTH_SECS * 1000,
            payed: None,
            ended: None,
            prize_sent: None,
            prize_sending_log: None,
            error_message: None,
            last_modified: now_ms,
        })
    }

    /// Enroll a member. Fails unless the tourney is still joinable, the
    /// wallet address is well formed, and neither the user id nor the wallet
    /// already appears among existing members.
    pub fn join(
        &mut self,
        request: JoinRequest,
        now_ms: u64,
        trophies: i32,
    ) -> Result<&Member, TourneyError> {
        if !self.status.is_joinable() {
            return Err(TourneyError::NotJoinable(self.status.as_str().to_string()));
        }
        if !is_valid_wallet_address(&request.wallet_public_key) {
            return Err(TourneyError::WalletAddress(request.wallet_public_key));
        }
        for member in &self.members {
            if member.user_id == request.user_id {
                return Err(TourneyError::UserAlreadyJoined(format!(
                    "user {} is already joined to tourney {}",
                    request.user_id, self.id
                )));
            }
            if member.wallet_public_key == request.wallet_public_key {
                return Err(TourneyError::UserAlreadyJoined(format!(
                    "user with wallet {} is already joined to tourney {}",
                    request.wallet_public_key, self.id
                )));
            }
        }
        self.members.push(Member {
            user_id: request.user_id,
            alias_id: request.alias_id,
            name: request.name,
            tag: request.tag,
            wallet_public_key: request.wallet_public_key,
            joined_at: now_ms,
            current_trophies: trophies,
        });
        Ok(self.members.last().unwrap())
    }

    /// Score override from the external feed. Returns false when the user is
    /// not a member.
    pub fn set_trophies(&mut self, user_id: &str, trophies: i32) -> bool {
        match self.members.iter_mut().find(|m| m.user_id == user_id) {
            Some(member) => {
                member.current_trophies = trophies;
                true
            }
            None => false,
        }
    }
}

/// Members ordered by trophy count descending. The sort is stable, so equal
/// counts keep their enrollment order; rank 0 is the leader.
pub fn rank(members: &[Member]) -> Vec<&Member> {
    let mut ranked: Vec<&Member> = members.iter().collect();
    ranked.sort_by(|a, b| b.current_trophies.cmp(&a.current_trophies));
    ranked
}
